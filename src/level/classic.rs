//! The built-in "Classic" table

use super::*;

fn wall(id: &str, cx: f32, cy: f32, hw: f32, hh: f32, rotation: Option<f32>) -> Wall {
    Wall {
        id: ElementId::new(id),
        cx,
        cy,
        hw,
        hh,
        rotation,
    }
}

fn bumper(id: &str, cx: f32, cy: f32, radius: f32, restitution: f32) -> Bumper {
    Bumper {
        id: ElementId::new(id),
        cx,
        cy,
        radius: Some(radius),
        restitution: Some(restitution),
        points: None,
    }
}

fn lane(id: &str, cx: f32, cy: f32, hw: f32, hh: f32, rotation: Option<f32>) -> LaneGuide {
    LaneGuide {
        id: ElementId::new(id),
        cx,
        cy,
        hw,
        hh,
        rotation,
    }
}

fn target(id: &str, cx: f32, cy: f32, label: &str) -> Target {
    Target {
        id: ElementId::new(id),
        cx,
        cy,
        rotation: None,
        label: label.to_string(),
    }
}

pub(super) fn classic() -> Level {
    let w = TABLE_WIDTH;
    let h = TABLE_HEIGHT;
    let wt = WALL_THICKNESS;

    Level {
        name: "Classic".to_string(),
        ball_spawn: Point::new(w - 25.0, h - 120.0),
        walls: vec![
            // Boundary
            wall("wall-left", wt / 2.0, h / 2.0, wt / 2.0, h / 2.0, None),
            wall("wall-right", w - wt / 2.0, h / 2.0, wt / 2.0, h / 2.0, None),
            wall("wall-top", w / 2.0, wt / 2.0, w / 2.0, wt / 2.0, None),
            // Bottom with a drain gap in the middle
            wall("wall-bl", w * 0.18, h - wt / 2.0, w * 0.18, wt / 2.0, None),
            wall("wall-br", w * 0.82, h - wt / 2.0, w * 0.18, wt / 2.0, None),
            // Plunger lane
            wall("plunger-wall", w - 40.0, h * 0.55, 3.0, h * 0.35, None),
            wall("plunger-top", w - 30.0, h * 0.15, 20.0, 4.0, Some(0.6)),
            // Inlanes
            wall("guide-l", 45.0, h - 110.0, 45.0, 4.0, Some(-0.45)),
            wall("guide-r", w - 65.0, h - 110.0, 45.0, 4.0, Some(0.45)),
            // Outlanes
            wall("outlane-l", 25.0, h - 55.0, 3.0, 30.0, None),
            wall("outlane-r", w - 45.0, h - 55.0, 3.0, 30.0, None),
            // Upper arch
            wall("arch-l", 60.0, h * 0.18, 35.0, 4.0, Some(-0.7)),
            wall("arch-r", w - 80.0, h * 0.18, 35.0, 4.0, Some(0.7)),
            // Drop bank
            wall("drop-1", w * 0.3, h * 0.42, 15.0, 3.0, None),
            wall("drop-2", w * 0.5, h * 0.42, 15.0, 3.0, None),
            wall("drop-3", w * 0.7, h * 0.42, 15.0, 3.0, None),
        ],
        bumpers: vec![
            bumper("bump-1", w * 0.35, h * 0.22, 22.0, 1.6),
            bumper("bump-2", w * 0.6, h * 0.22, 22.0, 1.6),
            bumper("bump-3", w * 0.47, h * 0.32, 18.0, 1.8),
            bumper("bump-4", w * 0.25, h * 0.52, 16.0, 1.4),
            bumper("bump-5", w * 0.7, h * 0.52, 16.0, 1.4),
        ],
        flippers: vec![
            Flipper {
                id: ElementId::new("flip-l"),
                anchor_x: w * 0.28,
                anchor_y: h - 55.0,
                is_left: true,
            },
            Flipper {
                id: ElementId::new("flip-r"),
                anchor_x: w * 0.68,
                anchor_y: h - 55.0,
                is_left: false,
            },
        ],
        slings: vec![
            Sling {
                id: ElementId::new("sling-l"),
                cx: 75.0,
                cy: h - 160.0,
                rotation: Some(-0.5),
                is_left: true,
            },
            Sling {
                id: ElementId::new("sling-r"),
                cx: w - 95.0,
                cy: h - 160.0,
                rotation: Some(0.5),
                is_left: false,
            },
        ],
        kickers: vec![
            Kicker {
                id: ElementId::new("kick-1"),
                cx: w * 0.15,
                cy: h * 0.35,
                radius: Some(10.0),
            },
            Kicker {
                id: ElementId::new("kick-2"),
                cx: w * 0.85,
                cy: h * 0.35,
                radius: Some(10.0),
            },
        ],
        lane_guides: vec![
            lane("lane-1", w * 0.3, h * 0.1, 2.0, 25.0, None),
            lane("lane-2", w * 0.45, h * 0.1, 2.0, 25.0, None),
            lane("lane-3", w * 0.6, h * 0.1, 2.0, 25.0, None),
            lane("lane-4", w * 0.15, h * 0.6, 2.0, 30.0, Some(-0.15)),
            lane("lane-5", w * 0.82, h * 0.6, 2.0, 30.0, Some(0.15)),
        ],
        card_targets: vec![
            target("card-1", 55.0, h * 0.42, "A♠"),
            target("card-2", 55.0, h * 0.48, "A♥"),
            target("card-3", 55.0, h * 0.54, "A♦"),
            target("card-4", 55.0, h * 0.60, "A♣"),
        ],
        icon_targets: vec![
            target("icon-1", w - 55.0, h * 0.45, "🃏"),
            target("icon-2", w - 55.0, h * 0.55, "🃏"),
        ],
        trampolines: Vec::new(),
    }
}
