//! Table builder
//!
//! Maps a `Level` onto bodies, colliders and joints in a fresh physics
//! world. One body per element (plus a fixed pivot body per flipper) and
//! one dynamic ball at the spawn point. Geometry is converted from pixels
//! to physics units here and nowhere else.

use glam::Vec2;

use super::backend::{BodyDesc, BodyHandle, ColliderDesc, PhysicsBackend};
use crate::consts::*;
use crate::level::{ElementId, ElementKind, Level, SLING_HALF_EXTENTS, Side, TARGET_HALF_EXTENTS};
use crate::px;

/// Per-type collider material defaults
mod material {
    pub const WALL_RESTITUTION: f32 = 0.3;
    pub const WALL_FRICTION: f32 = 0.0;
    pub const SLING_RESTITUTION: f32 = 1.8;
    pub const SLING_FRICTION: f32 = 0.0;
    pub const KICKER_RESTITUTION: f32 = 2.5;
    pub const LANE_RESTITUTION: f32 = 0.1;
    pub const LANE_FRICTION: f32 = 0.1;
    pub const TARGET_RESTITUTION: f32 = 0.6;
    pub const BALL_RESTITUTION: f32 = 0.5;
    pub const BALL_DENSITY: f32 = 1.0;
    pub const BALL_FRICTION: f32 = 0.03;
    pub const FLIPPER_ANGULAR_DAMPING: f32 = 2.0;
    pub const FLIPPER_BASE_DENSITY: f32 = 5.0;
    pub const FLIPPER_BASE_RESTITUTION: f32 = 0.2;
    pub const FLIPPER_TIP_DENSITY: f32 = 3.0;
    pub const FLIPPER_TIP_RESTITUTION: f32 = 0.3;
}

/// A flipper body and its pivot, in physics units
#[derive(Debug, Clone, PartialEq)]
pub struct FlipperRig {
    pub id: ElementId,
    pub body: BodyHandle,
    pub side: Side,
    /// World position of the hinge
    pub pivot: Vec2,
    /// Body centre relative to the pivot at rotation 0
    pub arm: Vec2,
}

/// Bumper body with the points it awards
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BumperBody {
    pub body: BodyHandle,
    pub points: u32,
}

/// Bodies, colliders and joints created for one element kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindCount {
    pub bodies: usize,
    pub colliders: usize,
    pub joints: usize,
}

/// What the builder created, by element kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    per_kind: [KindCount; ElementKind::ALL.len()],
    pub ball: KindCount,
}

impl BuildStats {
    pub fn get(&self, kind: ElementKind) -> KindCount {
        self.per_kind[kind.index()]
    }

    pub fn total(&self) -> KindCount {
        self.per_kind.iter().chain(std::iter::once(&self.ball)).fold(
            KindCount::default(),
            |acc, c| KindCount {
                bodies: acc.bodies + c.bodies,
                colliders: acc.colliders + c.colliders,
                joints: acc.joints + c.joints,
            },
        )
    }
}

/// Handles for everything the play loop reads back
#[derive(Debug, Clone)]
pub struct TableBodies {
    pub ball: BodyHandle,
    /// Controllable flippers, last one of each side wins
    pub left_flipper: Option<FlipperRig>,
    pub right_flipper: Option<FlipperRig>,
    /// Every flipper built, in level order
    pub flippers: Vec<FlipperRig>,
    pub walls: Vec<BodyHandle>,
    pub bumpers: Vec<BumperBody>,
    pub slings: Vec<BodyHandle>,
    pub kickers: Vec<BodyHandle>,
    pub lane_guides: Vec<BodyHandle>,
    pub card_targets: Vec<BodyHandle>,
    pub icon_targets: Vec<BodyHandle>,
    pub trampolines: Vec<BodyHandle>,
    pub stats: BuildStats,
}

impl TableBodies {
    pub fn flipper(&self, side: Side) -> Option<&FlipperRig> {
        match side {
            Side::Left => self.left_flipper.as_ref(),
            Side::Right => self.right_flipper.as_ref(),
        }
    }
}

fn snapshot_counts<B: PhysicsBackend>(backend: &B) -> KindCount {
    KindCount {
        bodies: backend.body_count(),
        colliders: backend.collider_count(),
        joints: backend.joint_count(),
    }
}

fn record<B: PhysicsBackend>(backend: &B, before: KindCount, into: &mut KindCount) {
    let after = snapshot_counts(backend);
    into.bodies += after.bodies - before.bodies;
    into.colliders += after.colliders - before.colliders;
    into.joints += after.joints - before.joints;
}

/// Surface response of a static collider
#[derive(Debug, Clone, Copy)]
struct Surface {
    restitution: f32,
    friction: Option<f32>,
}

impl Surface {
    fn bouncy(restitution: f32) -> Self {
        Self {
            restitution,
            friction: None,
        }
    }

    fn with_friction(restitution: f32, friction: f32) -> Self {
        Self {
            restitution,
            friction: Some(friction),
        }
    }
}

/// Static cuboid shared by walls, slings, lanes, targets and trampolines
fn add_static_box<B: PhysicsBackend>(
    backend: &mut B,
    center: Vec2,
    half_extents: Vec2,
    rotation: f32,
    surface: Surface,
) -> BodyHandle {
    let body = backend.create_body(&BodyDesc::fixed(center * px(1.0)).rotation(rotation));
    let mut desc =
        ColliderDesc::cuboid(px(half_extents.x), px(half_extents.y)).restitution(surface.restitution);
    if let Some(friction) = surface.friction {
        desc = desc.friction(friction);
    }
    backend.attach_collider(body, &desc);
    body
}

fn add_static_ball<B: PhysicsBackend>(
    backend: &mut B,
    center: Vec2,
    radius: f32,
    restitution: f32,
) -> BodyHandle {
    let body = backend.create_body(&BodyDesc::fixed(center * px(1.0)));
    backend.attach_collider(body, &ColliderDesc::ball(px(radius)).restitution(restitution));
    body
}

fn add_flipper<B: PhysicsBackend>(backend: &mut B, id: &ElementId, anchor_px: Vec2, side: Side) -> FlipperRig {
    use material::*;

    let pivot = anchor_px * px(1.0);
    let dir = side.dir();
    let arm = Vec2::new(dir * px(FLIPPER_WIDTH / 2.0), 0.0);

    let anchor = backend.create_body(&BodyDesc::fixed(pivot));
    let body = backend.create_body(
        &BodyDesc::dynamic(pivot + arm).angular_damping(FLIPPER_ANGULAR_DAMPING),
    );

    // Tapered shape: wide base near the pivot, narrow tip
    backend.attach_collider(
        body,
        &ColliderDesc::cuboid(px(FLIPPER_WIDTH * 0.3), px(FLIPPER_HEIGHT / 2.0))
            .offset(Vec2::new(px(-dir * FLIPPER_WIDTH * 0.2), 0.0))
            .density(FLIPPER_BASE_DENSITY)
            .restitution(FLIPPER_BASE_RESTITUTION),
    );
    backend.attach_collider(
        body,
        &ColliderDesc::cuboid(px(FLIPPER_WIDTH * 0.25), px(FLIPPER_TIP_HEIGHT / 2.0))
            .offset(Vec2::new(px(dir * FLIPPER_WIDTH * 0.2), 0.0))
            .density(FLIPPER_TIP_DENSITY)
            .restitution(FLIPPER_TIP_RESTITUTION),
    );

    backend.create_revolute_joint(anchor, body, Vec2::ZERO, -arm);

    FlipperRig {
        id: id.clone(),
        body,
        side,
        pivot,
        arm,
    }
}

/// Build `level` into `backend`, which must be empty
pub fn build_table<B: PhysicsBackend>(backend: &mut B, level: &Level) -> TableBodies {
    use material::*;

    if backend.body_count() != 0 {
        log::warn!(
            "Building '{}' into a non-empty world ({} bodies already present)",
            level.name,
            backend.body_count()
        );
    }

    let mut stats = BuildStats::default();

    let mut walls = Vec::with_capacity(level.walls.len());
    for w in &level.walls {
        let before = snapshot_counts(backend);
        walls.push(add_static_box(
            backend,
            Vec2::new(w.cx, w.cy),
            Vec2::new(w.hw, w.hh),
            w.rotation.unwrap_or(0.0),
            Surface::with_friction(WALL_RESTITUTION, WALL_FRICTION),
        ));
        record(backend, before, &mut stats.per_kind[ElementKind::Wall.index()]);
    }

    let mut bumpers = Vec::with_capacity(level.bumpers.len());
    for b in &level.bumpers {
        let before = snapshot_counts(backend);
        let body = add_static_ball(backend, Vec2::new(b.cx, b.cy), b.radius(), b.restitution());
        bumpers.push(BumperBody {
            body,
            points: b.points(),
        });
        record(backend, before, &mut stats.per_kind[ElementKind::Bumper.index()]);
    }

    let mut slings = Vec::with_capacity(level.slings.len());
    for s in &level.slings {
        let before = snapshot_counts(backend);
        slings.push(add_static_box(
            backend,
            Vec2::new(s.cx, s.cy),
            SLING_HALF_EXTENTS,
            s.rotation.unwrap_or(0.0),
            Surface::with_friction(SLING_RESTITUTION, SLING_FRICTION),
        ));
        record(backend, before, &mut stats.per_kind[ElementKind::Sling.index()]);
    }

    let mut kickers = Vec::with_capacity(level.kickers.len());
    for k in &level.kickers {
        let before = snapshot_counts(backend);
        kickers.push(add_static_ball(
            backend,
            Vec2::new(k.cx, k.cy),
            k.radius(),
            KICKER_RESTITUTION,
        ));
        record(backend, before, &mut stats.per_kind[ElementKind::Kicker.index()]);
    }

    let mut lane_guides = Vec::with_capacity(level.lane_guides.len());
    for g in &level.lane_guides {
        let before = snapshot_counts(backend);
        lane_guides.push(add_static_box(
            backend,
            Vec2::new(g.cx, g.cy),
            Vec2::new(g.hw, g.hh),
            g.rotation.unwrap_or(0.0),
            Surface::with_friction(LANE_RESTITUTION, LANE_FRICTION),
        ));
        record(backend, before, &mut stats.per_kind[ElementKind::LaneGuide.index()]);
    }

    let mut flippers = Vec::with_capacity(level.flippers.len());
    let mut left_flipper: Option<FlipperRig> = None;
    let mut right_flipper: Option<FlipperRig> = None;
    for f in &level.flippers {
        let before = snapshot_counts(backend);
        let rig = add_flipper(backend, &f.id, f.anchor(), f.side());
        record(backend, before, &mut stats.per_kind[ElementKind::Flipper.index()]);

        let slot = match rig.side {
            Side::Left => &mut left_flipper,
            Side::Right => &mut right_flipper,
        };
        if let Some(previous) = slot.replace(rig.clone()) {
            log::warn!(
                "Flipper '{}' replaces '{}' as the {:?} controlled flipper",
                rig.id,
                previous.id,
                rig.side
            );
        }
        flippers.push(rig);
    }

    let before = snapshot_counts(backend);
    let spawn = Vec2::from(level.ball_spawn) * px(1.0);
    let ball = backend.create_body(
        &BodyDesc::dynamic(spawn)
            .ccd(true)
            .can_sleep(false)
            .linear_damping(0.0),
    );
    backend.attach_collider(
        ball,
        &ColliderDesc::ball(px(BALL_RADIUS_PX))
            .restitution(BALL_RESTITUTION)
            .density(BALL_DENSITY)
            .friction(BALL_FRICTION),
    );
    record(backend, before, &mut stats.ball);

    let target_surface = Surface::bouncy(TARGET_RESTITUTION);
    let mut card_targets = Vec::with_capacity(level.card_targets.len());
    for t in &level.card_targets {
        let before = snapshot_counts(backend);
        card_targets.push(add_static_box(
            backend,
            Vec2::new(t.cx, t.cy),
            TARGET_HALF_EXTENTS,
            t.rotation.unwrap_or(0.0),
            target_surface,
        ));
        record(backend, before, &mut stats.per_kind[ElementKind::CardTarget.index()]);
    }

    let mut icon_targets = Vec::with_capacity(level.icon_targets.len());
    for t in &level.icon_targets {
        let before = snapshot_counts(backend);
        icon_targets.push(add_static_box(
            backend,
            Vec2::new(t.cx, t.cy),
            TARGET_HALF_EXTENTS,
            t.rotation.unwrap_or(0.0),
            target_surface,
        ));
        record(backend, before, &mut stats.per_kind[ElementKind::IconTarget.index()]);
    }

    let mut trampolines = Vec::with_capacity(level.trampolines.len());
    for t in &level.trampolines {
        let before = snapshot_counts(backend);
        trampolines.push(add_static_box(
            backend,
            Vec2::new(t.cx, t.cy),
            Vec2::new(t.hw, t.hh),
            t.rotation.unwrap_or(0.0),
            Surface::bouncy(t.restitution()),
        ));
        record(backend, before, &mut stats.per_kind[ElementKind::Trampoline.index()]);
    }

    let total = stats.total();
    log::info!(
        "Built table '{}': {} bodies, {} colliders, {} joints",
        level.name,
        total.bodies,
        total.colliders,
        total.joints
    );

    TableBodies {
        ball,
        left_flipper,
        right_flipper,
        flippers,
        walls,
        bumpers,
        slings,
        kickers,
        lane_guides,
        card_targets,
        icon_targets,
        trampolines,
        stats,
    }
}
