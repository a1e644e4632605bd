//! Level editor authoring model
//!
//! An in-memory `Level` plus selection, tool and drag state. Independent of
//! physics: "Play" hands a validated copy of the level to the table builder.


pub use hit_test::hit_test;

use std::f32::consts::PI;

use glam::Vec2;
use thiserror::Error;

use crate::consts::{BUMPER_RADIUS_PX, TABLE_WIDTH, WALL_THICKNESS};
use crate::level::{
    Bumper, ElementId, ElementKind, Flipper, Kicker, LaneGuide, Level, LevelError, Point, Side, Sling, Target,
    Trampoline, Wall,
};
use crate::normalize_angle;

/// Rotate-selected step (radians)
pub const ROTATE_STEP: f32 = PI / 12.0;
/// Nudge-selected steps (pixels)
pub const NUDGE_STEP: f32 = 1.0;
pub const NUDGE_STEP_LARGE: f32 = 10.0;

/// Geometry given to freshly placed elements (pixels)
mod defaults {
    pub const WALL_HALF_WIDTH: f32 = 40.0;
    pub const LANE_HALF_WIDTH: f32 = 2.0;
    pub const LANE_HALF_HEIGHT: f32 = 25.0;
    pub const TRAMPOLINE_HALF_WIDTH: f32 = 30.0;
    pub const TRAMPOLINE_HALF_HEIGHT: f32 = 6.0;
    pub const TARGET_LABEL: &str = "?";
}

/// Hands out `<prefix>-<n>` ids, never repeating one within a session
#[derive(Debug, Clone)]
pub struct IdGenerator {
    next: u64,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator {
    pub const FIRST: u64 = 100;

    pub fn new() -> Self {
        Self { next: Self::FIRST }
    }

    /// Next id for `kind` that `level` does not already use
    pub fn fresh(&mut self, kind: ElementKind, level: &Level) -> ElementId {
        loop {
            let id = ElementId::new(format!("{}-{}", kind.id_prefix(), self.next));
            self.next += 1;
            if level.kind_of(&id).is_none() {
                return id;
            }
        }
    }
}

/// What a pointer press does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Select,
    Place(ElementKind),
    BallSpawn,
}

/// Element being dragged and where it was grabbed relative to its centre
#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    pub id: ElementId,
    pub offset: Vec2,
}

/// Discrete editor actions raised from the keyboard
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditorCommand {
    DeleteSelected,
    /// Deselect and return to the select tool
    Cancel,
    Rotate(f32),
    Nudge(Vec2),
}

/// Scalar property edits from a properties panel
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyUpdate {
    HalfWidth(f32),
    HalfHeight(f32),
    Radius(f32),
    Restitution(f32),
    Points(u32),
    Label(String),
    Side(Side),
}

impl PropertyUpdate {
    pub fn name(&self) -> &'static str {
        match self {
            PropertyUpdate::HalfWidth(_) => "half-width",
            PropertyUpdate::HalfHeight(_) => "half-height",
            PropertyUpdate::Radius(_) => "radius",
            PropertyUpdate::Restitution(_) => "restitution",
            PropertyUpdate::Points(_) => "points",
            PropertyUpdate::Label(_) => "label",
            PropertyUpdate::Side(_) => "side",
        }
    }

    fn check(&self) -> Result<(), EditError> {
        let invalid = |value: f32| EditError::InvalidValue {
            property: self.name(),
            value,
        };
        match *self {
            PropertyUpdate::HalfWidth(v) | PropertyUpdate::HalfHeight(v) | PropertyUpdate::Radius(v)
                if !(v.is_finite() && v > 0.0) =>
            {
                Err(invalid(v))
            }
            PropertyUpdate::Restitution(v) if !(v.is_finite() && v >= 0.0) => Err(invalid(v)),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditError {
    #[error("no element with id `{0}`")]
    UnknownId(ElementId),
    #[error("a {kind} has no {property}")]
    NotApplicable {
        kind: &'static str,
        property: &'static str,
    },
    #[error("invalid {property}: {value}")]
    InvalidValue { property: &'static str, value: f32 },
}

/// Mutable view of one element, whatever collection it lives in
enum ElementMut<'a> {
    Wall(&'a mut Wall),
    Bumper(&'a mut Bumper),
    Flipper(&'a mut Flipper),
    Sling(&'a mut Sling),
    Kicker(&'a mut Kicker),
    LaneGuide(&'a mut LaneGuide),
    Target(ElementKind, &'a mut Target),
    Trampoline(&'a mut Trampoline),
}

fn element_mut<'a>(level: &'a mut Level, id: &ElementId) -> Option<ElementMut<'a>> {
    let Level {
        walls,
        bumpers,
        flippers,
        slings,
        kickers,
        lane_guides,
        card_targets,
        icon_targets,
        trampolines,
        ..
    } = level;

    if let Some(e) = walls.iter_mut().find(|e| &e.id == id) {
        return Some(ElementMut::Wall(e));
    }
    if let Some(e) = bumpers.iter_mut().find(|e| &e.id == id) {
        return Some(ElementMut::Bumper(e));
    }
    if let Some(e) = flippers.iter_mut().find(|e| &e.id == id) {
        return Some(ElementMut::Flipper(e));
    }
    if let Some(e) = slings.iter_mut().find(|e| &e.id == id) {
        return Some(ElementMut::Sling(e));
    }
    if let Some(e) = kickers.iter_mut().find(|e| &e.id == id) {
        return Some(ElementMut::Kicker(e));
    }
    if let Some(e) = lane_guides.iter_mut().find(|e| &e.id == id) {
        return Some(ElementMut::LaneGuide(e));
    }
    if let Some(e) = card_targets.iter_mut().find(|e| &e.id == id) {
        return Some(ElementMut::Target(ElementKind::CardTarget, e));
    }
    if let Some(e) = icon_targets.iter_mut().find(|e| &e.id == id) {
        return Some(ElementMut::Target(ElementKind::IconTarget, e));
    }
    trampolines
        .iter_mut()
        .find(|e| &e.id == id)
        .map(ElementMut::Trampoline)
}

impl ElementMut<'_> {
    fn kind(&self) -> ElementKind {
        match self {
            ElementMut::Wall(_) => ElementKind::Wall,
            ElementMut::Bumper(_) => ElementKind::Bumper,
            ElementMut::Flipper(_) => ElementKind::Flipper,
            ElementMut::Sling(_) => ElementKind::Sling,
            ElementMut::Kicker(_) => ElementKind::Kicker,
            ElementMut::LaneGuide(_) => ElementKind::LaneGuide,
            ElementMut::Target(kind, _) => *kind,
            ElementMut::Trampoline(_) => ElementKind::Trampoline,
        }
    }

    fn set_position(&mut self, at: Vec2) {
        let (x, y) = match self {
            ElementMut::Wall(e) => (&mut e.cx, &mut e.cy),
            ElementMut::Bumper(e) => (&mut e.cx, &mut e.cy),
            ElementMut::Flipper(e) => (&mut e.anchor_x, &mut e.anchor_y),
            ElementMut::Sling(e) => (&mut e.cx, &mut e.cy),
            ElementMut::Kicker(e) => (&mut e.cx, &mut e.cy),
            ElementMut::LaneGuide(e) => (&mut e.cx, &mut e.cy),
            ElementMut::Target(_, e) => (&mut e.cx, &mut e.cy),
            ElementMut::Trampoline(e) => (&mut e.cx, &mut e.cy),
        };
        *x = at.x;
        *y = at.y;
    }

    /// None for kinds without a rotation (circles, flippers)
    fn rotation_mut(&mut self) -> Option<&mut Option<f32>> {
        match self {
            ElementMut::Wall(e) => Some(&mut e.rotation),
            ElementMut::Sling(e) => Some(&mut e.rotation),
            ElementMut::LaneGuide(e) => Some(&mut e.rotation),
            ElementMut::Target(_, e) => Some(&mut e.rotation),
            ElementMut::Trampoline(e) => Some(&mut e.rotation),
            ElementMut::Bumper(_) | ElementMut::Flipper(_) | ElementMut::Kicker(_) => None,
        }
    }

    fn apply(&mut self, update: PropertyUpdate) -> Result<(), EditError> {
        update.check()?;
        let kind = self.kind();
        let property = update.name();
        match (self, update) {
            (ElementMut::Wall(e), PropertyUpdate::HalfWidth(v)) => e.hw = v,
            (ElementMut::Wall(e), PropertyUpdate::HalfHeight(v)) => e.hh = v,
            (ElementMut::LaneGuide(e), PropertyUpdate::HalfWidth(v)) => e.hw = v,
            (ElementMut::LaneGuide(e), PropertyUpdate::HalfHeight(v)) => e.hh = v,
            (ElementMut::Trampoline(e), PropertyUpdate::HalfWidth(v)) => e.hw = v,
            (ElementMut::Trampoline(e), PropertyUpdate::HalfHeight(v)) => e.hh = v,
            (ElementMut::Trampoline(e), PropertyUpdate::Restitution(v)) => e.restitution = Some(v),
            (ElementMut::Bumper(e), PropertyUpdate::Radius(v)) => e.radius = Some(v),
            (ElementMut::Bumper(e), PropertyUpdate::Restitution(v)) => e.restitution = Some(v),
            (ElementMut::Bumper(e), PropertyUpdate::Points(p)) => e.points = Some(p),
            (ElementMut::Kicker(e), PropertyUpdate::Radius(v)) => e.radius = Some(v),
            (ElementMut::Target(_, e), PropertyUpdate::Label(label)) => e.label = label,
            (ElementMut::Flipper(e), PropertyUpdate::Side(side)) => e.is_left = side == Side::Left,
            (ElementMut::Sling(e), PropertyUpdate::Side(side)) => e.is_left = side == Side::Left,
            _ => {
                return Err(EditError::NotApplicable {
                    kind: kind.as_str(),
                    property,
                });
            }
        }
        Ok(())
    }
}

fn flipper_at(id: ElementId, at: Vec2, side: Side) -> Flipper {
    Flipper {
        id,
        anchor_x: at.x,
        anchor_y: at.y,
        is_left: side == Side::Left,
    }
}

/// Editor session: the level under construction and its UI state
#[derive(Debug, Clone)]
pub struct EditorState {
    pub level: Level,
    pub selected_id: Option<ElementId>,
    pub active_tool: Tool,
    pub drag: Option<DragState>,
    ids: IdGenerator,
    /// Side of the next placed flipper; alternates after each placement
    next_flipper_side: Side,
}

impl Default for EditorState {
    /// Opens on the built-in table
    fn default() -> Self {
        Self::new(Level::classic())
    }
}

impl EditorState {
    pub fn new(level: Level) -> Self {
        Self {
            level,
            selected_id: None,
            active_tool: Tool::Select,
            drag: None,
            ids: IdGenerator::new(),
            next_flipper_side: Side::Left,
        }
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn selected(&self) -> Option<&ElementId> {
        self.selected_id.as_ref()
    }

    pub fn select(&mut self, id: Option<ElementId>) {
        self.selected_id = id;
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.active_tool = tool;
        self.drag = None;
    }

    pub fn next_flipper_side(&self) -> Side {
        self.next_flipper_side
    }

    /// Place a new element with default geometry and select it
    pub fn add_element(&mut self, kind: ElementKind, at: Vec2) -> ElementId {
        let id = self.ids.fresh(kind, &self.level);
        let (cx, cy) = (at.x, at.y);
        let level = &mut self.level;
        match kind {
            ElementKind::Wall => level.walls.push(Wall {
                id: id.clone(),
                cx,
                cy,
                hw: defaults::WALL_HALF_WIDTH,
                hh: WALL_THICKNESS / 2.0,
                rotation: None,
            }),
            ElementKind::Bumper => level.bumpers.push(Bumper {
                id: id.clone(),
                cx,
                cy,
                radius: Some(BUMPER_RADIUS_PX),
                restitution: None,
                points: None,
            }),
            ElementKind::Flipper => {
                let side = self.next_flipper_side;
                self.next_flipper_side = side.opposite();
                level.flippers.push(flipper_at(id.clone(), at, side));
            }
            ElementKind::Sling => level.slings.push(Sling {
                id: id.clone(),
                cx,
                cy,
                rotation: Some(0.0),
                is_left: cx < TABLE_WIDTH / 2.0,
            }),
            ElementKind::Kicker => level.kickers.push(Kicker {
                id: id.clone(),
                cx,
                cy,
                radius: None,
            }),
            ElementKind::LaneGuide => level.lane_guides.push(LaneGuide {
                id: id.clone(),
                cx,
                cy,
                hw: defaults::LANE_HALF_WIDTH,
                hh: defaults::LANE_HALF_HEIGHT,
                rotation: None,
            }),
            ElementKind::CardTarget | ElementKind::IconTarget => {
                let target = Target {
                    id: id.clone(),
                    cx,
                    cy,
                    rotation: None,
                    label: defaults::TARGET_LABEL.to_string(),
                };
                if kind == ElementKind::CardTarget {
                    level.card_targets.push(target);
                } else {
                    level.icon_targets.push(target);
                }
            }
            ElementKind::Trampoline => level.trampolines.push(Trampoline {
                id: id.clone(),
                cx,
                cy,
                hw: defaults::TRAMPOLINE_HALF_WIDTH,
                hh: defaults::TRAMPOLINE_HALF_HEIGHT,
                rotation: None,
                restitution: None,
            }),
        }
        log::debug!("Placed {} at ({}, {})", id, cx, cy);
        self.selected_id = Some(id.clone());
        id
    }

    /// Place a flipper on an explicit side (does not affect the alternation)
    pub fn add_flipper(&mut self, at: Vec2, side: Side) -> ElementId {
        let id = self.ids.fresh(ElementKind::Flipper, &self.level);
        self.level.flippers.push(flipper_at(id.clone(), at, side));
        self.selected_id = Some(id.clone());
        id
    }

    pub fn move_to(&mut self, id: &ElementId, at: Vec2) -> Result<(), EditError> {
        let mut element = element_mut(&mut self.level, id).ok_or_else(|| EditError::UnknownId(id.clone()))?;
        element.set_position(at);
        Ok(())
    }

    pub fn move_by(&mut self, id: &ElementId, delta: Vec2) -> Result<(), EditError> {
        let at = self
            .level
            .position_of(id)
            .ok_or_else(|| EditError::UnknownId(id.clone()))?;
        self.move_to(id, at + delta)
    }

    /// Add `delta` to the element's rotation, wrapped into [-π, π)
    pub fn rotate(&mut self, id: &ElementId, delta: f32) -> Result<(), EditError> {
        let mut element = element_mut(&mut self.level, id).ok_or_else(|| EditError::UnknownId(id.clone()))?;
        let kind = element.kind();
        let rotation = element.rotation_mut().ok_or(EditError::NotApplicable {
            kind: kind.as_str(),
            property: "rotation",
        })?;
        *rotation = Some(normalize_angle(rotation.unwrap_or(0.0) + delta));
        Ok(())
    }

    pub fn update(&mut self, id: &ElementId, update: PropertyUpdate) -> Result<(), EditError> {
        element_mut(&mut self.level, id)
            .ok_or_else(|| EditError::UnknownId(id.clone()))?
            .apply(update)
    }

    /// Remove the element from whichever collection holds it; unknown ids
    /// are a no-op. Returns whether anything was removed.
    pub fn delete(&mut self, id: &ElementId) -> bool {
        let before = self.level.element_count();
        let level = &mut self.level;
        level.walls.retain(|e| &e.id != id);
        level.bumpers.retain(|e| &e.id != id);
        level.flippers.retain(|e| &e.id != id);
        level.slings.retain(|e| &e.id != id);
        level.kickers.retain(|e| &e.id != id);
        level.lane_guides.retain(|e| &e.id != id);
        level.card_targets.retain(|e| &e.id != id);
        level.icon_targets.retain(|e| &e.id != id);
        level.trampolines.retain(|e| &e.id != id);

        if self.selected_id.as_ref() == Some(id) {
            self.selected_id = None;
        }
        if self.drag.as_ref().is_some_and(|d| &d.id == id) {
            self.drag = None;
        }
        self.level.element_count() != before
    }

    pub fn set_ball_spawn(&mut self, at: Vec2) {
        self.level.ball_spawn = Point::from(at);
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.level.name = name.into();
    }

    /// Replace with an empty "Untitled" table
    pub fn clear(&mut self) {
        self.level = Level::empty("Untitled");
        self.selected_id = None;
        self.drag = None;
    }

    /// Replace the level with an independent copy of `level`
    pub fn load(&mut self, level: &Level) {
        self.level = level.clone();
        self.selected_id = None;
        self.drag = None;
        log::info!("Editing '{}' ({} elements)", self.level.name, self.level.element_count());
    }

    /// Validated copy for the play loop
    pub fn play_level(&self) -> Result<Level, LevelError> {
        self.level.validate()?;
        Ok(self.level.clone())
    }

    pub fn pointer_down(&mut self, at: Vec2) {
        match self.active_tool {
            Tool::Select => {
                self.selected_id = hit_test(&self.level, at);
                self.drag = self.selected_id.as_ref().map(|id| {
                    let center = self.level.position_of(id).unwrap_or(at);
                    DragState {
                        id: id.clone(),
                        offset: at - center,
                    }
                });
            }
            Tool::Place(kind) => {
                self.add_element(kind, at);
                self.active_tool = Tool::Select;
            }
            Tool::BallSpawn => {
                self.set_ball_spawn(at);
                self.active_tool = Tool::Select;
            }
        }
    }

    pub fn pointer_move(&mut self, at: Vec2) {
        let Some(drag) = self.drag.clone() else {
            return;
        };
        if self.move_to(&drag.id, at - drag.offset).is_err() {
            self.drag = None;
        }
    }

    pub fn pointer_up(&mut self) {
        self.drag = None;
    }

    /// Run a keyboard command; returns whether the level changed
    pub fn apply(&mut self, command: EditorCommand) -> bool {
        match command {
            EditorCommand::DeleteSelected => match self.selected_id.take() {
                Some(id) => self.delete(&id),
                None => false,
            },
            EditorCommand::Cancel => {
                self.selected_id = None;
                self.drag = None;
                self.active_tool = Tool::Select;
                false
            }
            EditorCommand::Rotate(delta) => {
                let Some(id) = self.selected_id.clone() else {
                    return false;
                };
                match self.rotate(&id, delta) {
                    Ok(()) => true,
                    Err(e) => {
                        log::debug!("Rotate ignored: {}", e);
                        false
                    }
                }
            }
            EditorCommand::Nudge(delta) => {
                let Some(id) = self.selected_id.clone() else {
                    return false;
                };
                self.move_by(&id, delta).is_ok()
            }
        }
    }
}
