//! Declarative table description
//!
//! A `Level` is pure data: geometry and element parameters in pixels, with
//! no behaviour attached. The JSON file format uses camelCase keys and
//! treats every collection after `flippers` as optional.

mod classic;
pub mod library;
pub mod store;

use std::collections::HashSet;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

pub use library::{SavedLevel, SavedLevels};
pub use store::{DirLevelStore, LevelEntry, LevelStore, StoreError};

/// Stable element identifier, unique across every collection of a level
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A point in table pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<Point> for Vec2 {
    fn from(p: Point) -> Self {
        Vec2::new(p.x, p.y)
    }
}

impl From<Vec2> for Point {
    fn from(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

/// Which way a flipper or slingshot faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn from_is_left(is_left: bool) -> Self {
        if is_left { Side::Left } else { Side::Right }
    }

    /// +1 for left (body extends to the right of its pivot), -1 for right
    pub fn dir(self) -> f32 {
        match self {
            Side::Left => 1.0,
            Side::Right => -1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Element types that can be placed on a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Wall,
    Bumper,
    Flipper,
    Sling,
    Kicker,
    LaneGuide,
    CardTarget,
    IconTarget,
    Trampoline,
}

impl ElementKind {
    pub const ALL: [ElementKind; 9] = [
        ElementKind::Wall,
        ElementKind::Bumper,
        ElementKind::Flipper,
        ElementKind::Sling,
        ElementKind::Kicker,
        ElementKind::LaneGuide,
        ElementKind::CardTarget,
        ElementKind::IconTarget,
        ElementKind::Trampoline,
    ];

    /// Position in `ALL`
    pub fn index(self) -> usize {
        self as usize
    }

    /// Prefix used when minting new ids in the editor
    pub fn id_prefix(self) -> &'static str {
        match self {
            ElementKind::Wall => "wall",
            ElementKind::Bumper => "bump",
            ElementKind::Flipper => "flip",
            ElementKind::Sling => "sling",
            ElementKind::Kicker => "kick",
            ElementKind::LaneGuide => "lane",
            ElementKind::CardTarget => "card",
            ElementKind::IconTarget => "icon",
            ElementKind::Trampoline => "tramp",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Wall => "wall",
            ElementKind::Bumper => "bumper",
            ElementKind::Flipper => "flipper",
            ElementKind::Sling => "sling",
            ElementKind::Kicker => "kicker",
            ElementKind::LaneGuide => "lane guide",
            ElementKind::CardTarget => "card target",
            ElementKind::IconTarget => "icon target",
            ElementKind::Trampoline => "trampoline",
        }
    }
}

/// Static box wall
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Wall {
    pub id: ElementId,
    pub cx: f32,
    pub cy: f32,
    pub hw: f32,
    pub hh: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
}

/// Round pop bumper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bumper {
    pub id: ElementId,
    pub cx: f32,
    pub cy: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restitution: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
}

/// Default points for a bumper hit
pub const BUMPER_POINTS: u32 = 100;

impl Bumper {
    pub fn radius(&self) -> f32 {
        self.radius.unwrap_or(BUMPER_RADIUS_PX)
    }

    pub fn restitution(&self) -> f32 {
        self.restitution.unwrap_or(BUMPER_RESTITUTION)
    }

    pub fn points(&self) -> u32 {
        self.points.unwrap_or(BUMPER_POINTS)
    }
}

/// Player flipper; body geometry comes from the flipper constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Flipper {
    pub id: ElementId,
    pub anchor_x: f32,
    pub anchor_y: f32,
    pub is_left: bool,
}

impl Flipper {
    pub fn side(&self) -> Side {
        Side::from_is_left(self.is_left)
    }

    pub fn anchor(&self) -> Vec2 {
        Vec2::new(self.anchor_x, self.anchor_y)
    }
}

/// Slingshot segment half extents (pixels)
pub const SLING_HALF_EXTENTS: Vec2 = Vec2::new(45.0, 4.0);

/// Angled kicking wall above the flippers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Sling {
    pub id: ElementId,
    pub cx: f32,
    pub cy: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
    pub is_left: bool,
}

pub const KICKER_RADIUS_PX: f32 = 12.0;

/// Small very bouncy post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Kicker {
    pub id: ElementId,
    pub cx: f32,
    pub cy: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f32>,
}

impl Kicker {
    pub fn radius(&self) -> f32 {
        self.radius.unwrap_or(KICKER_RADIUS_PX)
    }
}

/// Low-friction guide rail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LaneGuide {
    pub id: ElementId,
    pub cx: f32,
    pub cy: f32,
    pub hw: f32,
    pub hh: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
}

/// Card and icon target plate half extents (pixels)
pub const TARGET_HALF_EXTENTS: Vec2 = Vec2::new(34.0, 24.0);

/// One-shot target belonging to a bank (card or icon)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Target {
    pub id: ElementId,
    pub cx: f32,
    pub cy: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
    pub label: String,
}

pub const TRAMPOLINE_RESTITUTION: f32 = 1.8;

/// Springy pad
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Trampoline {
    pub id: ElementId,
    pub cx: f32,
    pub cy: f32,
    pub hw: f32,
    pub hh: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restitution: Option<f32>,
}

impl Trampoline {
    pub fn restitution(&self) -> f32 {
        self.restitution.unwrap_or(TRAMPOLINE_RESTITUTION)
    }
}

/// Errors raised while loading or validating a level
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("malformed level JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate element id `{0}`")]
    DuplicateId(ElementId),
    #[error("{kind} has an empty id")]
    EmptyId { kind: &'static str },
    #[error("{kind} `{id}` has a non-finite {field}")]
    NonFinite {
        kind: &'static str,
        id: ElementId,
        field: &'static str,
    },
    #[error("{kind} `{id}` has invalid {field} {value}")]
    InvalidDimension {
        kind: &'static str,
        id: ElementId,
        field: &'static str,
        value: f32,
    },
    #[error("ball spawn ({x}, {y}) lies outside the table")]
    SpawnOutOfBounds { x: f32, y: f32 },
}

/// A complete table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Level {
    pub name: String,
    pub ball_spawn: Point,
    pub walls: Vec<Wall>,
    pub bumpers: Vec<Bumper>,
    pub flippers: Vec<Flipper>,
    #[serde(default)]
    pub slings: Vec<Sling>,
    #[serde(default)]
    pub kickers: Vec<Kicker>,
    #[serde(default)]
    pub lane_guides: Vec<LaneGuide>,
    #[serde(default)]
    pub card_targets: Vec<Target>,
    #[serde(default)]
    pub icon_targets: Vec<Target>,
    #[serde(default)]
    pub trampolines: Vec<Trampoline>,
}

impl Default for Level {
    fn default() -> Self {
        Self::empty("Untitled")
    }
}

impl Level {
    /// A table with nothing on it but the ball spawn
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ball_spawn: Point::new(TABLE_WIDTH / 2.0, 80.0),
            walls: Vec::new(),
            bumpers: Vec::new(),
            flippers: Vec::new(),
            slings: Vec::new(),
            kickers: Vec::new(),
            lane_guides: Vec::new(),
            card_targets: Vec::new(),
            icon_targets: Vec::new(),
            trampolines: Vec::new(),
        }
    }

    /// The built-in "Classic" table
    pub fn classic() -> Self {
        classic::classic()
    }

    /// Parse and validate a level file
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let level: Level = serde_json::from_str(json)?;
        level.validate()?;
        Ok(level)
    }

    pub fn to_json_pretty(&self) -> Result<String, LevelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Every element id with its kind, in collection order
    pub fn ids(&self) -> impl Iterator<Item = (ElementKind, &ElementId)> {
        let walls = self.walls.iter().map(|e| (ElementKind::Wall, &e.id));
        let bumpers = self.bumpers.iter().map(|e| (ElementKind::Bumper, &e.id));
        let flippers = self.flippers.iter().map(|e| (ElementKind::Flipper, &e.id));
        let slings = self.slings.iter().map(|e| (ElementKind::Sling, &e.id));
        let kickers = self.kickers.iter().map(|e| (ElementKind::Kicker, &e.id));
        let lanes = self.lane_guides.iter().map(|e| (ElementKind::LaneGuide, &e.id));
        let cards = self.card_targets.iter().map(|e| (ElementKind::CardTarget, &e.id));
        let icons = self.icon_targets.iter().map(|e| (ElementKind::IconTarget, &e.id));
        let tramps = self.trampolines.iter().map(|e| (ElementKind::Trampoline, &e.id));
        walls
            .chain(bumpers)
            .chain(flippers)
            .chain(slings)
            .chain(kickers)
            .chain(lanes)
            .chain(cards)
            .chain(icons)
            .chain(tramps)
    }

    /// Total number of placed elements
    pub fn element_count(&self) -> usize {
        self.walls.len()
            + self.bumpers.len()
            + self.flippers.len()
            + self.slings.len()
            + self.kickers.len()
            + self.lane_guides.len()
            + self.card_targets.len()
            + self.icon_targets.len()
            + self.trampolines.len()
    }

    /// Number of elements of one kind
    pub fn count_of(&self, kind: ElementKind) -> usize {
        match kind {
            ElementKind::Wall => self.walls.len(),
            ElementKind::Bumper => self.bumpers.len(),
            ElementKind::Flipper => self.flippers.len(),
            ElementKind::Sling => self.slings.len(),
            ElementKind::Kicker => self.kickers.len(),
            ElementKind::LaneGuide => self.lane_guides.len(),
            ElementKind::CardTarget => self.card_targets.len(),
            ElementKind::IconTarget => self.icon_targets.len(),
            ElementKind::Trampoline => self.trampolines.len(),
        }
    }

    pub fn kind_of(&self, id: &ElementId) -> Option<ElementKind> {
        self.ids().find(|(_, eid)| *eid == id).map(|(kind, _)| kind)
    }

    /// Reference position of an element (centre, or pivot for flippers)
    pub fn position_of(&self, id: &ElementId) -> Option<Vec2> {
        fn find<T>(items: &[T], id: &ElementId, f: impl Fn(&T) -> (&ElementId, Vec2)) -> Option<Vec2> {
            items.iter().map(f).find(|(eid, _)| *eid == id).map(|(_, p)| p)
        }
        find(&self.walls, id, |e| (&e.id, Vec2::new(e.cx, e.cy)))
            .or_else(|| find(&self.bumpers, id, |e| (&e.id, Vec2::new(e.cx, e.cy))))
            .or_else(|| find(&self.flippers, id, |e| (&e.id, e.anchor())))
            .or_else(|| find(&self.slings, id, |e| (&e.id, Vec2::new(e.cx, e.cy))))
            .or_else(|| find(&self.kickers, id, |e| (&e.id, Vec2::new(e.cx, e.cy))))
            .or_else(|| find(&self.lane_guides, id, |e| (&e.id, Vec2::new(e.cx, e.cy))))
            .or_else(|| find(&self.card_targets, id, |e| (&e.id, Vec2::new(e.cx, e.cy))))
            .or_else(|| find(&self.icon_targets, id, |e| (&e.id, Vec2::new(e.cx, e.cy))))
            .or_else(|| find(&self.trampolines, id, |e| (&e.id, Vec2::new(e.cx, e.cy))))
    }

    /// Check the invariants the table builder relies on
    pub fn validate(&self) -> Result<(), LevelError> {
        let mut seen = HashSet::new();
        for (kind, id) in self.ids() {
            if id.0.is_empty() {
                return Err(LevelError::EmptyId { kind: kind.as_str() });
            }
            if !seen.insert(id) {
                return Err(LevelError::DuplicateId(id.clone()));
            }
        }

        let spawn = self.ball_spawn;
        if !spawn.x.is_finite() || !spawn.y.is_finite() {
            return Err(LevelError::SpawnOutOfBounds { x: spawn.x, y: spawn.y });
        }
        if !(0.0..=TABLE_WIDTH).contains(&spawn.x) || !(0.0..=TABLE_HEIGHT).contains(&spawn.y) {
            return Err(LevelError::SpawnOutOfBounds { x: spawn.x, y: spawn.y });
        }

        for w in &self.walls {
            let c = Check::new("wall", &w.id);
            c.finite("cx", w.cx)?;
            c.finite("cy", w.cy)?;
            c.finite_opt("rotation", w.rotation)?;
            c.positive("hw", w.hw)?;
            c.positive("hh", w.hh)?;
        }
        for b in &self.bumpers {
            let c = Check::new("bumper", &b.id);
            c.finite("cx", b.cx)?;
            c.finite("cy", b.cy)?;
            c.positive("radius", b.radius())?;
            c.non_negative("restitution", b.restitution())?;
        }
        for f in &self.flippers {
            let c = Check::new("flipper", &f.id);
            c.finite("anchorX", f.anchor_x)?;
            c.finite("anchorY", f.anchor_y)?;
        }
        for s in &self.slings {
            let c = Check::new("sling", &s.id);
            c.finite("cx", s.cx)?;
            c.finite("cy", s.cy)?;
            c.finite_opt("rotation", s.rotation)?;
        }
        for k in &self.kickers {
            let c = Check::new("kicker", &k.id);
            c.finite("cx", k.cx)?;
            c.finite("cy", k.cy)?;
            c.positive("radius", k.radius())?;
        }
        for g in &self.lane_guides {
            let c = Check::new("lane guide", &g.id);
            c.finite("cx", g.cx)?;
            c.finite("cy", g.cy)?;
            c.finite_opt("rotation", g.rotation)?;
            c.positive("hw", g.hw)?;
            c.positive("hh", g.hh)?;
        }
        for (kind, targets) in [("card target", &self.card_targets), ("icon target", &self.icon_targets)] {
            for t in targets {
                let c = Check::new(kind, &t.id);
                c.finite("cx", t.cx)?;
                c.finite("cy", t.cy)?;
                c.finite_opt("rotation", t.rotation)?;
            }
        }
        for t in &self.trampolines {
            let c = Check::new("trampoline", &t.id);
            c.finite("cx", t.cx)?;
            c.finite("cy", t.cy)?;
            c.finite_opt("rotation", t.rotation)?;
            c.positive("hw", t.hw)?;
            c.positive("hh", t.hh)?;
            c.non_negative("restitution", t.restitution())?;
        }
        Ok(())
    }
}

/// Field checks for one element
struct Check<'a> {
    kind: &'static str,
    id: &'a ElementId,
}

impl<'a> Check<'a> {
    fn new(kind: &'static str, id: &'a ElementId) -> Self {
        Self { kind, id }
    }

    fn finite(&self, field: &'static str, value: f32) -> Result<(), LevelError> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(LevelError::NonFinite {
                kind: self.kind,
                id: self.id.clone(),
                field,
            })
        }
    }

    fn finite_opt(&self, field: &'static str, value: Option<f32>) -> Result<(), LevelError> {
        value.map_or(Ok(()), |v| self.finite(field, v))
    }

    fn positive(&self, field: &'static str, value: f32) -> Result<(), LevelError> {
        self.finite(field, value)?;
        if value > 0.0 {
            Ok(())
        } else {
            Err(self.invalid(field, value))
        }
    }

    fn non_negative(&self, field: &'static str, value: f32) -> Result<(), LevelError> {
        self.finite(field, value)?;
        if value >= 0.0 {
            Ok(())
        } else {
            Err(self.invalid(field, value))
        }
    }

    fn invalid(&self, field: &'static str, value: f32) -> LevelError {
        LevelError::InvalidDimension {
            kind: self.kind,
            id: self.id.clone(),
            field,
            value,
        }
    }
}
