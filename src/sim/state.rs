//! Play session state and the per-tick presentation snapshot
//!
//! `SessionState` is everything the scoring rules mutate. `Snapshot` is the
//! read-only, owned copy handed to a renderer after each tick; it carries
//! transforms in pixels so presentation never touches physics units.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::scoring::{ScoreEvent, Scoreboard};
use crate::level::{ElementId, ElementKind, Side};

/// Current phase of a play session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Ball in play, loop stepping
    Playing,
    /// Lives exhausted; no stepping until replay
    GameOver,
}

/// Mutable session state (derived from the level, never persisted with it)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    /// Seed of the launch jitter RNG
    pub seed: u64,
    pub phase: GamePhase,
    /// Ticks stepped since the session (or the last replay) started
    pub time_ticks: u64,
    pub board: Scoreboard,
}

impl SessionState {
    pub fn new(seed: u64, card_count: usize, icon_count: usize, starting_lives: u32) -> Self {
        Self {
            seed,
            phase: GamePhase::Playing,
            time_ticks: 0,
            board: Scoreboard::new(card_count, icon_count, starting_lives),
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }
}

/// Position (pixels) and rotation (radians) of one body
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub pos: Vec2,
    pub rotation: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlipperPose {
    pub id: ElementId,
    pub side: Side,
    pub pose: Pose,
}

/// A non-flipper element body; `index` is its position in the level's list
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementPose {
    pub kind: ElementKind,
    pub index: usize,
    pub pose: Pose,
}

/// Render-ready state after one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub phase: GamePhase,
    pub ball: Pose,
    pub flippers: Vec<FlipperPose>,
    pub elements: Vec<ElementPose>,
    pub score: u64,
    pub lives: u32,
    pub card_hits: Vec<bool>,
    pub icon_hits: Vec<bool>,
    pub jackpot_active: bool,
    pub jackpot_timer: u32,
    /// Scoring events raised since the previous drain
    pub events: Vec<ScoreEvent>,
}

impl Snapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
