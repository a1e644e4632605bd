//! Flipper Table - a pinball table simulator
//!
//! Core modules:
//! - `level`: Declarative table description, storage and the saved-levels library
//! - `sim`: Fixed-step play loop (table builder, flippers, hit detection, scoring)
//! - `editor`: Authoring model and click-to-select hit testing
//! - `input`: Held-key tracking and key bindings
//! - `settings`: User preferences
//! - `web`: Browser bindings (wasm32 only)

pub mod editor;
pub mod input;
pub mod level;
pub mod settings;
pub mod sim;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use editor::EditorState;
pub use level::Level;
pub use settings::Settings;
pub use sim::{PlaySession, RapierWorld};

/// Game configuration constants
pub mod consts {
    /// Table dimensions (pixels)
    pub const TABLE_WIDTH: f32 = 400.0;
    pub const TABLE_HEIGHT: f32 = 700.0;

    /// Pixels per physics metre
    pub const SCALE: f32 = 50.0;

    /// Fixed simulation timestep (60 Hz, one tick per display frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Downward gravity (m/s², +y points down the table)
    pub const GRAVITY: f32 = 9.81;

    /// Ball
    pub const BALL_RADIUS_PX: f32 = 10.0;

    /// Flipper body geometry (pixels)
    pub const FLIPPER_WIDTH: f32 = 70.0;
    pub const FLIPPER_HEIGHT: f32 = 14.0;
    pub const FLIPPER_TIP_HEIGHT: f32 = 8.0;

    /// Plunger impulse strength
    pub const PLUNGER_FORCE: f32 = 300.0;

    /// Bumper defaults
    pub const BUMPER_RADIUS_PX: f32 = 20.0;
    pub const BUMPER_RESTITUTION: f32 = 1.5;

    pub const WALL_THICKNESS: f32 = 10.0;

    /// How far below the table the ball must fall to count as drained (pixels)
    pub const DRAIN_MARGIN: f32 = 50.0;

    /// Lives at the start of a game
    pub const STARTING_LIVES: u32 = 3;
}

/// Pixels to physics units
#[inline]
pub fn px(v: f32) -> f32 {
    v / consts::SCALE
}

/// Physics units to pixels
#[inline]
pub fn to_screen(v: f32) -> f32 {
    v * consts::SCALE
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    if !angle.is_finite() {
        return 0.0;
    }
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    // rem_euclid can round up to exactly TAU
    if wrapped >= PI { -PI } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_normalize_angle() {
        // 3π sits on the wrap boundary; either end is the same direction
        assert!((normalize_angle(3.0 * PI).abs() - PI).abs() < 1e-5);
        assert!((normalize_angle(-PI / 2.0) - (-PI / 2.0)).abs() < 1e-6);
        assert!((normalize_angle(2.0 * PI + 0.25) - 0.25).abs() < 1e-5);
        assert_eq!(normalize_angle(f32::NAN), 0.0);
        let huge = normalize_angle(1.0e30);
        assert!((-PI..PI).contains(&huge));
    }

    #[test]
    fn test_scale_round_trip() {
        assert!((to_screen(px(123.0)) - 123.0).abs() < 1e-4);
        assert!((px(consts::SCALE) - 1.0).abs() < f32::EPSILON);
    }
}
