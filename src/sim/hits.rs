//! Hit detection from positions and velocities
//!
//! The backend reports transforms only, so a "hit" is inferred: the ball
//! centre is within a per-type radius of the target centre and the ball is
//! moving fast enough that it struck rather than rested. No hysteresis.

use glam::Vec2;

use crate::px;

/// Target kinds that can score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Bumper,
    Sling,
    Kicker,
    Card,
    Icon,
}

/// Proximity and energy thresholds for one target kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRule {
    /// Centre-to-centre distance in pixels
    pub radius_px: f32,
    /// Minimum ball speed squared (physics units)
    pub min_speed_sq: f32,
}

impl HitRule {
    pub const fn new(radius_px: f32, min_speed_sq: f32) -> Self {
        Self {
            radius_px,
            min_speed_sq,
        }
    }

    pub fn for_kind(kind: TargetKind) -> Self {
        match kind {
            TargetKind::Bumper => Self::new(30.0, 2.0),
            TargetKind::Sling => Self::new(50.0, 2.0),
            TargetKind::Kicker => Self::new(20.0, 2.0),
            TargetKind::Card | TargetKind::Icon => Self::new(50.0, 1.5),
        }
    }

    /// Squared hit radius in physics units
    pub fn radius_sq(&self) -> f32 {
        let r = px(self.radius_px);
        r * r
    }
}

/// Ball state sampled once per tick (physics units)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallSample {
    pub pos: Vec2,
    pub vel: Vec2,
}

impl BallSample {
    pub fn is_finite(&self) -> bool {
        self.pos.is_finite() && self.vel.is_finite()
    }
}

/// Evaluate the hit predicate; non-finite input never hits
pub fn detect_hit(ball: BallSample, target: Vec2, rule: HitRule) -> bool {
    if !ball.is_finite() || !target.is_finite() {
        log::debug!("Skipping hit test with non-finite input: {:?} vs {:?}", ball, target);
        return false;
    }
    ball.pos.distance_squared(target) < rule.radius_sq() && ball.vel.length_squared() > rule.min_speed_sq
}

/// Indices of every target in `targets` the ball hits this tick
pub fn hits_among(ball: BallSample, targets: &[Vec2], kind: TargetKind) -> Vec<usize> {
    let rule = HitRule::for_kind(kind);
    targets
        .iter()
        .enumerate()
        .filter(|(_, t)| detect_hit(ball, **t, rule))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_px(x: f32, y: f32) -> Vec2 {
        Vec2::new(px(x), px(y))
    }

    #[test]
    fn test_fast_ball_near_bumper_hits() {
        let ball = BallSample {
            pos: at_px(100.0, 90.0),
            vel: Vec2::new(0.0, 5.0),
        };
        assert!(detect_hit(ball, at_px(100.0, 100.0), HitRule::for_kind(TargetKind::Bumper)));
    }

    #[test]
    fn test_resting_ball_does_not_hit() {
        let ball = BallSample {
            pos: at_px(100.0, 90.0),
            vel: Vec2::new(0.0, 1.0),
        };
        assert!(!detect_hit(ball, at_px(100.0, 100.0), HitRule::for_kind(TargetKind::Bumper)));
    }

    #[test]
    fn test_distance_threshold_is_per_kind() {
        let ball = BallSample {
            pos: at_px(100.0, 75.0),
            vel: Vec2::new(3.0, 0.0),
        };
        let target = at_px(100.0, 100.0);
        assert!(!detect_hit(ball, target, HitRule::for_kind(TargetKind::Kicker)));
        assert!(detect_hit(ball, target, HitRule::for_kind(TargetKind::Bumper)));
        assert!(detect_hit(ball, target, HitRule::for_kind(TargetKind::Card)));
    }

    #[test]
    fn test_nan_never_hits() {
        let ball = BallSample {
            pos: Vec2::new(f32::NAN, 1.0),
            vel: Vec2::new(10.0, 0.0),
        };
        assert!(!detect_hit(ball, Vec2::new(1.0, 1.0), HitRule::for_kind(TargetKind::Bumper)));
        let ball = BallSample {
            pos: Vec2::new(1.0, 1.0),
            vel: Vec2::new(f32::INFINITY, 0.0),
        };
        assert!(!detect_hit(ball, Vec2::new(1.0, 1.0), HitRule::for_kind(TargetKind::Bumper)));
    }

    #[test]
    fn test_multiple_targets_hit_same_tick() {
        let ball = BallSample {
            pos: at_px(100.0, 100.0),
            vel: Vec2::new(4.0, 0.0),
        };
        let targets = [at_px(110.0, 100.0), at_px(300.0, 300.0), at_px(90.0, 100.0)];
        assert_eq!(hits_among(ball, &targets, TargetKind::Bumper), vec![0, 2]);
    }
}
