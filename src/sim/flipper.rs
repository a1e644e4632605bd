//! Flipper actuator control
//!
//! A pure per-tick control law: drive the flipper toward its active or rest
//! angle at a fixed angular speed, and once the clamp is reached hold it
//! there with zero velocity. Joint limits in the backend are not used.

use glam::Vec2;

use super::backend::PhysicsBackend;
use super::builder::FlipperRig;
use crate::level::Side;

/// Angular drive speed (rad/s)
pub const FLIP_SPEED: f32 = 22.5;

/// Travel limits for one side (radians, +y down so positive is clockwise)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlipperLimits {
    /// Angle while the key is released
    pub rest: f32,
    /// Angle while the key is held
    pub active: f32,
}

impl FlipperLimits {
    pub fn for_side(side: Side) -> Self {
        match side {
            Side::Left => Self {
                rest: 0.8,
                active: -0.3,
            },
            Side::Right => Self {
                rest: -0.8,
                active: 0.3,
            },
        }
    }

    pub fn min(&self) -> f32 {
        self.rest.min(self.active)
    }

    pub fn max(&self) -> f32 {
        self.rest.max(self.active)
    }

    pub fn contains(&self, angle: f32) -> bool {
        (self.min()..=self.max()).contains(&angle)
    }
}

/// Drives one flipper body
#[derive(Debug, Clone)]
pub struct FlipperController {
    rig: FlipperRig,
    limits: FlipperLimits,
}

impl FlipperController {
    pub fn new(rig: FlipperRig) -> Self {
        let limits = FlipperLimits::for_side(rig.side);
        Self { rig, limits }
    }

    pub fn rig(&self) -> &FlipperRig {
        &self.rig
    }

    pub fn limits(&self) -> FlipperLimits {
        self.limits
    }

    pub fn angle<B: PhysicsBackend>(&self, backend: &B) -> f32 {
        backend.rotation(self.rig.body)
    }

    /// Pre-step control law
    pub fn drive<B: PhysicsBackend>(&self, backend: &mut B, activated: bool) {
        let target = if activated {
            self.limits.active
        } else {
            self.limits.rest
        };
        let angle = backend.rotation(self.rig.body);
        if !angle.is_finite() {
            self.snap(backend, self.limits.rest);
            return;
        }

        let toward_max = target >= self.limits.max();
        let reached = if toward_max {
            angle >= target
        } else {
            angle <= target
        };

        if reached {
            self.snap(backend, target);
        } else {
            let speed = if toward_max { FLIP_SPEED } else { -FLIP_SPEED };
            backend.set_angvel(self.rig.body, speed);
        }
    }

    /// Post-step pass: pull any integrator overshoot back onto the clamp
    pub fn enforce_clamp<B: PhysicsBackend>(&self, backend: &mut B) {
        let angle = backend.rotation(self.rig.body);
        if !angle.is_finite() {
            self.snap(backend, self.limits.rest);
        } else if angle < self.limits.min() {
            self.snap(backend, self.limits.min());
        } else if angle > self.limits.max() {
            self.snap(backend, self.limits.max());
        }
    }

    /// Hard-set the angle, keeping the pivot on the anchor
    fn snap<B: PhysicsBackend>(&self, backend: &mut B, angle: f32) {
        let body = self.rig.body;
        backend.set_angvel(body, 0.0);
        backend.set_linvel(body, Vec2::ZERO);
        backend.set_rotation(body, angle);
        backend.set_translation(body, self.rig.pivot + Vec2::from_angle(angle).rotate(self.rig.arm));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use crate::sim::{KinematicWorld, build_table};
    use proptest::prelude::*;

    fn rigged() -> (KinematicWorld, FlipperController, FlipperController) {
        let mut world = KinematicWorld::default();
        let table = build_table(&mut world, &Level::classic());
        let left = FlipperController::new(table.left_flipper.unwrap());
        let right = FlipperController::new(table.right_flipper.unwrap());
        (world, left, right)
    }

    fn run(world: &mut KinematicWorld, ctrl: &FlipperController, held: bool, ticks: usize) {
        for _ in 0..ticks {
            ctrl.drive(world, held);
            world.step();
            ctrl.enforce_clamp(world);
        }
    }

    #[test]
    fn test_left_flipper_travels_to_clamps() {
        let (mut world, left, _) = rigged();
        run(&mut world, &left, false, 30);
        assert!((left.angle(&world) - 0.8).abs() < 1e-6);
        assert_eq!(world.angvel(left.rig().body), 0.0);

        run(&mut world, &left, true, 30);
        assert!((left.angle(&world) + 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_right_flipper_is_mirrored() {
        let (mut world, _, right) = rigged();
        run(&mut world, &right, false, 30);
        assert!((right.angle(&world) + 0.8).abs() < 1e-6);
        run(&mut world, &right, true, 30);
        assert!((right.angle(&world) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_drive_sign_toward_target() {
        let (mut world, left, right) = rigged();
        left.drive(&mut world, true);
        right.drive(&mut world, true);
        assert_eq!(world.angvel(left.rig().body), -FLIP_SPEED);
        assert_eq!(world.angvel(right.rig().body), FLIP_SPEED);
    }

    #[test]
    fn test_snap_keeps_pivot_on_anchor() {
        let (mut world, left, _) = rigged();
        run(&mut world, &left, true, 20);
        let rig = left.rig();
        let angle = left.angle(&world);
        let pivot = world.translation(rig.body) - Vec2::from_angle(angle).rotate(rig.arm);
        assert!((pivot - rig.pivot).length() < 1e-4);
    }

    proptest! {
        #[test]
        fn prop_angle_stays_within_clamp(presses in proptest::collection::vec(any::<bool>(), 1..200)) {
            let (mut world, left, right) = rigged();
            for held in presses {
                left.drive(&mut world, held);
                right.drive(&mut world, !held);
                world.step();
                left.enforce_clamp(&mut world);
                right.enforce_clamp(&mut world);
                prop_assert!(left.limits().contains(left.angle(&world)));
                prop_assert!(right.limits().contains(right.angle(&world)));
            }
        }
    }
}
