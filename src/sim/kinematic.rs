//! Contact-free physics backend
//!
//! Integrates velocities, gravity and damping and keeps revolute joints
//! pinned, but never resolves contacts. Useful for headless tools and for
//! exercising the play loop without a solver.

use glam::Vec2;

use super::backend::{BodyDesc, BodyHandle, BodyKind, ColliderDesc, PhysicsBackend, Shape};
use crate::consts::SIM_DT;
use crate::normalize_angle;

#[derive(Debug, Clone)]
struct Body {
    kind: BodyKind,
    pos: Vec2,
    rot: f32,
    linvel: Vec2,
    angvel: f32,
    mass: f32,
    linear_damping: f32,
    angular_damping: f32,
}

#[derive(Debug, Clone, Copy)]
struct Hinge {
    anchor: usize,
    body: usize,
    local_a: Vec2,
    local_b: Vec2,
}

#[derive(Debug, Clone)]
pub struct KinematicWorld {
    gravity: Vec2,
    dt: f32,
    bodies: Vec<Body>,
    hinges: Vec<Hinge>,
    colliders: usize,
}

impl Default for KinematicWorld {
    /// Weightless world at the simulation rate
    fn default() -> Self {
        Self::new(Vec2::ZERO, SIM_DT)
    }
}

impl KinematicWorld {
    pub fn new(gravity: Vec2, dt: f32) -> Self {
        Self {
            gravity,
            dt,
            bodies: Vec::new(),
            hinges: Vec::new(),
            colliders: 0,
        }
    }

    fn pin_hinges(&mut self) {
        for hinge in &self.hinges {
            let a = &self.bodies[hinge.anchor];
            let world_pivot = a.pos + Vec2::from_angle(a.rot).rotate(hinge.local_a);
            let b = &mut self.bodies[hinge.body];
            if b.kind == BodyKind::Dynamic {
                b.pos = world_pivot - Vec2::from_angle(b.rot).rotate(hinge.local_b);
            }
        }
    }
}

impl PhysicsBackend for KinematicWorld {
    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        self.bodies.push(Body {
            kind: desc.kind,
            pos: desc.translation,
            rot: desc.rotation,
            linvel: Vec2::ZERO,
            angvel: 0.0,
            mass: 0.0,
            linear_damping: desc.linear_damping,
            angular_damping: desc.angular_damping,
        });
        BodyHandle(self.bodies.len() as u32 - 1)
    }

    fn attach_collider(&mut self, body: BodyHandle, desc: &ColliderDesc) {
        let area = match desc.shape {
            Shape::Cuboid { half_extents } => 4.0 * half_extents.x * half_extents.y,
            Shape::Ball { radius } => std::f32::consts::PI * radius * radius,
        };
        if let Some(b) = self.bodies.get_mut(body.index()) {
            b.mass += area * desc.density;
            self.colliders += 1;
        }
    }

    fn create_revolute_joint(
        &mut self,
        anchor: BodyHandle,
        body: BodyHandle,
        local_anchor_a: Vec2,
        local_anchor_b: Vec2,
    ) {
        if anchor.index() < self.bodies.len() && body.index() < self.bodies.len() {
            self.hinges.push(Hinge {
                anchor: anchor.index(),
                body: body.index(),
                local_a: local_anchor_a,
                local_b: local_anchor_b,
            });
        }
    }

    fn step(&mut self) {
        let dt = self.dt;
        for b in self.bodies.iter_mut().filter(|b| b.kind == BodyKind::Dynamic) {
            b.linvel += self.gravity * dt;
            b.linvel *= 1.0 / (1.0 + dt * b.linear_damping);
            b.angvel *= 1.0 / (1.0 + dt * b.angular_damping);
            b.pos += b.linvel * dt;
            b.rot = normalize_angle(b.rot + b.angvel * dt);
        }
        self.pin_hinges();
    }

    fn translation(&self, body: BodyHandle) -> Vec2 {
        self.bodies.get(body.index()).map_or(Vec2::ZERO, |b| b.pos)
    }

    fn rotation(&self, body: BodyHandle) -> f32 {
        self.bodies.get(body.index()).map_or(0.0, |b| b.rot)
    }

    fn linvel(&self, body: BodyHandle) -> Vec2 {
        self.bodies.get(body.index()).map_or(Vec2::ZERO, |b| b.linvel)
    }

    fn angvel(&self, body: BodyHandle) -> f32 {
        self.bodies.get(body.index()).map_or(0.0, |b| b.angvel)
    }

    fn set_translation(&mut self, body: BodyHandle, translation: Vec2) {
        if let Some(b) = self.bodies.get_mut(body.index()) {
            b.pos = translation;
        }
    }

    fn set_rotation(&mut self, body: BodyHandle, rotation: f32) {
        if let Some(b) = self.bodies.get_mut(body.index()) {
            b.rot = rotation;
        }
    }

    fn set_linvel(&mut self, body: BodyHandle, linvel: Vec2) {
        if let Some(b) = self.bodies.get_mut(body.index()) {
            b.linvel = linvel;
        }
    }

    fn set_angvel(&mut self, body: BodyHandle, angvel: f32) {
        if let Some(b) = self.bodies.get_mut(body.index()) {
            b.angvel = angvel;
        }
    }

    fn apply_impulse(&mut self, body: BodyHandle, impulse: Vec2) {
        if let Some(b) = self.bodies.get_mut(body.index()) {
            if b.kind == BodyKind::Dynamic {
                // Bodies without colliders behave as unit mass
                let mass = if b.mass > 0.0 { b.mass } else { 1.0 };
                b.linvel += impulse / mass;
            }
        }
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn collider_count(&self) -> usize {
        self.colliders
    }

    fn joint_count(&self) -> usize {
        self.hinges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrates_velocity() {
        let mut world = KinematicWorld::default();
        let ball = world.create_body(&BodyDesc::dynamic(Vec2::new(1.0, 1.0)));
        world.set_linvel(ball, Vec2::new(0.0, 6.0));
        world.step();
        assert!((world.translation(ball).y - 1.1).abs() < 1e-5);
    }

    #[test]
    fn test_fixed_bodies_ignore_gravity() {
        let mut world = KinematicWorld::new(Vec2::new(0.0, 9.81), SIM_DT);
        let wall = world.create_body(&BodyDesc::fixed(Vec2::new(1.0, 1.0)));
        let ball = world.create_body(&BodyDesc::dynamic(Vec2::new(1.0, 1.0)));
        world.step();
        assert_eq!(world.translation(wall), Vec2::new(1.0, 1.0));
        assert!(world.translation(ball).y > 1.0);
    }

    #[test]
    fn test_impulse_scales_with_mass() {
        let mut world = KinematicWorld::default();
        let ball = world.create_body(&BodyDesc::dynamic(Vec2::ZERO));
        world.attach_collider(ball, &ColliderDesc::cuboid(0.5, 0.5).density(2.0));
        world.apply_impulse(ball, Vec2::new(4.0, 0.0));
        assert!((world.linvel(ball).x - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_hinge_keeps_pivot_fixed() {
        let mut world = KinematicWorld::default();
        let anchor = world.create_body(&BodyDesc::fixed(Vec2::new(2.0, 2.0)));
        let arm = world.create_body(&BodyDesc::dynamic(Vec2::new(2.7, 2.0)));
        world.create_revolute_joint(anchor, arm, Vec2::ZERO, Vec2::new(-0.7, 0.0));
        world.set_angvel(arm, 3.0);
        for _ in 0..10 {
            world.step();
        }
        let rot = world.rotation(arm);
        let pivot = world.translation(arm) + Vec2::from_angle(rot).rotate(Vec2::new(-0.7, 0.0));
        assert!((pivot - Vec2::new(2.0, 2.0)).length() < 1e-4);
        assert!(rot > 0.0);
        assert_eq!(world.joint_count(), 1);
    }
}
