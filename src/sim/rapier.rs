//! Rapier-backed physics world
//!
//! Owns every rapier set for one play session. Dropping the world frees
//! all bodies, colliders and joints, so a new session always starts from
//! a fresh `RapierWorld`.

use glam::Vec2;
use rapier2d::na::UnitComplex;
use rapier2d::prelude::*;

use super::backend::{BodyDesc, BodyHandle, BodyKind, ColliderDesc, PhysicsBackend, Shape};
use crate::consts::{GRAVITY, SIM_DT};

pub struct RapierWorld {
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
    /// Backend handle index -> rapier handle
    handles: Vec<RigidBodyHandle>,
}

impl Default for RapierWorld {
    fn default() -> Self {
        Self::new(Vec2::new(0.0, GRAVITY), SIM_DT)
    }
}

impl RapierWorld {
    pub fn new(gravity: Vec2, dt: f32) -> Self {
        let integration_params = IntegrationParameters {
            dt,
            ..IntegrationParameters::default()
        };
        Self {
            gravity: vector![gravity.x, gravity.y],
            integration_params,
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            handles: Vec::new(),
        }
    }

    fn body(&self, body: BodyHandle) -> Option<&RigidBody> {
        self.handles
            .get(body.index())
            .and_then(|h| self.bodies.get(*h))
    }

    fn body_mut(&mut self, body: BodyHandle) -> Option<&mut RigidBody> {
        let handle = *self.handles.get(body.index())?;
        self.bodies.get_mut(handle)
    }
}

impl PhysicsBackend for RapierWorld {
    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let builder = match desc.kind {
            BodyKind::Fixed => RigidBodyBuilder::fixed(),
            BodyKind::Dynamic => RigidBodyBuilder::dynamic(),
        };
        let body = builder
            .translation(vector![desc.translation.x, desc.translation.y])
            .rotation(desc.rotation)
            .ccd_enabled(desc.ccd)
            .can_sleep(desc.can_sleep)
            .linear_damping(desc.linear_damping)
            .angular_damping(desc.angular_damping)
            .build();
        let handle = self.bodies.insert(body);
        self.handles.push(handle);
        BodyHandle(self.handles.len() as u32 - 1)
    }

    fn attach_collider(&mut self, body: BodyHandle, desc: &ColliderDesc) {
        let Some(&parent) = self.handles.get(body.index()) else {
            log::warn!("Collider attached to unknown body {:?}", body);
            return;
        };
        let builder = match desc.shape {
            Shape::Cuboid { half_extents } => ColliderBuilder::cuboid(half_extents.x, half_extents.y),
            Shape::Ball { radius } => ColliderBuilder::ball(radius),
        };
        let collider = builder
            .translation(vector![desc.offset.x, desc.offset.y])
            .restitution(desc.restitution)
            .friction(desc.friction)
            .density(desc.density)
            .build();
        self.colliders
            .insert_with_parent(collider, parent, &mut self.bodies);
    }

    fn create_revolute_joint(
        &mut self,
        anchor: BodyHandle,
        body: BodyHandle,
        local_anchor_a: Vec2,
        local_anchor_b: Vec2,
    ) {
        let (Some(&h1), Some(&h2)) = (
            self.handles.get(anchor.index()),
            self.handles.get(body.index()),
        ) else {
            log::warn!("Joint between unknown bodies {:?} and {:?}", anchor, body);
            return;
        };
        let joint = RevoluteJointBuilder::new()
            .local_anchor1(point![local_anchor_a.x, local_anchor_a.y])
            .local_anchor2(point![local_anchor_b.x, local_anchor_b.y])
            .build();
        self.impulse_joints.insert(h1, h2, joint, true);
    }

    fn step(&mut self) {
        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            None,
            &(),
            &(),
        );
    }

    fn translation(&self, body: BodyHandle) -> Vec2 {
        self.body(body)
            .map(|b| Vec2::new(b.translation().x, b.translation().y))
            .unwrap_or(Vec2::ZERO)
    }

    fn rotation(&self, body: BodyHandle) -> f32 {
        self.body(body).map(|b| b.rotation().angle()).unwrap_or(0.0)
    }

    fn linvel(&self, body: BodyHandle) -> Vec2 {
        self.body(body)
            .map(|b| Vec2::new(b.linvel().x, b.linvel().y))
            .unwrap_or(Vec2::ZERO)
    }

    fn angvel(&self, body: BodyHandle) -> f32 {
        self.body(body).map(|b| b.angvel()).unwrap_or(0.0)
    }

    fn set_translation(&mut self, body: BodyHandle, translation: Vec2) {
        if let Some(b) = self.body_mut(body) {
            b.set_translation(vector![translation.x, translation.y], true);
        }
    }

    fn set_rotation(&mut self, body: BodyHandle, rotation: f32) {
        if let Some(b) = self.body_mut(body) {
            b.set_rotation(UnitComplex::new(rotation), true);
        }
    }

    fn set_linvel(&mut self, body: BodyHandle, linvel: Vec2) {
        if let Some(b) = self.body_mut(body) {
            b.set_linvel(vector![linvel.x, linvel.y], true);
        }
    }

    fn set_angvel(&mut self, body: BodyHandle, angvel: f32) {
        if let Some(b) = self.body_mut(body) {
            b.set_angvel(angvel, true);
        }
    }

    fn apply_impulse(&mut self, body: BodyHandle, impulse: Vec2) {
        if let Some(b) = self.body_mut(body) {
            b.apply_impulse(vector![impulse.x, impulse.y], true);
        }
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    fn joint_count(&self) -> usize {
        self.impulse_joints.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dynamic_ball_falls() {
        let mut world = RapierWorld::default();
        let ball = world.create_body(&BodyDesc::dynamic(Vec2::new(1.0, 1.0)).can_sleep(false));
        world.attach_collider(ball, &ColliderDesc::ball(0.2));
        for _ in 0..30 {
            world.step();
        }
        assert!(world.translation(ball).y > 1.0);
        assert!(world.linvel(ball).y > 0.0);
        assert_eq!(world.body_count(), 1);
        assert_eq!(world.collider_count(), 1);
    }

    #[test]
    fn test_fixed_body_stays_put() {
        let mut world = RapierWorld::default();
        let wall = world.create_body(&BodyDesc::fixed(Vec2::new(2.0, 3.0)).rotation(0.5));
        world.attach_collider(wall, &ColliderDesc::cuboid(1.0, 0.1));
        world.step();
        assert_eq!(world.translation(wall), Vec2::new(2.0, 3.0));
        assert!((world.rotation(wall) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_set_state_round_trips() {
        let mut world = RapierWorld::default();
        let body = world.create_body(&BodyDesc::dynamic(Vec2::ZERO));
        world.attach_collider(body, &ColliderDesc::ball(0.1));
        world.set_translation(body, Vec2::new(3.0, 4.0));
        world.set_rotation(body, -0.3);
        world.set_linvel(body, Vec2::new(1.0, 0.0));
        world.set_angvel(body, 2.0);
        assert_eq!(world.translation(body), Vec2::new(3.0, 4.0));
        assert!((world.rotation(body) + 0.3).abs() < 1e-5);
        assert_eq!(world.linvel(body), Vec2::new(1.0, 0.0));
        assert_eq!(world.angvel(body), 2.0);
    }
}
