//! Physics backend capability interface
//!
//! The play loop never talks to a solver directly. It creates bodies and
//! colliders, joins flippers with revolute joints, steps the world and
//! reads transforms back through this trait. All values are in physics
//! units (metres, radians, seconds).

use glam::Vec2;

/// Opaque handle to a body owned by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub(crate) u32);

impl BodyHandle {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Whether a body is integrated by the solver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Fixed,
    Dynamic,
}

/// Rigid body description
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub translation: Vec2,
    pub rotation: f32,
    pub ccd: bool,
    pub can_sleep: bool,
    pub linear_damping: f32,
    pub angular_damping: f32,
}

impl BodyDesc {
    pub fn fixed(translation: Vec2) -> Self {
        Self {
            kind: BodyKind::Fixed,
            translation,
            rotation: 0.0,
            ccd: false,
            can_sleep: true,
            linear_damping: 0.0,
            angular_damping: 0.0,
        }
    }

    pub fn dynamic(translation: Vec2) -> Self {
        Self {
            kind: BodyKind::Dynamic,
            ..Self::fixed(translation)
        }
    }

    pub fn rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn ccd(mut self, enabled: bool) -> Self {
        self.ccd = enabled;
        self
    }

    pub fn can_sleep(mut self, can_sleep: bool) -> Self {
        self.can_sleep = can_sleep;
        self
    }

    pub fn linear_damping(mut self, damping: f32) -> Self {
        self.linear_damping = damping;
        self
    }

    pub fn angular_damping(mut self, damping: f32) -> Self {
        self.angular_damping = damping;
        self
    }
}

/// Collider geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Cuboid { half_extents: Vec2 },
    Ball { radius: f32 },
}

/// Collider description, positioned relative to its parent body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColliderDesc {
    pub shape: Shape,
    pub offset: Vec2,
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
}

impl ColliderDesc {
    pub fn cuboid(hx: f32, hy: f32) -> Self {
        Self::with_shape(Shape::Cuboid {
            half_extents: Vec2::new(hx, hy),
        })
    }

    pub fn ball(radius: f32) -> Self {
        Self::with_shape(Shape::Ball { radius })
    }

    fn with_shape(shape: Shape) -> Self {
        Self {
            shape,
            offset: Vec2::ZERO,
            restitution: 0.0,
            friction: 0.5,
            density: 1.0,
        }
    }

    pub fn offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }
}

/// Minimal simulation backend the play loop depends on
pub trait PhysicsBackend {
    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle;
    fn attach_collider(&mut self, body: BodyHandle, desc: &ColliderDesc);
    /// Hinge `body` to `anchor`; anchors are in each body's local frame
    fn create_revolute_joint(
        &mut self,
        anchor: BodyHandle,
        body: BodyHandle,
        local_anchor_a: Vec2,
        local_anchor_b: Vec2,
    );

    /// Advance one fixed timestep
    fn step(&mut self);

    fn translation(&self, body: BodyHandle) -> Vec2;
    fn rotation(&self, body: BodyHandle) -> f32;
    fn linvel(&self, body: BodyHandle) -> Vec2;
    fn angvel(&self, body: BodyHandle) -> f32;

    fn set_translation(&mut self, body: BodyHandle, translation: Vec2);
    fn set_rotation(&mut self, body: BodyHandle, rotation: f32);
    fn set_linvel(&mut self, body: BodyHandle, linvel: Vec2);
    fn set_angvel(&mut self, body: BodyHandle, angvel: f32);
    fn apply_impulse(&mut self, body: BodyHandle, impulse: Vec2);

    fn body_count(&self) -> usize;
    fn collider_count(&self) -> usize;
    fn joint_count(&self) -> usize;
}
