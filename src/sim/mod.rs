//! Deterministic play simulation
//!
//! Everything between a `Level` and a render-ready `Snapshot` lives here.
//! This module must stay free of rendering and platform dependencies:
//! - Fixed timestep only
//! - Seeded RNG only (launch jitter)
//! - Stable iteration order (level order per element kind)
//! - Physics behind the `PhysicsBackend` trait

pub mod backend;
pub mod builder;
pub mod flipper;
pub mod hits;
pub mod kinematic;
pub mod rapier;
pub mod scoring;
pub mod state;
pub mod tick;

pub use backend::{BodyDesc, BodyHandle, BodyKind, ColliderDesc, PhysicsBackend, Shape};
pub use builder::{BuildStats, BumperBody, FlipperRig, KindCount, TableBodies, build_table};
pub use flipper::{FLIP_SPEED, FlipperController, FlipperLimits};
pub use hits::{BallSample, HitRule, TargetKind, detect_hit, hits_among};
pub use kinematic::KinematicWorld;
pub use rapier::RapierWorld;
pub use scoring::{JACKPOT_DURATION_TICKS, ScoreEvent, Scoreboard, TargetBank, TickHits};
pub use state::{ElementPose, FlipperPose, GamePhase, Pose, SessionState, Snapshot};
pub use tick::{FrameClock, PlaySession, SessionOptions, TickInput};
