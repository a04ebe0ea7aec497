//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (balls by id, shapes by spawn order)
//! - No rendering or physics engine dependencies

pub mod ball;
pub mod body;
pub mod collision;
pub mod headless;
mod level;
pub mod path;
pub mod shape;
pub mod state;
pub mod tick;

pub use ball::{Ball, BallId, BallState, Transition};
pub use body::{Body, BodyLabel, CollisionFilter, category};
pub use collision::{BodyRef, CollisionPair, DispatchSummary, Owner, PairKind, classify, dispatch};
pub use headless::HeadlessEngine;
pub use path::{FollowsPath, Path, PathFollower};
pub use shape::{Outline, Shape, ShapeHandle};
pub use state::{
    AfterLevel, BarrierId, Continuation, GameEvent, GameState, LevelBarrier, OnLoaded, Shooter,
    Snapshot,
};
pub use tick::{TickInput, tick};
