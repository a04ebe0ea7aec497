//! Engine-facing body data
//!
//! The physics engine owns the real rigid bodies. Each entity in the core keeps
//! the settings the engine must mirror: position, velocity, static flag and
//! collision filter.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Collision category bits
pub mod category {
    /// Walls, the bottom boundary, the ceiling and shapes
    pub const GAME_OBJECT: u32 = 0b001;
    /// Balls resting, loading or returning, plus the slides and shooter box
    pub const BALL_WAITING: u32 = 0b010;
    /// Balls bouncing around the play field
    pub const BALL_INPLAY: u32 = 0b100;
    pub const NONE: u32 = 0;
}

/// Category/mask pair: two bodies touch only if each one's mask includes the
/// other's category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionFilter {
    pub category: u32,
    pub mask: u32,
}

impl CollisionFilter {
    pub const fn new(category: u32, mask: u32) -> Self {
        Self { category, mask }
    }

    pub fn collides_with(&self, other: &CollisionFilter) -> bool {
        (self.mask & other.category) != 0 && (other.mask & self.category) != 0
    }
}

/// Label attached to every body the engine reports in a collision
///
/// The derived order is the total order the collision dispatcher normalises
/// pairs by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BodyLabel {
    Ball,
    Ceiling,
    Shape,
    Shooter,
    Slide,
    Wall,
    WallBottom,
}

impl BodyLabel {
    /// Fixed filter for non-ball bodies
    ///
    /// Ball filters depend on the ball's state; see [`super::BallState::filter`].
    pub fn scenery_filter(self) -> Option<CollisionFilter> {
        use category::*;
        match self {
            BodyLabel::Ball => None,
            BodyLabel::Shape | BodyLabel::Ceiling => {
                Some(CollisionFilter::new(GAME_OBJECT, BALL_INPLAY))
            }
            BodyLabel::Wall | BodyLabel::WallBottom => {
                let balls = BALL_INPLAY | BALL_WAITING;
                Some(CollisionFilter::new(GAME_OBJECT, balls))
            }
            BodyLabel::Slide | BodyLabel::Shooter => {
                Some(CollisionFilter::new(BALL_WAITING, BALL_WAITING))
            }
        }
    }
}

/// Physics settings of one entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Static bodies are ignored by the engine's integrator
    pub is_static: bool,
    pub filter: CollisionFilter,
}

impl Body {
    pub fn new(pos: Vec2, is_static: bool, filter: CollisionFilter) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            is_static,
            filter,
        }
    }
}
