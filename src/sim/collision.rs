//! Collision-start dispatch
//!
//! The engine reports pairs of touching bodies in arbitrary order. Each pair
//! is normalised by label, classified, and routed to the controller. A pair
//! nobody handles is logged and skipped; it never aborts the rest of the batch.

use glam::Vec2;

use super::ball::BallId;
use super::body::BodyLabel;
use super::shape::ShapeHandle;
use super::state::GameState;

/// Entity behind a reported body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Owner {
    Ball(BallId),
    Shape(ShapeHandle),
    /// Walls, slides, ceiling, shooter box
    Scenery,
}

/// One side of a collision report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyRef {
    pub label: BodyLabel,
    pub owner: Owner,
}

impl BodyRef {
    pub fn ball(id: BallId) -> Self {
        Self {
            label: BodyLabel::Ball,
            owner: Owner::Ball(id),
        }
    }

    pub fn shape(handle: ShapeHandle) -> Self {
        Self {
            label: BodyLabel::Shape,
            owner: Owner::Shape(handle),
        }
    }

    pub fn scenery(label: BodyLabel) -> Self {
        Self {
            label,
            owner: Owner::Scenery,
        }
    }
}

/// Two bodies that started touching this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionPair {
    pub a: BodyRef,
    pub b: BodyRef,
}

impl CollisionPair {
    pub fn new(a: BodyRef, b: BodyRef) -> Self {
        Self { a, b }
    }

    /// Both sides, lower label first
    pub fn normalized(&self) -> (BodyRef, BodyRef) {
        if self.b.label < self.a.label {
            (self.b, self.a)
        } else {
            (self.a, self.b)
        }
    }
}

/// What a pair means to the game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairKind {
    BallShape { ball: BallId, shape: ShapeHandle },
    BallFell { ball: BallId },
    /// Known pairing with no game effect
    Ignored,
    Unknown,
}

pub fn classify(pair: &CollisionPair) -> PairKind {
    let (first, second) = pair.normalized();
    match (first.label, second.label) {
        (BodyLabel::Ball, BodyLabel::Shape) => match (first.owner, second.owner) {
            (Owner::Ball(ball), Owner::Shape(shape)) => PairKind::BallShape { ball, shape },
            _ => PairKind::Unknown,
        },
        (BodyLabel::Ball, BodyLabel::WallBottom) => match first.owner {
            Owner::Ball(ball) => PairKind::BallFell { ball },
            _ => PairKind::Unknown,
        },
        (
            BodyLabel::Ball,
            BodyLabel::Ball
            | BodyLabel::Ceiling
            | BodyLabel::Shooter
            | BodyLabel::Slide
            | BodyLabel::Wall,
        ) => PairKind::Ignored,
        _ => PairKind::Unknown,
    }
}

/// Tally of one dispatched batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub hits: usize,
    pub falls: usize,
    pub ignored: usize,
    pub unknown: usize,
}

/// Route a batch of collision starts, in report order
pub fn dispatch(state: &mut GameState, pairs: &[CollisionPair]) -> DispatchSummary {
    let mut summary = DispatchSummary::default();
    for pair in pairs {
        match classify(pair) {
            PairKind::BallShape { ball, shape } => {
                state.shape_hit(shape, ball);
                summary.hits += 1;
            }
            PairKind::BallFell { ball } => {
                state.ball_fell(ball);
                summary.falls += 1;
            }
            PairKind::Ignored => summary.ignored += 1,
            PairKind::Unknown => {
                let (a, b) = pair.normalized();
                log::debug!("unknown collisionstart {:?} {:?}", a.label, b.label);
                summary.unknown += 1;
            }
        }
    }
    summary
}

/// Reflect velocity off a surface with the given unit normal
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}
