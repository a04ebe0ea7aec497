//! Ball entity and its lifecycle state machine
//!
//! ```text
//! Waiting -> Loaded -> InPlay -> MovingToWaiting -> Waiting
//! ```
//!
//! Every transition reconfigures the collision filter and motion mode so that
//! waiting balls never touch in-play obstacles and vice versa.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::{Body, CollisionFilter, category};
use super::path::{FollowsPath, PathFollower};
use crate::error::ContractViolation;
use crate::geom::Positioned;

/// Index into the fixed ball pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BallId(pub usize);

/// Lifecycle of a ball
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BallState {
    /// Resting, ready to be loaded
    Waiting,
    /// Sitting in the shooter, ready to fire
    Loaded,
    /// Bouncing around the play field
    InPlay,
    /// Riding the return path back to the top
    MovingToWaiting,
}

impl BallState {
    /// Whether `self -> to` is one of the four legal edges
    pub fn can_transition_to(self, to: BallState) -> bool {
        use BallState::*;
        match (self, to) {
            (Waiting, Loaded) | (Loaded, InPlay) => true,
            (InPlay, MovingToWaiting) | (MovingToWaiting, Waiting) => true,
            _ => false,
        }
    }

    /// Collision filter a ball carries in this state
    pub fn filter(self) -> CollisionFilter {
        use category::*;
        match self {
            BallState::Waiting | BallState::Loaded => {
                CollisionFilter::new(BALL_WAITING, BALL_WAITING | GAME_OBJECT)
            }
            BallState::InPlay => CollisionFilter::new(BALL_INPLAY, GAME_OBJECT),
            BallState::MovingToWaiting => CollisionFilter::new(BALL_WAITING, NONE),
        }
    }

    /// Only in-play balls are integrated by the engine
    pub fn is_static(self) -> bool {
        !matches!(self, BallState::InPlay)
    }
}

/// Outcome of a successful transition request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Changed { from: BallState, to: BallState },
    /// Requested the current state; nothing happened
    Unchanged,
}

/// A ball from the fixed pool
#[derive(Debug, Clone)]
pub struct Ball {
    pub id: BallId,
    pub body: Body,
    pub radius: f32,
    /// Damage dealt per hit (>= 1)
    pub strength: u32,
    state: BallState,
    follower: PathFollower,
}

impl Ball {
    pub fn new(id: BallId, pos: Vec2, radius: f32, strength: u32) -> Self {
        assert!(strength >= 1, "ball strength must be >= 1");
        let state = BallState::Waiting;
        Self {
            id,
            body: Body::new(pos, state.is_static(), state.filter()),
            radius,
            strength,
            state,
            follower: PathFollower::default(),
        }
    }

    pub fn state(&self) -> BallState {
        self.state
    }

    /// Move to `to`, reconfiguring filter and motion mode
    ///
    /// Requesting the current state is a logged no-op. Anything outside the
    /// legal edges is refused with [`ContractViolation::IllegalTransition`].
    pub fn try_transition(&mut self, to: BallState) -> Result<Transition, ContractViolation> {
        let from = self.state;
        if from == to {
            log::warn!("Reset to same state: {}", self.debug_string());
            return Ok(Transition::Unchanged);
        }
        if !from.can_transition_to(to) {
            return Err(ContractViolation::IllegalTransition {
                ball: self.id,
                from,
                to,
            });
        }

        self.body.filter = to.filter();
        if self.follower.is_following() {
            self.follower.set_resume_static(to.is_static());
        } else {
            self.body.is_static = to.is_static();
        }
        self.state = to;
        Ok(Transition::Changed { from, to })
    }

    /// Like [`Ball::try_transition`] but treats an illegal edge as fatal
    pub fn transition(&mut self, to: BallState) -> Transition {
        match self.try_transition(to) {
            Ok(t) => t,
            Err(err) => panic!("{}", err),
        }
    }

    pub fn debug_string(&self) -> String {
        format!(
            "Ball(id: {} x: {:.1}, y: {:.1}, state: {:?})",
            self.id.0, self.body.pos.x, self.body.pos.y, self.state
        )
    }
}

impl Positioned for Ball {
    fn position(&self) -> Vec2 {
        self.body.pos
    }
}

impl FollowsPath for Ball {
    fn path_parts(&mut self) -> (&mut Body, &mut PathFollower) {
        (&mut self.body, &mut self.follower)
    }

    fn follower(&self) -> &PathFollower {
        &self.follower
    }
}
