//! Round state and the values that flow through it
//!
//! [`GameState`] owns the ball pool and the shape arena. Deferred work is
//! expressed as [`Continuation`] values attached to paths; they are resumed on
//! the tick their path finishes.

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::ball::{Ball, BallId, BallState, Transition};
use super::path::FollowsPath;
use super::shape::{Shape, ShapeHandle};
use crate::config::{GameConfig, Layout};

/// What to do once a ball reaches the shooter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OnLoaded {
    /// Leave it loaded
    Nothing,
    /// Fire it straight away (chained multi-fire)
    Fire(Vec2),
}

/// What to do once a level advance has finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterLevel {
    Nothing,
    LoadBall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BarrierId(pub u32);

/// Deferred work resumed when a path completes
#[derive(Debug, Clone, PartialEq)]
pub enum Continuation {
    BallLoaded { ball: BallId, then: OnLoaded },
    BallReturned { ball: BallId },
    ShapeRaised { barrier: BarrierId },
}

/// Fan-in over every shape raised by one level advance
///
/// Yields its follow-up exactly once, when the last shape arrives.
#[derive(Debug, Clone)]
pub struct LevelBarrier {
    remaining: usize,
    then: Option<AfterLevel>,
}

impl LevelBarrier {
    pub fn new(count: usize, then: AfterLevel) -> Self {
        Self {
            remaining: count,
            then: Some(then),
        }
    }

    pub fn arrive(&mut self) -> Option<AfterLevel> {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.then.take()
        } else {
            None
        }
    }

    pub fn is_released(&self) -> bool {
        self.then.is_none()
    }
}

/// Notifications for the host and its engine
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    BallStateChanged {
        ball: BallId,
        from: BallState,
        to: BallState,
    },
    BallFired {
        ball: BallId,
        velocity: Vec2,
    },
    ShapeSpawned {
        shape: ShapeHandle,
        pos: Vec2,
        sides: u32,
        lives: u32,
    },
    ShapeHit {
        shape: ShapeHandle,
        impact: u32,
        lives: u32,
        color: u32,
    },
    /// Release the body and play a burst at `burst_at`
    ShapeDestroyed {
        shape: ShapeHandle,
        burst_at: Vec2,
    },
    ScoreChanged {
        score: u64,
    },
    LevelAdvanced {
        level: u32,
    },
}

/// Shooter position and the point the pointer aims at
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Shooter {
    pub pos: Vec2,
    pub aim: Vec2,
}

/// Serializable summary for logs and hosts
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub time_ticks: u64,
    pub level: u32,
    pub score: u64,
    pub shapes: usize,
    pub balls: Vec<BallState>,
}

/// Complete round state
pub struct GameState {
    config: GameConfig,
    layout: Layout,
    /// Level counter
    pub level: u32,
    /// Score (never decreases)
    pub score: u64,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Fixed ball pool, indexed by `BallId`
    pub balls: Vec<Ball>,
    pub shooter: Shooter,
    pub(crate) shapes: hecs::World,
    /// Active shapes in spawn order
    pub(crate) shape_order: Vec<ShapeHandle>,
    pub(crate) rng: Pcg32,
    pub(crate) barriers: BTreeMap<BarrierId, LevelBarrier>,
    next_barrier: u32,
    events: Vec<GameEvent>,
}

impl fmt::Debug for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameState")
            .field("level", &self.level)
            .field("score", &self.score)
            .field("time_ticks", &self.time_ticks)
            .field("balls", &self.balls)
            .field("shapes", &self.shape_order.len())
            .field("barriers", &self.barriers)
            .finish_non_exhaustive()
    }
}

impl GameState {
    /// Create the round with every ball waiting near the top
    ///
    /// Debug builds panic on a config that fails [`GameConfig::validate`].
    pub fn new(config: GameConfig) -> Self {
        debug_assert!(config.validate().is_ok(), "invalid config");
        let layout = config.layout();
        let spread = config.ball_radius * 2.5;
        let first_x = config.width / 2.0 - spread * (config.ball_count as f32 - 1.0) / 2.0;
        let balls = (0..config.ball_count as usize)
            .map(|i| {
                let pos = Vec2::new(first_x + spread * i as f32, config.wall_top);
                Ball::new(BallId(i), pos, config.ball_radius, config.ball_strength)
            })
            .collect();

        Self {
            rng: Pcg32::seed_from_u64(config.seed),
            level: 0,
            score: 0,
            time_ticks: 0,
            balls,
            shooter: Shooter {
                pos: layout.shooter,
                aim: layout.shooter + Vec2::Y,
            },
            shapes: hecs::World::new(),
            shape_order: Vec::new(),
            barriers: BTreeMap::new(),
            next_barrier: 0,
            events: Vec::new(),
            layout,
            config,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn ball(&self, id: BallId) -> Option<&Ball> {
        self.balls.get(id.0)
    }

    /// The ball currently sitting in the shooter
    pub fn loaded_ball(&self) -> Option<BallId> {
        self.balls
            .iter()
            .find(|b| b.state() == BallState::Loaded)
            .map(|b| b.id)
    }

    /// Look up a shape; `None` once it has been destroyed
    pub fn shape(&self, handle: ShapeHandle) -> Option<hecs::Ref<'_, Shape>> {
        self.shapes.get::<&Shape>(handle.0).ok()
    }

    /// Active shapes in spawn order
    pub fn shape_handles(&self) -> &[ShapeHandle] {
        &self.shape_order
    }

    pub fn shape_count(&self) -> usize {
        self.shape_order.len()
    }

    /// Take every event raised since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            time_ticks: self.time_ticks,
            level: self.level,
            score: self.score,
            shapes: self.shape_order.len(),
            balls: self.balls.iter().map(|b| b.state()).collect(),
        }
    }

    /// Point the shooter at `target` (pointer move)
    pub fn set_aim(&mut self, target: Vec2) {
        self.shooter.aim = target;
    }

    /// Launch velocity toward the current aim point
    pub fn aim_velocity(&self) -> Vec2 {
        (self.shooter.aim - self.shooter.pos).normalize_or_zero() * self.config.fire_speed
    }

    /// Copy the engine's integrated position and velocity onto a ball
    ///
    /// Ignored for static balls: their position belongs to the path follower.
    pub fn sync_ball(&mut self, id: BallId, pos: Vec2, vel: Vec2) -> bool {
        match self.balls.get_mut(id.0) {
            Some(ball) if !ball.body.is_static => {
                ball.body.pos = pos;
                ball.body.vel = vel;
                true
            }
            _ => false,
        }
    }

    /// Transition a ball and report the change
    pub(crate) fn set_ball_state(&mut self, id: BallId, to: BallState) {
        let ball = &mut self.balls[id.0];
        if let Transition::Changed { from, to } = ball.transition(to) {
            log::debug!("Ball {} {:?} -> {:?}", id.0, from, to);
            self.emit(GameEvent::BallStateChanged { ball: id, from, to });
        }
    }

    pub(crate) fn open_barrier(&mut self, count: usize, then: AfterLevel) -> BarrierId {
        let id = BarrierId(self.next_barrier);
        self.next_barrier += 1;
        self.barriers.insert(id, LevelBarrier::new(count, then));
        id
    }

    /// Advance every path tween and resume whatever finished
    ///
    /// Balls resume before shapes, each in their stable order.
    pub fn advance_paths(&mut self, dt: f32) {
        let mut completed = Vec::new();
        for ball in &mut self.balls {
            let (body, follower) = ball.path_parts();
            follower.advance(body, dt, &mut completed);
        }
        for handle in &self.shape_order {
            if let Ok(shape) = self.shapes.query_one_mut::<&mut Shape>(handle.0) {
                let (body, follower) = shape.path_parts();
                follower.advance(body, dt, &mut completed);
            }
        }
        for continuation in completed {
            self.resume(continuation);
        }
    }
}
