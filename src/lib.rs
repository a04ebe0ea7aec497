//! Ball Breaker - A single-screen arcade ball breaker
//!
//! Core modules:
//! - `sim`: Ball lifecycle, level progression and collision routing
//! - `geom`: Nearest-point search and polygon helpers
//! - `config`: Immutable game configuration and derived layout
//! - `error`: Contract violation and configuration errors
//!
//! Rigid-body physics and rendering belong to the host engine. The core owns
//! the state machine and tells the engine what to do through body data and
//! [`sim::GameEvent`]s.

pub mod config;
pub mod error;
pub mod geom;
pub mod sim;

pub use config::{GameConfig, Layout};
pub use error::{ConfigError, ContractViolation};

/// Default tunables (scaled for a 1080x1920 canvas)
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Canvas dimensions
    pub const CANVAS_WIDTH: f32 = 1080.0;
    pub const CANVAS_HEIGHT: f32 = 1920.0;

    /// Scaling applied to every layout constant below
    const SCALE: f32 = 0.75;

    /// Width of the side gutters (return lanes)
    pub const SIDE_WIDTH: f32 = 94.0 * SCALE;
    /// Distance from the top of the screen to the walls
    pub const WALL_TOP: f32 = 130.0 * SCALE;
    /// Distance from the bottom of the screen to the bottom wall
    pub const WALL_BOTTOM: f32 = 230.0 * SCALE;
    pub const WALL_WIDTH: f32 = 6.0 * SCALE;

    pub const SLIDE_HEIGHT: f32 = 240.0 * SCALE;
    pub const SLIDE_OPENING: f32 = 94.0 * SCALE;

    /// Ball defaults
    pub const BALL_COUNT: u32 = 3;
    pub const BALL_RADIUS: f32 = 24.0 * SCALE;
    pub const BALL_STRENGTH: u32 = 1;
    /// Launch speed (pixels/s)
    pub const BALL_FIRE_SPEED: f32 = 40.0 * SCALE * 60.0;

    /// Shape rows
    pub const COLS_EVEN: u32 = 6;
    pub const COLS_ODD: u32 = 5;
    pub const SHAPE_SIDES_MIN: u32 = 2;
    pub const SHAPE_SIDES_MAX: u32 = 5;
    pub const STRENGTH_MIN: u32 = 1;
    pub const STRENGTH_MAX: u32 = 3;
    /// Shape radius indexed by `sides - 2` (circle, triangle, square, pentagon)
    pub const SHAPE_RADIUS: [f32; 4] = [72.0 * SCALE, 90.0 * SCALE, 90.0 * SCALE, 80.0 * SCALE];

    /// Rows placed when a round starts, and the level bonus applied after them
    pub const INITIAL_ROWS: u32 = 3;
    pub const INITIAL_LEVEL_BONUS: u32 = 4;

    /// Path durations (seconds)
    pub const LOAD_DURATION: f32 = 0.2;
    pub const RAISE_DURATION: f32 = 0.2;
    pub const RETURN_DURATION: f32 = 1.0;

    /// Horizontal speed below which a ball gets nudged sideways on a hit
    pub const NUDGE_THRESHOLD: f32 = 60.0;
    pub const NUDGE_MIN: f32 = 60.0;
    pub const NUDGE_MAX: f32 = 120.0;
}
