//! Game configuration
//!
//! Built once and handed to [`crate::sim::GameState::new`]; never mutated
//! afterwards. Loadable from JSON with any field omitted falling back to
//! [`crate::consts`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Inclusive integer range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub min: u32,
    pub max: u32,
}

impl Span {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Session parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// RNG seed for row generation and nudges
    pub seed: u64,

    // === Balls ===
    pub ball_count: u32,
    pub ball_radius: f32,
    /// Damage dealt per hit
    pub ball_strength: u32,
    /// Launch speed (pixels/s)
    pub fire_speed: f32,
    /// Re-fire each preloaded ball with the previous velocity
    pub auto_fire: bool,

    // === Shape rows ===
    /// Columns on even-parity levels
    pub cols_even: u32,
    /// Columns on odd-parity levels
    pub cols_odd: u32,
    /// Side count range; 2 spawns a circle
    pub shape_sides: Span,
    /// Starting lives range
    pub strength_range: Span,
    /// Overrides `strength_range` when set (deterministic tests)
    pub fixed_strength: Option<u32>,
    /// Radius indexed by `sides - 2`
    pub shape_radius: [f32; 4],
    pub initial_rows: u32,
    pub initial_level_bonus: u32,

    // === Arena ===
    pub width: f32,
    pub height: f32,
    pub side_width: f32,
    pub wall_width: f32,
    pub wall_top: f32,
    pub wall_bottom: f32,
    pub slide_height: f32,
    pub slide_opening: f32,

    // === Timing (seconds) ===
    pub load_duration: f32,
    pub raise_duration: f32,
    pub return_duration: f32,

    // === Stall nudge (pixels/s) ===
    pub nudge_threshold: f32,
    pub nudge_min: f32,
    pub nudge_max: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed,

            ball_count: BALL_COUNT,
            ball_radius: BALL_RADIUS,
            ball_strength: BALL_STRENGTH,
            fire_speed: BALL_FIRE_SPEED,
            auto_fire: false,

            cols_even: COLS_EVEN,
            cols_odd: COLS_ODD,
            shape_sides: Span::new(SHAPE_SIDES_MIN, SHAPE_SIDES_MAX),
            strength_range: Span::new(STRENGTH_MIN, STRENGTH_MAX),
            fixed_strength: None,
            shape_radius: SHAPE_RADIUS,
            initial_rows: INITIAL_ROWS,
            initial_level_bonus: INITIAL_LEVEL_BONUS,

            width: CANVAS_WIDTH,
            height: CANVAS_HEIGHT,
            side_width: SIDE_WIDTH,
            wall_width: WALL_WIDTH,
            wall_top: WALL_TOP,
            wall_bottom: WALL_BOTTOM,
            slide_height: SLIDE_HEIGHT,
            slide_opening: SLIDE_OPENING,

            load_duration: LOAD_DURATION,
            raise_duration: RAISE_DURATION,
            return_duration: RETURN_DURATION,

            nudge_threshold: NUDGE_THRESHOLD,
            nudge_min: NUDGE_MIN,
            nudge_max: NUDGE_MAX,
        }
    }
}

impl GameConfig {
    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field against its accepted range
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn check(ok: bool, field: &'static str, expected: &'static str) -> Result<(), ConfigError> {
            if ok {
                Ok(())
            } else {
                Err(ConfigError::OutOfRange { field, expected })
            }
        }

        check(self.ball_count >= 1, "ball_count", ">= 1")?;
        check(self.ball_radius >= 1.0, "ball_radius", ">= 1")?;
        check(self.ball_strength >= 1, "ball_strength", ">= 1")?;
        check(self.fire_speed > 0.0, "fire_speed", "> 0")?;
        check(self.cols_even >= 3, "cols_even", ">= 3")?;
        check(self.cols_odd >= 3, "cols_odd", ">= 3")?;
        check(
            self.shape_sides.min >= SHAPE_SIDES_MIN
                && self.shape_sides.max <= SHAPE_SIDES_MAX
                && self.shape_sides.min <= self.shape_sides.max,
            "shape_sides",
            "min <= max within [2, 5]",
        )?;
        check(
            self.strength_range.min >= 1 && self.strength_range.min <= self.strength_range.max,
            "strength_range",
            "1 <= min <= max",
        )?;
        check(
            self.fixed_strength.is_none_or(|s| s >= 1),
            "fixed_strength",
            ">= 1",
        )?;
        check(
            self.shape_radius.iter().all(|r| *r >= 1.0),
            "shape_radius",
            "every radius >= 1",
        )?;
        check(
            self.load_duration >= 0.0 && self.raise_duration >= 0.0 && self.return_duration >= 0.0,
            "durations",
            ">= 0",
        )?;
        check(
            self.nudge_threshold >= 0.0 && self.nudge_min > 0.0 && self.nudge_min <= self.nudge_max,
            "nudge",
            "threshold >= 0 and 0 < min <= max",
        )?;
        check(
            self.layout().play_width > 0.0,
            "width",
            "wider than both gutters",
        )?;
        Ok(())
    }

    /// Radius for a shape with the given side count (2 = circle)
    pub fn radius_for_sides(&self, sides: u32) -> f32 {
        let idx = sides.clamp(SHAPE_SIDES_MIN, SHAPE_SIDES_MAX) - SHAPE_SIDES_MIN;
        self.shape_radius[idx as usize]
    }

    /// Derived arena geometry
    pub fn layout(&self) -> Layout {
        let play_left = self.side_width + self.wall_width;
        let play_right = self.width - play_left;
        let play_width = play_right - play_left;
        let shooter = Vec2::new(
            self.width / 2.0,
            self.wall_top + self.slide_height + self.slide_opening / 4.0,
        );
        let bottom_y = self.height - self.wall_bottom;

        Layout {
            play_left,
            play_right,
            play_width,
            shape_spacing: play_width / self.cols_even as f32,
            shooter,
            ceiling_y: self.wall_top,
            bottom_y,
            lane_left_x: self.side_width / 2.0,
            lane_right_x: self.width - self.side_width / 2.0,
            lane_bottom_y: bottom_y + self.side_width / 2.0,
            home_left: Vec2::new(self.width / 4.0, self.wall_top),
            home_right: Vec2::new(3.0 * self.width / 4.0, self.wall_top),
        }
    }
}

/// Arena positions derived from [`GameConfig`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub play_left: f32,
    pub play_right: f32,
    pub play_width: f32,
    /// Horizontal and vertical distance between shapes
    pub shape_spacing: f32,
    /// Where a loaded ball sits
    pub shooter: Vec2,
    pub ceiling_y: f32,
    /// Balls crossing this line have fallen out of play
    pub bottom_y: f32,
    /// Return lanes in the side gutters
    pub lane_left_x: f32,
    pub lane_right_x: f32,
    pub lane_bottom_y: f32,
    /// Where returning balls come to rest
    pub home_left: Vec2,
    pub home_right: Vec2,
}

impl Layout {
    /// Centre x of the play area
    pub fn mid_x(&self) -> f32 {
        (self.play_left + self.play_right) / 2.0
    }
}
