//! Error types
//!
//! Two kinds of failure exist in the core:
//! - [`ContractViolation`]: a caller bug (illegal ball transition, advancing a
//!   level while balls are still moving). Public operations panic with it.
//! - [`ConfigError`]: a rejected [`crate::GameConfig`].
//!
//! Stale or duplicate engine events are not errors; they are logged and dropped
//! where they arrive.

use std::fmt;

use crate::sim::{BallId, BallState};

/// A broken precondition of the ball/level state machine
#[derive(Debug, Clone, PartialEq)]
pub enum ContractViolation {
    /// A ball was asked to move between two states with no legal edge.
    IllegalTransition {
        ball: BallId,
        from: BallState,
        to: BallState,
    },
    /// `next_level` was called while at least one ball was not waiting.
    LevelAdvanceWhileBusy { ball: BallId, state: BallState },
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractViolation::IllegalTransition { ball, from, to } => write!(
                f,
                "illegal transition for ball {}: {:?} -> {:?}",
                ball.0, from, to
            ),
            ContractViolation::LevelAdvanceWhileBusy { ball, state } => write!(
                f,
                "next level requested while ball {} is {:?} (all balls must be waiting)",
                ball.0, state
            ),
        }
    }
}

impl std::error::Error for ContractViolation {}

/// Rejected configuration
#[derive(Debug)]
pub enum ConfigError {
    /// The JSON document could not be parsed.
    Parse(serde_json::Error),
    /// A field is outside its accepted range.
    OutOfRange {
        /// Name of the field (for logging).
        field: &'static str,
        /// Human-readable description of the accepted range.
        expected: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(err) => write!(f, "invalid config JSON: {}", err),
            ConfigError::OutOfRange { field, expected } => {
                write!(f, "config '{}' out of range, expected {}", field, expected)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Parse(err) => Some(err),
            ConfigError::OutOfRange { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}
