//! Fixed timestep simulation tick
//!
//! One tick applies the pointer aim, advances path tweens, routes the collision
//! batch the engine reported for this step, then fires on pointer release.

use glam::Vec2;

use super::collision::{self, CollisionPair};
use super::state::GameState;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Aim point (from mouse/touch position)
    pub pointer_move: Option<Vec2>,
    /// Fire toward the aim point (click/tap release)
    pub pointer_up: bool,
    /// Collision starts reported by the engine this step
    pub collisions: Vec<CollisionPair>,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    state.time_ticks += 1;

    if let Some(point) = input.pointer_move {
        state.set_aim(point);
    }

    state.advance_paths(dt);

    let summary = collision::dispatch(state, &input.collisions);
    if summary.unknown > 0 {
        log::trace!("{} unhandled collision pairs", summary.unknown);
    }

    if input.pointer_up {
        let velocity = state.aim_velocity();
        if velocity == Vec2::ZERO {
            log::debug!("Aim point is on the shooter, not firing");
        } else {
            state.fire(velocity);
        }
    }
}
