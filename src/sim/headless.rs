//! Minimal stand-in physics engine
//!
//! Integrates in-play balls under gravity, bounces them off the side walls,
//! ceiling and shapes (shapes are treated as circles of their bounding radius),
//! and reports collision starts the way a real engine would. Good enough to
//! drive full sessions in the binary and in tests.

use std::collections::HashSet;

use glam::Vec2;

use super::ball::BallId;
use super::body::{BodyLabel, CollisionFilter};
use super::collision::{BodyRef, CollisionPair, reflect_velocity};
use super::shape::ShapeHandle;
use super::state::GameState;

/// Gravity in px/s^2, positive y is down
pub const GRAVITY: f32 = 900.0;
/// Energy kept after a bounce
pub const RESTITUTION: f32 = 0.8;

#[derive(Debug, Clone)]
pub struct HeadlessEngine {
    pub gravity: f32,
    pub restitution: f32,
    /// Ball/shape pairs currently touching
    contacts: HashSet<(BallId, ShapeHandle)>,
    /// Balls currently touching the bottom boundary
    grounded: HashSet<BallId>,
}

impl Default for HeadlessEngine {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            restitution: RESTITUTION,
            contacts: HashSet::new(),
            grounded: HashSet::new(),
        }
    }
}

impl HeadlessEngine {
    /// Step every dynamic ball by `dt` and return the collision starts
    pub fn step(&mut self, state: &mut GameState, dt: f32) -> Vec<CollisionPair> {
        let layout = *state.layout();
        let wall = scenery_filter(BodyLabel::Wall);
        let ceiling = scenery_filter(BodyLabel::Ceiling);
        let floor = scenery_filter(BodyLabel::WallBottom);

        let shapes: Vec<(ShapeHandle, Vec2, f32, CollisionFilter)> = state
            .shape_handles()
            .iter()
            .filter_map(|h| {
                state
                    .shape(*h)
                    .map(|s| (*h, s.body.pos, s.radius, s.body.filter))
            })
            .collect();
        self.contacts
            .retain(|(_, h)| shapes.iter().any(|(live, ..)| live == h));

        let mut pairs = Vec::new();
        for ball in &mut state.balls {
            let id = ball.id;
            if ball.body.is_static {
                self.grounded.remove(&id);
                self.contacts.retain(|(b, _)| *b != id);
                continue;
            }

            let r = ball.radius;
            let body = &mut ball.body;
            body.vel.y += self.gravity * dt;
            body.pos += body.vel * dt;

            if body.filter.collides_with(&wall) {
                if body.pos.x - r < layout.play_left {
                    body.pos.x = layout.play_left + r;
                    body.vel.x = body.vel.x.abs() * self.restitution;
                    pairs.push(scenery_pair(BodyLabel::Wall, id));
                } else if body.pos.x + r > layout.play_right {
                    body.pos.x = layout.play_right - r;
                    body.vel.x = -body.vel.x.abs() * self.restitution;
                    pairs.push(scenery_pair(BodyLabel::Wall, id));
                }
            }

            if body.filter.collides_with(&ceiling) && body.pos.y - r < layout.ceiling_y {
                body.pos.y = layout.ceiling_y + r;
                body.vel.y = body.vel.y.abs() * self.restitution;
                pairs.push(scenery_pair(BodyLabel::Ceiling, id));
            }

            for (handle, center, radius, filter) in &shapes {
                let key = (id, *handle);
                let offset = body.pos - *center;
                let touching = body.filter.collides_with(filter) && offset.length() < r + *radius;
                if !touching {
                    self.contacts.remove(&key);
                    continue;
                }
                if !self.contacts.insert(key) {
                    continue;
                }

                let mut normal = offset.normalize_or_zero();
                if normal == Vec2::ZERO {
                    normal = Vec2::NEG_Y;
                }
                if body.vel.dot(normal) < 0.0 {
                    body.vel = reflect_velocity(body.vel, normal) * self.restitution;
                }
                body.pos = *center + normal * (r + *radius);
                let hit = CollisionPair::new(BodyRef::ball(id), BodyRef::shape(*handle));
                pairs.push(hit);
            }

            let on_floor = body.filter.collides_with(&floor) && body.pos.y + r >= layout.bottom_y;
            if on_floor {
                if self.grounded.insert(id) {
                    // Reported floor-first, the dispatcher sorts it out
                    pairs.push(CollisionPair::new(
                        BodyRef::scenery(BodyLabel::WallBottom),
                        BodyRef::ball(id),
                    ));
                }
                body.pos.y = layout.bottom_y - r;
                body.vel = Vec2::ZERO;
            } else {
                self.grounded.remove(&id);
            }
        }
        pairs
    }
}

fn scenery_filter(label: BodyLabel) -> CollisionFilter {
    label.scenery_filter().unwrap_or(CollisionFilter::new(0, 0))
}

fn scenery_pair(label: BodyLabel, id: BallId) -> CollisionPair {
    CollisionPair::new(BodyRef::ball(id), BodyRef::scenery(label))
}
