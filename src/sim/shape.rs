//! Destructible shapes
//!
//! A shape is a circle or a regular polygon with a life counter. Each hit
//! removes up to the ball's strength in lives; at zero the controller removes
//! it from the arena.

use glam::Vec2;
use serde::{Serialize, Serializer};

use super::ball::Ball;
use super::body::{Body, BodyLabel, CollisionFilter};
use super::path::{FollowsPath, PathFollower};
use crate::geom::{self, Positioned};

/// Generation-tagged reference to a shape in the arena
///
/// A handle to a destroyed shape never resolves again, even after its slot
/// is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeHandle(pub hecs::Entity);

impl Serialize for ShapeHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0.to_bits().get())
    }
}

/// Collision outline relative to the shape's position
#[derive(Debug, Clone, PartialEq)]
pub enum Outline {
    Circle { radius: f32 },
    Polygon { points: Vec<Vec2> },
}

/// A target shape
#[derive(Debug, Clone)]
pub struct Shape {
    pub body: Body,
    pub outline: Outline,
    pub rotation: f32,
    /// Bounding radius
    pub radius: f32,
    lives: u32,
    follower: PathFollower,
}

impl Shape {
    /// Build a shape; `sides == 2` gives a circle
    pub fn new(pos: Vec2, sides: u32, rotation: f32, lives: u32, radius: f32) -> Self {
        let outline = if sides <= 2 {
            Outline::Circle { radius }
        } else {
            let rot = Vec2::from_angle(rotation);
            let mut points: Vec<Vec2> = geom::regular_polygon_points(sides, radius)
                .into_iter()
                .map(|p| rot.rotate(p))
                .collect();
            // Keep the body position on the centre of mass
            if let Some(c) = geom::centroid(&points) {
                for p in &mut points {
                    *p -= c;
                }
            }
            Outline::Polygon { points }
        };

        let filter = BodyLabel::Shape
            .scenery_filter()
            .unwrap_or(CollisionFilter::new(0, 0));

        Self {
            body: Body::new(pos, true, filter),
            outline,
            rotation,
            radius,
            lives,
            follower: PathFollower::default(),
        }
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn is_destroyed(&self) -> bool {
        self.lives == 0
    }

    /// Side count, 2 for a circle
    pub fn sides(&self) -> u32 {
        match &self.outline {
            Outline::Circle { .. } => 2,
            Outline::Polygon { points } => points.len() as u32,
        }
    }

    /// Take a hit from `ball`, returning the lives removed
    pub fn hit(&mut self, ball: &Ball) -> u32 {
        let impact = ball.strength.min(self.lives);
        self.lives -= impact;
        impact
    }

    /// Display colour (0xRRGGBB) for the current lives
    pub fn color(&self) -> u32 {
        life_color(self.lives)
    }

    /// Outline vertices in world space (circle: its bounding square)
    pub fn world_points(&self) -> Vec<Vec2> {
        let pos = self.body.pos;
        match &self.outline {
            Outline::Circle { radius } => vec![
                pos - Vec2::splat(*radius),
                pos + Vec2::splat(*radius),
            ],
            Outline::Polygon { points } => points.iter().map(|p| *p + pos).collect(),
        }
    }

    /// Centre of the bounding box, where the destruction burst spawns
    pub fn burst_center(&self) -> Vec2 {
        geom::bounding_box(&self.world_points())
            .map(|(lo, hi)| (lo + hi) * 0.5)
            .unwrap_or(self.body.pos)
    }
}

/// HSV colour wheel: 30 degrees of hue per life, black when dead
pub fn life_color(lives: u32) -> u32 {
    if lives == 0 {
        return 0x000000;
    }
    let hue = ((lives - 1) * 30 % 360) as f32;
    hsv_to_rgb(hue, 1.0, 1.0)
}

fn hsv_to_rgb(hue: f32, s: f32, v: f32) -> u32 {
    let c = v * s;
    let h = hue / 60.0;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = v - c;
    let to_byte = |f: f32| ((f + m) * 255.0).round() as u32;
    (to_byte(r) << 16) | (to_byte(g) << 8) | to_byte(b)
}

impl Positioned for Shape {
    fn position(&self) -> Vec2 {
        self.body.pos
    }
}

impl FollowsPath for Shape {
    fn path_parts(&mut self) -> (&mut Body, &mut PathFollower) {
        (&mut self.body, &mut self.follower)
    }

    fn follower(&self) -> &PathFollower {
        &self.follower
    }
}
