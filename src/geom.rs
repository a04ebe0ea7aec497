//! Geometry helpers
//!
//! Pure functions over points in screen space (y grows downward).

use glam::Vec2;
use std::f32::consts::{PI, TAU};

/// Anything with a position that [`find_nearest`] can rank
pub trait Positioned {
    fn position(&self) -> Vec2;
}

impl Positioned for Vec2 {
    fn position(&self) -> Vec2 {
        *self
    }
}

/// Squared Euclidean distance between (x1, y1) and (x2, y2)
#[inline]
pub fn distance_squared(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let dx = x2 - x1;
    let dy = y2 - y1;
    dx * dx + dy * dy
}

/// Returns the item nearest to (x, y)
///
/// Ties go to the first item in iteration order. Returns `None` for an empty
/// input.
pub fn find_nearest<'a, T, I>(items: I, x: f32, y: f32) -> Option<&'a T>
where
    T: Positioned + ?Sized + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut best: Option<(&'a T, f32)> = None;
    for item in items {
        let p = item.position();
        let d = distance_squared(x, y, p.x, p.y);
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((item, d)),
        }
    }
    best.map(|(item, _)| item)
}

/// Corners of a regular polygon centred on the origin
///
/// Vertex `i` sits at angle `π/sides + i·2π/sides` from the vertical axis, so
/// the shapes come out point-up.
pub fn regular_polygon_points(sides: u32, radius: f32) -> Vec<Vec2> {
    assert!(sides >= 3, "polygon needs at least 3 sides, got {}", sides);
    assert!(radius >= 1.0, "polygon radius must be >= 1, got {}", radius);

    let step = TAU / sides as f32;
    let offset = PI / sides as f32;
    (0..sides)
        .map(|i| {
            let angle = offset + i as f32 * step;
            Vec2::new(angle.sin() * radius, angle.cos() * radius)
        })
        .collect()
}

/// Signed area of a simple polygon (positive when counter-clockwise in y-up space)
pub fn signed_area(points: &[Vec2]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for (i, p1) in points.iter().enumerate() {
        let p2 = points[(i + 1) % points.len()];
        sum += p1.perp_dot(p2);
    }
    sum * 0.5
}

/// Centroid of a simple, non-self-intersecting polygon
///
/// Returns `None` for degenerate (zero-area) input instead of dividing by zero.
pub fn centroid(points: &[Vec2]) -> Option<Vec2> {
    let area = signed_area(points);
    if area.abs() <= f32::EPSILON {
        return None;
    }

    let mut c = Vec2::ZERO;
    for (i, p1) in points.iter().enumerate() {
        let p2 = points[(i + 1) % points.len()];
        let factor = p1.perp_dot(p2);
        c += (*p1 + p2) * factor;
    }
    Some(c / (6.0 * area))
}

/// Axis-aligned bounds as (min, max)
pub fn bounding_box(points: &[Vec2]) -> Option<(Vec2, Vec2)> {
    let first = *points.first()?;
    Some(
        points
            .iter()
            .fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p))),
    )
}
