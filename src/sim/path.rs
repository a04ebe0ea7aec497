//! Timed path following
//!
//! A [`Path`] is a polyline sampled by arc length. A [`PathFollower`] is the
//! capability any entity can embed to be moved along paths: while at least one
//! path is active the body is held static so the path fully controls its
//! position, and the pre-path static flag comes back once the outermost path
//! finishes. Paths always run to completion; there is no cancel.

use glam::Vec2;

use super::body::Body;
use super::state::Continuation;

/// Polyline of absolute waypoints
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    points: Vec<Vec2>,
}

impl Path {
    pub fn new(start: Vec2) -> Self {
        Self {
            points: vec![start],
        }
    }

    pub fn line_to(mut self, point: Vec2) -> Self {
        self.points.push(point);
        self
    }

    pub fn start(&self) -> Vec2 {
        self.points[0]
    }

    pub fn end(&self) -> Vec2 {
        self.points[self.points.len() - 1]
    }

    pub fn waypoints(&self) -> &[Vec2] {
        &self.points
    }

    /// Total polyline length
    pub fn length(&self) -> f32 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    /// Point at fraction `t` (0..=1) of the total length
    pub fn point_at(&self, t: f32) -> Vec2 {
        let t = t.clamp(0.0, 1.0);
        let total = self.length();
        if total <= f32::EPSILON {
            return self.end();
        }

        let mut remaining = t * total;
        for w in self.points.windows(2) {
            let seg = w[0].distance(w[1]);
            if remaining <= seg {
                return if seg > 0.0 {
                    w[0].lerp(w[1], remaining / seg)
                } else {
                    w[1]
                };
            }
            remaining -= seg;
        }
        self.end()
    }
}

#[derive(Debug, Clone)]
struct ActivePath<C> {
    path: Path,
    duration: f32,
    elapsed: f32,
    on_start: Option<C>,
    on_complete: Option<C>,
}

impl<C> ActivePath<C> {
    fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        }
    }

    fn finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// Follows any number of overlapping paths
///
/// The most recently started path drives the position. Start values are handed
/// back on the first advance; completion values exactly once, in start order.
#[derive(Debug, Clone)]
pub struct PathFollower<C = Continuation> {
    active: Vec<ActivePath<C>>,
    was_static: bool,
}

impl<C> Default for PathFollower<C> {
    fn default() -> Self {
        Self {
            active: Vec::new(),
            was_static: false,
        }
    }
}

impl<C> PathFollower<C> {
    pub fn start(&mut self, body: &mut Body, path: Path, duration: f32, on_complete: C) {
        self.start_with(body, path, duration, None, on_complete);
    }

    /// [`PathFollower::start`] with an extra value handed back when the path begins
    pub fn start_with(
        &mut self,
        body: &mut Body,
        path: Path,
        duration: f32,
        on_start: Option<C>,
        on_complete: C,
    ) {
        if self.active.is_empty() {
            self.was_static = body.is_static;
            body.is_static = true;
        }
        body.pos = path.start();
        body.vel = Vec2::ZERO;
        self.active.push(ActivePath {
            path,
            duration,
            elapsed: 0.0,
            on_start,
            on_complete: Some(on_complete),
        });
    }

    pub fn is_following(&self) -> bool {
        !self.active.is_empty()
    }

    /// Number of paths currently in flight
    pub fn following_count(&self) -> usize {
        self.active.len()
    }

    /// Static flag to restore once the last path finishes
    pub fn set_resume_static(&mut self, is_static: bool) {
        self.was_static = is_static;
    }

    /// Advance every active path by `dt` and collect finished continuations
    pub fn advance(&mut self, body: &mut Body, dt: f32, completed: &mut Vec<C>) {
        if self.active.is_empty() {
            return;
        }

        for active in &mut self.active {
            completed.extend(active.on_start.take());
            active.elapsed += dt;
        }
        if let Some(driver) = self.active.last() {
            body.pos = driver.path.point_at(driver.progress());
        }

        let mut i = 0;
        while i < self.active.len() {
            if self.active[i].finished() {
                let mut done = self.active.remove(i);
                completed.extend(done.on_complete.take());
            } else {
                i += 1;
            }
        }

        if self.active.is_empty() {
            body.is_static = self.was_static;
        }
    }

    /// Finish every active path immediately
    ///
    /// Used when the owning entity is removed from the world mid-path.
    pub fn finish_all(&mut self, body: &mut Body, completed: &mut Vec<C>) {
        if let Some(driver) = self.active.last() {
            body.pos = driver.path.end();
        }
        let had_paths = !self.active.is_empty();
        for mut done in self.active.drain(..) {
            completed.extend(done.on_start.take());
            completed.extend(done.on_complete.take());
        }
        if had_paths {
            body.is_static = self.was_static;
        }
    }
}

/// Entities that can be moved along paths
pub trait FollowsPath {
    fn path_parts(&mut self) -> (&mut Body, &mut PathFollower);
    fn follower(&self) -> &PathFollower;

    fn start_path(&mut self, path: Path, duration: f32, on_complete: Continuation) {
        let (body, follower) = self.path_parts();
        follower.start(body, path, duration, on_complete);
    }

    /// Like [`FollowsPath::start_path`], also resuming `on_start` on the next advance
    fn start_path_with(
        &mut self,
        path: Path,
        duration: f32,
        on_start: Option<Continuation>,
        on_complete: Continuation,
    ) {
        let (body, follower) = self.path_parts();
        follower.start_with(body, path, duration, on_start, on_complete);
    }

    fn is_following(&self) -> bool {
        self.follower().is_following()
    }
}
