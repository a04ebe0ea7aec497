//! Level progression and ball flow
//!
//! Loading, firing, returning and level advance are all driven through here.
//! Anything that has to wait for a tween is scheduled as a [`Continuation`] and
//! picked up by [`GameState::resume`].

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use super::ball::{BallId, BallState};
use super::path::{FollowsPath, Path};
use super::shape::{Shape, ShapeHandle};
use super::state::{AfterLevel, BarrierId, Continuation, GameEvent, GameState, OnLoaded};
use crate::error::ContractViolation;
use crate::geom;

impl GameState {
    /// Opening rows, the level head start and the first load
    pub fn start_round(&mut self) {
        self.create_row_of_shapes(self.config().initial_rows);
        self.level += self.config().initial_level_bonus;
        log::info!("Round started at level {}", self.level);
        self.load_ball(OnLoaded::Nothing);
    }

    pub fn all_balls_waiting(&self) -> bool {
        self.balls.iter().all(|b| b.state() == BallState::Waiting)
    }

    /// Spawn `rows` rows, the first one sitting on the bottom boundary
    ///
    /// Even levels get the wide row, odd levels the narrow one shifted half a
    /// column to the right.
    pub fn create_row_of_shapes(&mut self, rows: u32) {
        let layout = *self.layout();
        let config = self.config();
        let spacing = layout.shape_spacing;
        let (cols_even, cols_odd) = (config.cols_even, config.cols_odd);
        let side_span = config.shape_sides;
        let life_span = config.strength_range;
        let fixed_strength = config.fixed_strength;

        let mut level = self.level;
        let mut y = layout.bottom_y - spacing / 2.0;
        for _ in 0..rows {
            let cols = if level % 2 == 0 { cols_even } else { cols_odd };
            let offset = cols_even.saturating_sub(cols) as f32 * spacing / 2.0;
            let mut x = layout.play_left + spacing / 2.0 + offset;
            for _ in 0..cols {
                let sides = self.rng.random_range(side_span.min..=side_span.max);
                let rotation = self.rng.random_range(0.0..TAU);
                let lives = match fixed_strength {
                    Some(lives) => lives,
                    None => self.rng.random_range(life_span.min..=life_span.max),
                };
                debug_assert!(side_span.contains(sides));

                let radius = self.config().radius_for_sides(sides);
                self.spawn_shape(Shape::new(Vec2::new(x, y), sides, rotation, lives, radius));
                x += spacing;
            }
            log::debug!("Spawned row of {} at y {:.1}", cols, y);
            level += 1;
            y -= spacing;
        }
    }

    fn spawn_shape(&mut self, shape: Shape) -> ShapeHandle {
        let (pos, sides, lives) = (shape.body.pos, shape.sides(), shape.lives());
        let handle = ShapeHandle(self.shapes.spawn((shape,)));
        self.shape_order.push(handle);
        self.emit(GameEvent::ShapeSpawned {
            shape: handle,
            pos,
            sides,
            lives,
        });
        handle
    }

    /// Move the nearest waiting ball into the shooter
    ///
    /// Returns `false` when no ball is waiting.
    pub fn load_ball(&mut self, on_loaded: OnLoaded) -> bool {
        let target = self.layout().shooter;
        let waiting = self
            .balls
            .iter()
            .filter(|b| b.state() == BallState::Waiting);
        let Some(id) = geom::find_nearest(waiting, target.x, target.y).map(|b| b.id) else {
            log::debug!("No waiting ball to load");
            return false;
        };

        let duration = self.config().load_duration;
        let ball = &mut self.balls[id.0];
        let path = Path::new(ball.body.pos).line_to(target);
        ball.start_path(
            path,
            duration,
            Continuation::BallLoaded {
                ball: id,
                then: on_loaded,
            },
        );
        true
    }

    /// Fire the loaded ball with `velocity`
    pub fn fire(&mut self, velocity: Vec2) -> Option<BallId> {
        let Some(id) = self.loaded_ball() else {
            let states: Vec<String> = self.balls.iter().map(|b| b.debug_string()).collect();
            log::info!("No balls to fire: [{}]", states.join(", "));
            return None;
        };
        self.fire_ball(id, velocity);
        Some(id)
    }

    fn fire_ball(&mut self, id: BallId, velocity: Vec2) {
        self.set_ball_state(id, BallState::InPlay);
        self.balls[id.0].body.vel = velocity;
        self.emit(GameEvent::BallFired { ball: id, velocity });

        let next = if self.config().auto_fire {
            OnLoaded::Fire(velocity)
        } else {
            OnLoaded::Nothing
        };
        self.load_ball(next);
    }

    /// A ball reached the bottom boundary
    ///
    /// Only in-play balls return; anything else is a late or duplicate report.
    pub fn ball_fell(&mut self, id: BallId) {
        let Some(ball) = self.ball(id) else {
            log::debug!("Fall reported for unknown ball {}", id.0);
            return;
        };
        if ball.state() != BallState::InPlay {
            log::debug!("Ignoring fall of {}", ball.debug_string());
            return;
        }

        let layout = *self.layout();
        let pos = ball.body.pos;
        let (lane_x, home) = if pos.x < layout.mid_x() {
            (layout.lane_left_x, layout.home_left)
        } else {
            (layout.lane_right_x, layout.home_right)
        };
        let path = Path::new(pos)
            .line_to(Vec2::new(lane_x, layout.lane_bottom_y))
            .line_to(Vec2::new(lane_x, home.y))
            .line_to(home);

        self.set_ball_state(id, BallState::MovingToWaiting);
        let duration = self.config().return_duration;
        let returned = Continuation::BallReturned { ball: id };
        self.balls[id.0].start_path(path, duration, returned);
    }

    /// A ball struck a shape
    pub fn shape_hit(&mut self, handle: ShapeHandle, ball_id: BallId) {
        let Some(ball) = self.balls.get(ball_id.0) else {
            log::debug!("Hit reported for unknown ball {}", ball_id.0);
            return;
        };
        let Ok(shape) = self.shapes.query_one_mut::<&mut Shape>(handle.0) else {
            log::debug!("Hit on a shape that is already gone");
            return;
        };

        let impact = shape.hit(ball);
        let (lives, color, destroyed) = (shape.lives(), shape.color(), shape.is_destroyed());
        self.score += u64::from(impact);
        self.emit(GameEvent::ShapeHit {
            shape: handle,
            impact,
            lives,
            color,
        });
        self.emit(GameEvent::ScoreChanged { score: self.score });

        self.nudge(ball_id);
        if destroyed {
            self.destroy_shape(handle);
        }
    }

    /// Kick a ball sideways if it is bouncing almost vertically
    fn nudge(&mut self, id: BallId) {
        let config = self.config();
        let (threshold, min, max) = (config.nudge_threshold, config.nudge_min, config.nudge_max);
        let vx = self.balls[id.0].body.vel.x;
        if vx.abs() >= threshold {
            return;
        }
        let magnitude = self.rng.random_range(min..=max);
        self.balls[id.0].body.vel.x = if vx > 0.0 { magnitude } else { -magnitude };
    }

    fn destroy_shape(&mut self, handle: ShapeHandle) {
        let mut completed = Vec::new();
        let burst_at = match self.shapes.query_one_mut::<&mut Shape>(handle.0) {
            Ok(shape) => {
                let (body, follower) = shape.path_parts();
                follower.finish_all(body, &mut completed);
                shape.burst_center()
            }
            Err(_) => return,
        };
        if let Err(err) = self.shapes.despawn(handle.0) {
            log::warn!("Despawn failed: {}", err);
        }
        self.shape_order.retain(|h| *h != handle);
        self.emit(GameEvent::ShapeDestroyed {
            shape: handle,
            burst_at,
        });
        if self.shape_order.is_empty() {
            log::info!("Field cleared at level {}", self.level);
        }

        for continuation in completed {
            self.resume(continuation);
        }
    }

    /// Raise every shape one row and add a fresh row at the bottom
    ///
    /// Every ball must be waiting.
    pub fn try_next_level(&mut self, on_done: AfterLevel) -> Result<(), ContractViolation> {
        if let Some(busy) = self.balls.iter().find(|b| b.state() != BallState::Waiting) {
            return Err(ContractViolation::LevelAdvanceWhileBusy {
                ball: busy.id,
                state: busy.state(),
            });
        }

        self.level += 1;
        log::info!("Level {}", self.level);
        self.emit(GameEvent::LevelAdvanced { level: self.level });

        if self.shape_order.is_empty() {
            self.finish_level(on_done);
            return Ok(());
        }

        let barrier = self.open_barrier(self.shape_order.len(), on_done);
        let rise = Vec2::new(0.0, -self.layout().shape_spacing);
        let duration = self.config().raise_duration;
        for handle in &self.shape_order {
            if let Ok(shape) = self.shapes.query_one_mut::<&mut Shape>(handle.0) {
                let from = shape.body.pos;
                shape.start_path(
                    Path::new(from).line_to(from + rise),
                    duration,
                    Continuation::ShapeRaised { barrier },
                );
            }
        }
        Ok(())
    }

    /// [`GameState::try_next_level`], treating a busy ball as fatal
    pub fn next_level(&mut self, on_done: AfterLevel) {
        if let Err(err) = self.try_next_level(on_done) {
            panic!("{}", err);
        }
    }

    fn finish_level(&mut self, on_done: AfterLevel) {
        self.create_row_of_shapes(1);
        if on_done == AfterLevel::LoadBall {
            self.load_ball(OnLoaded::Nothing);
        }
    }

    /// Run deferred work for a finished path
    pub(crate) fn resume(&mut self, continuation: Continuation) {
        match continuation {
            Continuation::BallLoaded { ball, then } => self.on_ball_loaded(ball, then),
            Continuation::BallReturned { ball } => {
                self.set_ball_state(ball, BallState::Waiting);
                if self.all_balls_waiting() {
                    self.next_level(AfterLevel::LoadBall);
                }
            }
            Continuation::ShapeRaised { barrier } => self.on_shape_raised(barrier),
        }
    }

    fn on_ball_loaded(&mut self, id: BallId, then: OnLoaded) {
        match self.balls[id.0].state() {
            BallState::Waiting | BallState::Loaded => {}
            state => {
                log::debug!("Stale load for ball {} in {:?}", id.0, state);
                return;
            }
        }
        self.set_ball_state(id, BallState::Loaded);
        if let OnLoaded::Fire(velocity) = then {
            self.fire_ball(id, velocity);
        }
    }

    fn on_shape_raised(&mut self, barrier: BarrierId) {
        let released = match self.barriers.get_mut(&barrier) {
            Some(b) => b.arrive(),
            None => {
                log::debug!("Arrival at closed barrier {:?}", barrier);
                return;
            }
        };
        if let Some(on_done) = released {
            self.barriers.remove(&barrier);
            self.finish_level(on_done);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    fn state() -> GameState {
        GameState::new(GameConfig::default())
    }

    /// Advance paths until nothing is following
    fn settle(state: &mut GameState) {
        for _ in 0..1000 {
            let balls_busy = state.balls.iter().any(|b| b.is_following());
            let shapes_busy = state
                .shape_handles()
                .iter()
                .any(|h| state.shape(*h).is_some_and(|s| s.is_following()));
            if !balls_busy && !shapes_busy {
                return;
            }
            state.advance_paths(crate::consts::SIM_DT);
        }
        panic!("paths never settled");
    }

    #[test]
    fn test_row_layout_even_and_odd() {
        let mut state = state();
        state.create_row_of_shapes(2);
        let cfg = state.config().clone();
        assert_eq!(state.shape_count(), (cfg.cols_even + cfg.cols_odd) as usize);

        let layout = *state.layout();
        let spacing = layout.shape_spacing;
        let first = state.shape(state.shape_handles()[0]).unwrap().body.pos;
        assert!((first.x - (layout.play_left + spacing / 2.0)).abs() < 1e-3);
        assert!((first.y - (layout.bottom_y - spacing / 2.0)).abs() < 1e-3);

        let odd_first = state
            .shape(state.shape_handles()[cfg.cols_even as usize])
            .unwrap()
            .body
            .pos;
        assert!((odd_first.x - (first.x + spacing / 2.0)).abs() < 1e-3);
        assert!((odd_first.y - (first.y - spacing)).abs() < 1e-3);
        // Row creation never touches the level counter
        assert_eq!(state.level, 0);
    }

    #[test]
    fn test_row_uses_config_ranges() {
        let mut state = GameState::new(GameConfig {
            fixed_strength: Some(7),
            ..GameConfig::default()
        });
        state.create_row_of_shapes(3);
        let span = state.config().shape_sides;
        for handle in state.shape_handles() {
            let shape = state.shape(*handle).unwrap();
            assert_eq!(shape.lives(), 7);
            assert!(span.contains(shape.sides()));
            assert!(shape.body.is_static);
        }
    }

    #[test]
    fn test_start_round() {
        let mut state = state();
        state.start_round();
        let cfg = state.config().clone();
        assert_eq!(state.level, cfg.initial_level_bonus);
        assert_eq!(
            state.shape_count(),
            (cfg.cols_even * 2 + cfg.cols_odd) as usize
        );
        assert_eq!(state.balls.iter().filter(|b| b.is_following()).count(), 1);

        settle(&mut state);
        assert!(state.loaded_ball().is_some());
    }

    #[test]
    fn test_load_picks_nearest_to_shooter() {
        let mut state = state();
        let shooter = state.layout().shooter;
        state.balls[2].body.pos = shooter + Vec2::new(1.0, 0.0);
        assert!(state.load_ball(OnLoaded::Nothing));
        assert!(state.balls[2].is_following());
        assert!(!state.balls[0].is_following());

        settle(&mut state);
        assert_eq!(state.loaded_ball(), Some(BallId(2)));
        assert_eq!(state.balls[2].body.pos, shooter);
    }

    #[test]
    fn test_fire_without_loaded_ball() {
        let mut state = state();
        assert_eq!(state.fire(Vec2::Y), None);
        assert!(state.all_balls_waiting());
    }

    #[test]
    fn test_fire_sets_velocity_and_reloads() {
        let mut state = state();
        state.load_ball(OnLoaded::Nothing);
        settle(&mut state);
        let v = Vec2::new(30.0, 400.0);
        let fired = state.fire(v).unwrap();

        let ball = state.ball(fired).unwrap();
        assert_eq!(ball.state(), BallState::InPlay);
        assert_eq!(ball.body.vel, v);
        assert!(!ball.body.is_static);
        assert_eq!(state.balls.iter().filter(|b| b.is_following()).count(), 1);

        let events = state.drain_events();
        assert!(events.contains(&GameEvent::BallFired {
            ball: fired,
            velocity: v
        }));
    }

    #[test]
    fn test_auto_fire_chains() {
        let mut state = GameState::new(GameConfig {
            auto_fire: true,
            ..GameConfig::default()
        });
        state.load_ball(OnLoaded::Nothing);
        settle(&mut state);
        state.fire(Vec2::Y * 100.0);
        settle(&mut state);
        assert!(state.balls.iter().all(|b| b.state() == BallState::InPlay));
    }

    #[test]
    fn test_ball_fell_ignored_unless_in_play() {
        let mut state = state();
        state.ball_fell(BallId(0));
        assert_eq!(state.balls[0].state(), BallState::Waiting);
        assert!(!state.balls[0].is_following());
        state.ball_fell(BallId(42));
    }

    #[test]
    fn test_return_path_picks_side() {
        let mut state = state();
        state.load_ball(OnLoaded::Nothing);
        settle(&mut state);
        let id = state.fire(Vec2::ZERO).unwrap();
        let layout = *state.layout();

        state.balls[id.0].body.pos = Vec2::new(layout.play_right - 10.0, layout.bottom_y);
        state.ball_fell(id);
        assert_eq!(state.balls[id.0].state(), BallState::MovingToWaiting);
        let returning = BallState::MovingToWaiting.filter();
        assert_eq!(state.balls[id.0].body.filter, returning);

        // Late duplicate report
        state.ball_fell(id);
        assert_eq!(state.balls[id.0].follower().following_count(), 1);

        settle(&mut state);
        assert_eq!(state.balls[id.0].body.pos, layout.home_right);
        assert_eq!(state.balls[id.0].state(), BallState::Waiting);
    }

    #[test]
    fn test_last_return_advances_level_once() {
        let mut state = state();
        state.create_row_of_shapes(1);
        state.load_ball(OnLoaded::Nothing);
        settle(&mut state);
        let id = state.fire(Vec2::ZERO).unwrap();
        // Park the reloaded ball again so only one ball is out
        settle(&mut state);
        let loaded = state.loaded_ball().unwrap();
        state.balls[loaded.0].transition(BallState::InPlay);
        state.balls[loaded.0].transition(BallState::MovingToWaiting);
        state.balls[loaded.0].transition(BallState::Waiting);

        state.ball_fell(id);
        state.drain_events();
        settle(&mut state);

        let advanced: Vec<_> = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::LevelAdvanced { .. }))
            .collect();
        assert_eq!(advanced, vec![GameEvent::LevelAdvanced { level: 1 }]);
        assert_eq!(state.level, 1);
    }

    #[test]
    fn test_next_level_raises_and_adds_row() {
        let mut state = state();
        state.create_row_of_shapes(1);
        let before: Vec<Vec2> = state
            .shape_handles()
            .iter()
            .map(|h| state.shape(*h).unwrap().body.pos)
            .collect();
        let spacing = state.layout().shape_spacing;

        state.next_level(AfterLevel::Nothing);
        assert_eq!(state.level, 1);
        assert_eq!(
            state.shape_count(),
            before.len(),
            "row waits for the barrier"
        );

        settle(&mut state);
        let cfg = state.config().clone();
        assert_eq!(state.shape_count(), (cfg.cols_even + cfg.cols_odd) as usize);
        for (i, pos) in before.iter().enumerate() {
            let now = state.shape(state.shape_handles()[i]).unwrap().body.pos;
            assert!((now - (*pos - Vec2::new(0.0, spacing))).length() < 1e-3);
        }
        assert!(state.barriers.is_empty());
        assert!(state.all_balls_waiting());
    }

    #[test]
    fn test_next_level_with_empty_field_is_synchronous() {
        let mut state = state();
        state.next_level(AfterLevel::LoadBall);
        assert_eq!(state.level, 1);
        // Odd level: narrow row
        assert_eq!(state.shape_count(), state.config().cols_odd as usize);
        assert_eq!(state.balls.iter().filter(|b| b.is_following()).count(), 1);
    }

    #[test]
    fn test_next_level_while_busy() {
        let mut state = state();
        state.balls[1].transition(BallState::Loaded);
        let err = state.try_next_level(AfterLevel::Nothing).unwrap_err();
        assert_eq!(
            err,
            ContractViolation::LevelAdvanceWhileBusy {
                ball: BallId(1),
                state: BallState::Loaded
            }
        );
        assert_eq!(state.level, 0);
    }

    #[test]
    fn test_shape_hit_scores_and_destroys() {
        let mut state = GameState::new(GameConfig {
            fixed_strength: Some(2),
            ..GameConfig::default()
        });
        state.create_row_of_shapes(1);
        let handle = state.shape_handles()[0];

        state.shape_hit(handle, BallId(0));
        assert_eq!(state.score, 1);
        assert_eq!(state.shape(handle).unwrap().lives(), 1);

        state.shape_hit(handle, BallId(0));
        assert_eq!(state.score, 2);
        assert!(state.shape(handle).is_none());
        assert!(!state.shape_handles().contains(&handle));

        // Stale hit
        state.shape_hit(handle, BallId(0));
        assert_eq!(state.score, 2);

        let destroyed = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::ShapeDestroyed { .. }))
            .count();
        assert_eq!(destroyed, 1);
    }

    #[test]
    fn test_nudge() {
        let mut state = state();
        state.create_row_of_shapes(1);
        let cfg = state.config().clone();
        let handles = state.shape_handles().to_vec();

        state.balls[0].body.vel = Vec2::new(5.0, 300.0);
        state.shape_hit(handles[0], BallId(0));
        let vx = state.balls[0].body.vel.x;
        assert!(vx >= cfg.nudge_min && vx <= cfg.nudge_max);

        state.balls[0].body.vel = Vec2::new(0.0, 300.0);
        state.shape_hit(handles[1], BallId(0));
        let vx = state.balls[0].body.vel.x;
        assert!(-vx >= cfg.nudge_min && -vx <= cfg.nudge_max);

        state.balls[0].body.vel = Vec2::new(-500.0, 300.0);
        state.shape_hit(handles[2], BallId(0));
        assert_eq!(state.balls[0].body.vel.x, -500.0);
    }

    #[test]
    fn test_destroy_mid_raise_releases_barrier() {
        let mut state = GameState::new(GameConfig {
            fixed_strength: Some(1),
            ..GameConfig::default()
        });
        state.create_row_of_shapes(1);
        state.next_level(AfterLevel::Nothing);
        let handles = state.shape_handles().to_vec();
        for handle in handles {
            state.shape_hit(handle, BallId(0));
        }
        // Last arrival came from destruction; the new row is already in
        assert!(state.barriers.is_empty());
        assert_eq!(state.shape_count(), state.config().cols_odd as usize);
    }
}
