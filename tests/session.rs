//! End-to-end rounds driven through `tick`

use ball_breaker::GameConfig;
use ball_breaker::consts::SIM_DT;
use ball_breaker::sim::{
    BallId, BallState, BodyLabel, BodyRef, CollisionPair, FollowsPath, GameEvent, GameState,
    HeadlessEngine, TickInput, tick,
};
use glam::Vec2;

fn idle(state: &mut GameState, ticks: usize) {
    for _ in 0..ticks {
        tick(state, &TickInput::default(), SIM_DT);
    }
}

fn count_in(state: &GameState, wanted: BallState) -> usize {
    state.balls.iter().filter(|b| b.state() == wanted).count()
}

fn fell(ball: BallId) -> CollisionPair {
    CollisionPair::new(BodyRef::scenery(BodyLabel::WallBottom), BodyRef::ball(ball))
}

fn levels_advanced(state: &mut GameState) -> Vec<u32> {
    state
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            GameEvent::LevelAdvanced { level } => Some(level),
            _ => None,
        })
        .collect()
}

fn fire_at(state: &mut GameState, aim: Vec2) {
    let input = TickInput {
        pointer_move: Some(aim),
        pointer_up: true,
        ..Default::default()
    };
    tick(state, &input, SIM_DT);
}

#[test]
fn fire_puts_one_ball_in_play_and_loads_the_next() {
    let mut state = GameState::new(GameConfig::default());
    state.start_round();
    idle(&mut state, 20);
    assert_eq!(count_in(&state, BallState::Loaded), 1);

    let aim = state.shooter.pos + Vec2::new(0.0, 500.0);
    fire_at(&mut state, aim);
    assert_eq!(count_in(&state, BallState::InPlay), 1);
    assert_eq!(
        state.balls.iter().filter(|b| b.is_following()).count(),
        1,
        "next ball should already be on its way"
    );

    idle(&mut state, 20);
    assert_eq!(count_in(&state, BallState::Loaded), 1);
    assert_eq!(count_in(&state, BallState::Waiting), 1);
}

#[test]
fn fire_with_nothing_loaded_changes_nothing() {
    let mut state = GameState::new(GameConfig::default());
    fire_at(&mut state, Vec2::new(500.0, 1500.0));
    assert_eq!(count_in(&state, BallState::Waiting), 3);
    assert!(state.drain_events().is_empty());
}

#[test]
fn every_ball_home_advances_the_level_once() {
    let mut state = GameState::new(GameConfig {
        ball_count: 1,
        ..GameConfig::default()
    });
    state.start_round();
    let start_level = state.level;
    let rows = state.shape_count();
    idle(&mut state, 20);

    let aim = state.shooter.pos + Vec2::new(0.0, 500.0);
    fire_at(&mut state, aim);
    let ball = state.balls[0].id;

    // Report the fall twice in one batch, the second is a late duplicate
    let floor = fell(ball);
    let input = TickInput {
        collisions: vec![floor, floor],
        ..Default::default()
    };
    tick(&mut state, &input, SIM_DT);
    assert_eq!(state.balls[0].state(), BallState::MovingToWaiting);
    state.drain_events();

    idle(&mut state, 120);
    assert_eq!(levels_advanced(&mut state), vec![start_level + 1]);
    assert_eq!(state.level, start_level + 1);
    assert!(state.shape_count() > rows);
    // The level advance ends by loading the only ball again
    assert_eq!(state.balls[0].state(), BallState::Loaded);
}

#[test]
fn full_pool_returning_advances_the_level_once() {
    let mut state = GameState::new(GameConfig::default());
    state.start_round();
    let start_level = state.level;
    let aim = state.shooter.pos + Vec2::new(0.0, 500.0);

    let mut fired = Vec::new();
    for _ in 0..3 {
        idle(&mut state, 20);
        let loaded = state.loaded_ball().unwrap();
        fire_at(&mut state, aim);
        assert_eq!(state.ball(loaded).unwrap().state(), BallState::InPlay);
        fired.push(loaded);
    }
    assert_eq!(count_in(&state, BallState::InPlay), 3);
    assert!(state.loaded_ball().is_none());

    // Falls arrive on separate ticks; only the last return may advance
    for ball in &fired {
        let input = TickInput {
            collisions: vec![fell(*ball)],
            ..Default::default()
        };
        tick(&mut state, &input, SIM_DT);
        idle(&mut state, 10);
    }
    assert_eq!(count_in(&state, BallState::MovingToWaiting), 3);
    state.drain_events();

    idle(&mut state, 150);
    assert_eq!(levels_advanced(&mut state), vec![start_level + 1]);
    assert_eq!(state.level, start_level + 1);
    assert_eq!(count_in(&state, BallState::Loaded), 1);
    assert_eq!(count_in(&state, BallState::Waiting), 2);
}

#[test]
fn destroyed_shape_ignores_further_hits() {
    let mut state = GameState::new(GameConfig {
        fixed_strength: Some(1),
        ..GameConfig::default()
    });
    state.start_round();
    idle(&mut state, 20);
    let aim = state.shooter.pos + Vec2::Y;
    fire_at(&mut state, aim);
    let ball = state
        .balls
        .iter()
        .find(|b| b.state() == BallState::InPlay)
        .unwrap()
        .id;
    let shape = state.shape_handles()[0];
    let shapes_before = state.shape_count();

    let hit = CollisionPair::new(BodyRef::ball(ball), BodyRef::shape(shape));
    let input = TickInput {
        collisions: vec![hit, hit],
        ..Default::default()
    };
    tick(&mut state, &input, SIM_DT);

    assert_eq!(state.score, 1);
    assert_eq!(state.shape_count(), shapes_before - 1);
    let bursts = state
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, GameEvent::ShapeDestroyed { .. }))
        .count();
    assert_eq!(bursts, 1);
}

#[test]
fn auto_fire_empties_the_pool() {
    let mut state = GameState::new(GameConfig {
        auto_fire: true,
        ..GameConfig::default()
    });
    state.start_round();
    idle(&mut state, 20);
    let aim = state.shooter.pos + Vec2::new(50.0, 400.0);
    fire_at(&mut state, aim);
    idle(&mut state, 40);
    assert_eq!(count_in(&state, BallState::InPlay), 3);

    let fired: Vec<Vec2> = state
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            GameEvent::BallFired { velocity, .. } => Some(velocity),
            _ => None,
        })
        .collect();
    assert_eq!(fired.len(), 3);
    assert!(fired.iter().all(|v| *v == fired[0]));
}

#[test]
fn headless_session_progresses() {
    let mut state = GameState::new(GameConfig::default());
    let mut engine = HeadlessEngine::default();
    state.start_round();
    let start_level = state.level;
    let aim = state.shooter.pos + Vec2::new(120.0, 400.0);

    for _ in 0..60 * 120 {
        let collisions = engine.step(&mut state, SIM_DT);
        let input = TickInput {
            pointer_move: Some(aim),
            pointer_up: state.loaded_ball().is_some(),
            collisions,
        };
        tick(&mut state, &input, SIM_DT);
        state.drain_events();

        // At most one ball is ever in the shooter
        assert!(count_in(&state, BallState::Loaded) <= 1);
    }

    assert!(state.level > start_level);
    assert!(state.score > 0);
}

#[test]
fn config_from_json_overrides_defaults() {
    let json = r#"{"seed": 7, "ball_count": 5, "auto_fire": true}"#;
    let config = GameConfig::from_json(json).unwrap();
    assert_eq!(config.seed, 7);
    assert_eq!(config.ball_count, 5);
    assert!(config.auto_fire);
    assert_eq!(config.cols_even, GameConfig::default().cols_even);

    let state = GameState::new(config);
    assert_eq!(state.balls.len(), 5);
}
