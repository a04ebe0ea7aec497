//! Ball Breaker headless runner
//!
//! Plays a scripted session against the stand-in engine and prints a summary.
//!
//! ```text
//! ball-breaker [config.json] [max-ticks]
//! ```

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use ball_breaker::GameConfig;

    env_logger::init();
    log::info!("Ball Breaker (headless) starting...");

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => match load_config(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Bad config {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => GameConfig::default(),
    };
    let max_ticks = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(60 * 60 * 5);

    log::info!("Game initialized with seed: {}", config.seed);
    let summary = run_session(config, max_ticks);
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Could not encode summary: {}", e),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The core is driven by the host engine on the web
}

#[cfg(not(target_arch = "wasm32"))]
fn load_config(path: &str) -> Result<ball_breaker::GameConfig, Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(path)?;
    Ok(ball_breaker::GameConfig::from_json(&json)?)
}

/// Sweep the aim back and forth, firing whenever a ball is loaded
#[cfg(not(target_arch = "wasm32"))]
fn run_session(config: ball_breaker::GameConfig, max_ticks: u64) -> ball_breaker::sim::Snapshot {
    use ball_breaker::consts::SIM_DT;
    use ball_breaker::sim::{GameState, HeadlessEngine, TickInput, tick};
    use glam::Vec2;

    let mut state = GameState::new(config);
    let mut engine = HeadlessEngine::default();
    state.start_round();

    let origin = state.shooter.pos;
    for n in 0..max_ticks {
        let sweep = (n as f32 * 0.013).sin();
        let aim = origin + Vec2::new(sweep * 400.0, 300.0);

        let collisions = engine.step(&mut state, SIM_DT);
        let input = TickInput {
            pointer_move: Some(aim),
            pointer_up: state.loaded_ball().is_some(),
            collisions,
        };
        tick(&mut state, &input, SIM_DT);

        for event in state.drain_events() {
            match serde_json::to_string(&event) {
                Ok(json) => log::debug!("{}", json),
                Err(e) => log::warn!("Unencodable event {:?}: {}", event, e),
            }
        }
    }

    log::info!(
        "Session over at level {} with score {}",
        state.level,
        state.score
    );
    state.snapshot()
}
