//! Headless runner: `ballpit [config.json] [frames]`.
//!
//! Runs the sample game on the fixed clock and prints the final stats as
//! JSON. `RUST_LOG` controls log output (default `info`).

use std::process::ExitCode;

use ballpit_app::game::GameConfig;
use ballpit_app::game_loop::Headless;

fn main() -> ExitCode {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => match load_config(&path) {
            Ok(config) => config,
            Err(err) => {
                log::error!("{err}");
                return ExitCode::FAILURE;
            }
        },
        None => GameConfig::default(),
    };
    let frames = match args.next().map(|s| s.parse::<u64>()) {
        Some(Ok(frames)) => frames,
        Some(Err(err)) => {
            log::error!("bad frame count: {err}");
            return ExitCode::FAILURE;
        }
        None => config.frames,
    };

    let result = Headless::new(config).and_then(|mut headless| headless.run(frames));
    match result {
        Ok(stats) => {
            log::info!("done after {frames} frames: {}", stats.summary());
            match serde_json::to_string_pretty(&stats) {
                Ok(json) => println!("{json}"),
                Err(err) => log::error!("cannot encode stats: {err}"),
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("game stopped: {err}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: &str) -> Result<GameConfig, String> {
    let json = std::fs::read_to_string(path).map_err(|err| format!("cannot read {path}: {err}"))?;
    GameConfig::from_json(&json).map_err(|err| format!("bad config {path}: {err}"))
}
