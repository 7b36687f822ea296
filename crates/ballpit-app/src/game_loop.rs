//! Game loop: drives the engine from a clock and feeds it input.
//!
//! [`Headless`] runs frames on a fixed 60 Hz clock, which is what the
//! binary and the tests use. [`spawn_game_loop`] runs the same thing on a
//! thread against the wall clock. The engine is created inside that thread
//! since it holds non-`Send` state; commands arrive over an `mpsc` channel
//! and stats of each frame are stored for polling.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use ballpit_core::canvas::RecordingCanvas;
use ballpit_core::commands::InputEvent;
use ballpit_core::error::Result;
use ballpit_core::state::Stats;
use ballpit_sim::{Engine, FrameOutcome, Hooks};

use crate::game::{Game, GameConfig};
use crate::state::{LoopCommand, LoopHandle};

/// Nominal frame period of the fixed clock (milliseconds).
pub const FRAME_MS: f64 = 1000.0 / 60.0;

const FRAME_DURATION: Duration = Duration::from_nanos(1_000_000_000 / 60);

/// A game running on a recording surface.
pub struct Headless {
    pub game: Game,
    pub engine: Engine,
    /// Shares the engine's recording. Cleared before every frame.
    pub canvas: RecordingCanvas,
    frames: u64,
}

impl Headless {
    pub fn new(config: GameConfig) -> Result<Self> {
        let canvas = RecordingCanvas::new(config.width, config.height);
        let mut game = Game::new(config);
        let engine = game.start(Box::new(canvas.share()))?;
        Ok(Self {
            game,
            engine,
            canvas,
            frames: 0,
        })
    }

    /// Apply a platform event through the game hooks.
    pub fn send(&mut self, event: &InputEvent) -> Result<()> {
        self.engine.handle_input(&mut self.game, event)
    }

    /// Next frame on the fixed clock.
    pub fn step(&mut self) -> Result<FrameOutcome> {
        self.frames += 1;
        self.step_at(self.frames as f64 * FRAME_MS)
    }

    /// Frame at platform time `time_ms`.
    pub fn step_at(&mut self, time_ms: f64) -> Result<FrameOutcome> {
        self.canvas.clear();
        self.game.render(&mut self.engine, time_ms)
    }

    /// Run `frames` frames on the fixed clock and report the final stats.
    pub fn run(&mut self, frames: u64) -> Result<Stats> {
        for _ in 0..frames {
            self.step()?;
        }
        Ok(self.engine.stats())
    }
}

/// Start the game on its own thread.
pub fn spawn_game_loop(config: GameConfig) -> std::io::Result<LoopHandle> {
    let (cmd_tx, cmd_rx) = mpsc::channel::<LoopCommand>();
    let latest_stats = Arc::new(Mutex::new(None));
    let shared = Arc::clone(&latest_stats);

    let thread = std::thread::Builder::new()
        .name("ballpit-game-loop".into())
        .spawn(move || run_game_loop(config, cmd_rx, &shared))?;

    Ok(LoopHandle::new(cmd_tx, latest_stats, thread))
}

/// Runs until `Shutdown`, channel disconnect or a frame error.
fn run_game_loop(config: GameConfig, cmd_rx: mpsc::Receiver<LoopCommand>, latest_stats: &Mutex<Option<Stats>>) {
    let mut headless = match Headless::new(config) {
        Ok(headless) => headless,
        Err(err) => {
            log::error!("game failed to start: {err}");
            return;
        }
    };
    let started = Instant::now();
    let mut next_frame = started;

    loop {
        loop {
            match cmd_rx.try_recv() {
                Ok(LoopCommand::Input(event)) => {
                    if let Err(err) = headless.send(&event) {
                        log::error!("input handler failed: {err}");
                        return;
                    }
                }
                Ok(LoopCommand::Shutdown) => {
                    log::info!("game loop shutting down");
                    return;
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => return,
            }
        }

        let now_ms = started.elapsed().as_secs_f64() * 1000.0;
        if let Err(err) = headless.step_at(now_ms) {
            log::error!("frame failed, stopping: {err}");
            return;
        }

        if let Ok(mut lock) = latest_stats.lock() {
            *lock = Some(headless.engine.stats());
        }

        next_frame += FRAME_DURATION;
        let now = Instant::now();
        if next_frame > now {
            std::thread::sleep(next_frame - now);
        } else if now - next_frame > FRAME_DURATION * 2 {
            // Too far behind, skip ahead instead of catching up.
            next_frame = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_steps_one_frame_period() {
        let mut headless = Headless::new(GameConfig::default()).unwrap();
        let outcome = headless.step().unwrap();
        let FrameOutcome::Stepped { step } = outcome else {
            panic!("expected a step, got {outcome:?}");
        };
        assert!((step - FRAME_MS / 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_loop_publishes_stats_and_stops() {
        let handle = spawn_game_loop(GameConfig::default()).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while handle.latest().is_none() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        let stats = handle.latest().expect("no stats published");
        assert_eq!(stats.entities, 21);
        assert!(handle.send(InputEvent::key_down("KeyP")));
        assert!(handle.shutdown());
    }
}
