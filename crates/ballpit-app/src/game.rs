//! The sample game: a player ball pushing barrels around a grey floor.
//!
//! Key bindings: `KeyS` single step, `KeyP` pause, `KeyD` physics debug
//! overlay, `KeyR` restart.

use std::cell::Cell;
use std::rc::Rc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use ballpit_core::canvas::Canvas;
use ballpit_core::config::{CameraConfig, EngineConfig};
use ballpit_core::error::{EngineError, Result};
use ballpit_core::types::EntityId;
use ballpit_sim::{Engine, Hooks};

use crate::barrel::Barrel;
use crate::player::Player;

pub const GAME_BACKGROUND: &str = "#6c6c6c";
pub const DEFAULT_BARRELS: usize = 20;
pub const DEFAULT_VIEWPORT: f32 = 20.0;
/// Frames the headless binary runs when none are asked for.
pub const DEFAULT_FRAMES: u64 = 600;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub engine: EngineConfig,
    pub barrels: usize,
    /// World units kept visible across the short screen axis.
    pub viewport: f32,
    pub frames: u64,
    /// Headless surface size in pixels.
    pub width: f32,
    pub height: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig {
                background: GAME_BACKGROUND.to_string(),
                camera: CameraConfig {
                    smooth: true,
                    ..CameraConfig::default()
                },
                ..EngineConfig::default()
            },
            barrels: DEFAULT_BARRELS,
            viewport: DEFAULT_VIEWPORT,
            frames: DEFAULT_FRAMES,
            width: 800.0,
            height: 600.0,
        }
    }
}

impl GameConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.engine.validate()?;
        if !(self.viewport > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "viewport must be positive, got {}",
                self.viewport
            )));
        }
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "surface must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

pub struct Game {
    config: GameConfig,
    /// Shared with the restart binding, which replaces the player.
    player: Rc<Cell<Option<EntityId>>>,
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            player: Rc::new(Cell::new(None)),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn player(&self) -> Option<EntityId> {
        self.player.get()
    }

    /// Build the engine on `canvas`, bind the game keys and populate the
    /// world.
    pub fn start(&mut self, canvas: Box<dyn Canvas>) -> Result<Engine> {
        self.config.validate()?;
        let mut engine = Engine::new(self.config.engine.clone(), Some(canvas))?;
        let viewport = self.config.viewport;
        let camera = engine.camera();
        camera.fit(viewport, viewport);
        camera.set_pos(Vec2::ZERO);

        self.bind_keys(&mut engine);
        self.player.set(Some(populate(&mut engine, self.config.barrels)?));
        Ok(engine)
    }

    fn bind_keys(&self, engine: &mut Engine) {
        engine.on_key_down("KeyS", |engine| {
            engine.request_step();
            Ok(())
        });
        engine.on_key_down("KeyP", |engine| {
            engine.toggle_pause();
            Ok(())
        });
        engine.on_key_down("KeyD", |engine| {
            engine.toggle_render_world();
            Ok(())
        });
        let barrels = self.config.barrels;
        let player = Rc::clone(&self.player);
        engine.on_key_down("KeyR", move |engine| {
            player.set(Some(populate(engine, barrels)?));
            Ok(())
        });
    }
}

/// Reset the world: one player at the origin and `barrels` barrels.
pub fn populate(engine: &mut Engine, barrels: usize) -> Result<EntityId> {
    engine.camera().zoom = 1.0;
    engine.clear()?;
    let player = Player::spawn(engine)?;
    let id = engine.add(player);
    for _ in 0..barrels {
        let barrel = Barrel::spawn(engine)?;
        engine.add(barrel);
    }
    log::info!("world reset: player {id}, {barrels} barrels");
    Ok(id)
}

impl Hooks for Game {
    fn on_resize(&mut self, engine: &mut Engine) -> Result<()> {
        let viewport = self.config.viewport;
        engine.camera().fit(viewport, viewport);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_sample_game() {
        let config = GameConfig::default();
        assert_eq!(config.barrels, 20);
        assert_eq!(config.engine.background, "#6c6c6c");
        assert!(config.engine.camera.smooth);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = GameConfig::from_json(r#"{"barrels": 3, "engine": {"seed": 9}}"#).unwrap();
        assert_eq!(config.barrels, 3);
        assert_eq!(config.engine.seed, 9);
        assert_eq!(config.engine.max_step_sec, EngineConfig::default().max_step_sec);
        assert_eq!(config.viewport, DEFAULT_VIEWPORT);
    }

    #[test]
    fn rejects_empty_viewport() {
        let err = GameConfig::from_json(r#"{"viewport": 0}"#).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }
}
