//! Engine configuration.
//!
//! Every field has a default so a partial JSON document is enough:
//! `{"time_scale": 0.5}` keeps all other settings.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::constants::{
    CAMERA_DISTANCE, CAMERA_VIEWPORT, DEFAULT_BACKGROUND, DEFAULT_SEED, DEFAULT_TIME_SCALE,
    MAX_STEP_SEC,
};
use crate::enums::ScaleMode;
use crate::error::{EngineError, Result};

/// Initial camera placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub x: f32,
    pub y: f32,
    /// Visible world width.
    pub w: f32,
    /// Visible world height.
    pub h: f32,
    pub mode: ScaleMode,
    /// Ease centre and viewport toward their targets instead of jumping.
    pub smooth: bool,
    /// Reference distance for depth parallax.
    pub distance: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            w: CAMERA_VIEWPORT,
            h: CAMERA_VIEWPORT,
            mode: ScaleMode::Fit,
            smooth: false,
            distance: CAMERA_DISTANCE,
        }
    }
}

/// Configuration for starting a new engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound of a single physics step (seconds).
    pub max_step_sec: f64,
    /// Global time scale applied after clamping.
    pub time_scale: f64,
    pub gravity: Vec2,
    /// RNG seed for determinism.
    pub seed: u64,
    /// Clear colour of the drawing surface.
    pub background: String,
    /// Run the secondary (hardware) render hook every frame.
    pub secondary_render: bool,
    /// Start with the physics debug overlay enabled.
    pub render_world: bool,
    pub camera: CameraConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_step_sec: MAX_STEP_SEC,
            time_scale: DEFAULT_TIME_SCALE,
            gravity: Vec2::ZERO,
            seed: DEFAULT_SEED,
            background: DEFAULT_BACKGROUND.to_string(),
            secondary_render: false,
            render_world: false,
            camera: CameraConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the frame pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(self.max_step_sec > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "max_step_sec must be positive, got {}",
                self.max_step_sec
            )));
        }
        if !(self.time_scale >= 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "time_scale must not be negative, got {}",
                self.time_scale
            )));
        }
        if !(self.camera.w > 0.0 && self.camera.h > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "camera viewport must be positive, got {}x{}",
                self.camera.w, self.camera.h
            )));
        }
        if !(self.camera.distance > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "camera distance must be positive, got {}",
                self.camera.distance
            )));
        }
        Ok(())
    }
}
