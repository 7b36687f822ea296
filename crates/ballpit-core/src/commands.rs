//! Input commands sent from the platform layer to the engine.
//!
//! Commands only mutate the input snapshot (and fire key handlers); they are
//! inert until the next frame's update pass reads them.

use serde::{Deserialize, Serialize};

use crate::types::Touch;

/// All platform events the engine understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InputEvent {
    // --- Keyboard ---
    /// A key went down. `code` is a physical key code such as `"KeyR"` or
    /// `"ArrowLeft"`.
    KeyDown { code: String },
    /// A key was released.
    KeyUp { code: String },

    // --- Touch ---
    /// Touches started or moved.
    TouchUpdate { touches: Vec<Touch> },
    /// Touches ended or were cancelled.
    TouchEnd { touches: Vec<Touch> },

    // --- Mouse ---
    /// Pointer moved, raw client pixels (y grows downward).
    MouseMove { x: f32, y: f32 },
    MouseDown,
    MouseUp,

    // --- Surface ---
    /// Drawing surface resized.
    Resize { width: f32, height: f32 },
}

impl InputEvent {
    pub fn key_down(code: &str) -> Self {
        InputEvent::KeyDown {
            code: code.to_string(),
        }
    }

    pub fn key_up(code: &str) -> Self {
        InputEvent::KeyUp {
            code: code.to_string(),
        }
    }
}
