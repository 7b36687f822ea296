//! Enumeration types used throughout the runtime.

use serde::{Deserialize, Serialize};

/// How the camera maps its viewport onto a canvas of a different aspect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMode {
    /// Whole viewport visible (smaller of the two axis scales).
    #[default]
    Fit,
    /// Canvas fully covered (larger of the two axis scales).
    Fill,
}

/// Physics body simulation type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyKind {
    /// Immovable (walls, the base body).
    Static,
    /// Moved by velocity set from game code, not by forces.
    Kinematic,
    /// Fully simulated.
    #[default]
    Dynamic,
}

/// Coarse engine run state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    #[default]
    Running,
    Paused,
}
