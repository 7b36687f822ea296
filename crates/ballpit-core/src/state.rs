//! Runtime statistics snapshot, shown by the debug overlay and published
//! by the app's game loop after each frame.

use serde::{Deserialize, Serialize};

use crate::enums::RunState;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Frames per second over the last measurement interval.
    pub fps: f64,
    /// Frames processed since start (paused frames excluded).
    pub frames: u64,
    /// Accumulated simulation time in seconds.
    pub time: f64,
    /// Live entities.
    pub entities: usize,
    /// Physics bodies (including the static base body).
    pub bodies: usize,
    /// Scheduled actions still waiting.
    pub scheduled: usize,
    pub state: RunState,
}

impl Stats {
    /// One-line summary for the debug overlay.
    pub fn summary(&self) -> String {
        format!(
            "fps: {}, ents: {}, bodies: {}",
            self.fps.round(),
            self.entities,
            self.bodies
        )
    }
}
