//! Error type shared by every ballpit crate.
//!
//! Only recoverable contract breaches travel through `EngineError`.
//! Registry invariant violations (double add, removing an unregistered
//! entity) are programming defects and panic at the call site instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A body, fixture or joint was created (or a body destroyed) while the
    /// physics step for the current frame was running.
    #[error("trying to create a {0} while the world step is in progress")]
    StepInProgress(&'static str),

    /// No drawing surface was supplied at startup.
    #[error("no drawing surface available")]
    NoSurface,

    /// A body handle that the physics world does not know.
    #[error("unknown physics body")]
    UnknownBody,

    /// A fixture shape that the physics engine rejects.
    #[error("invalid shape: {0}")]
    InvalidShape(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
