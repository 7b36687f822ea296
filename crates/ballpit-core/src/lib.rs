//! Core types and definitions for the ballpit runtime.
//!
//! This crate holds the vocabulary shared by the simulation and the app:
//! entity handles, configuration, errors, input commands, the scheduler,
//! the z-bucket index, the camera and the drawing-surface seam.
//! It has no dependency on the physics engine.

pub mod camera;
pub mod canvas;
pub mod commands;
pub mod config;
pub mod constants;
pub mod enums;
pub mod error;
pub mod input;
pub mod math;
pub mod scheduler;
pub mod state;
pub mod types;
pub mod zmap;

pub use error::{EngineError, Result};
