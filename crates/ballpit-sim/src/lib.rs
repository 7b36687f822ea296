//! Simulation runtime for ballpit.
//!
//! Owns the rapier2d world, the entity registry and the frame pipeline.
//! Headless: drawing goes through the `Canvas` seam from `ballpit-core`.

pub mod contact;
pub mod debug;
pub mod ecs;
pub mod engine;
pub mod entity;
pub mod physics;

pub use ballpit_core as core;
pub use engine::{Context, Engine, Frame, FrameOutcome, Hooks};
pub use entity::{Entity, EntityCore};

#[cfg(test)]
mod tests;
