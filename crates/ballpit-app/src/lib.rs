//! The ballpit sample game.
//!
//! Wires the simulation crates into a playable scene (a player ball and a
//! field of barrels), plus a headless game loop that can run on its own
//! thread fed by an input channel.

pub mod barrel;
pub mod game;
pub mod game_loop;
pub mod player;
pub mod state;

pub use ballpit_core as core;
pub use ballpit_sim as sim;
