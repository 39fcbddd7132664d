//! Simulation engine for the arena server.
//!
//! Owns the hecs ECS world through the entity registry, runs systems at a
//! fixed tick rate, and produces per-realm snapshots for broadcast.

pub mod engine;
pub mod gear;
pub mod registry;
pub mod session;
pub mod systems;
pub mod world_setup;

pub use arena_core as core;
pub use engine::{SimConfig, SimulationEngine, TickOutput};

#[cfg(test)]
mod tests;
