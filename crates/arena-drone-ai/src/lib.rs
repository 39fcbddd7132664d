//! Drone AI for the arena simulation.
//!
//! Implements the per-drone behavior state machine, tier profiles and
//! personality rolls.

pub mod brain;
pub mod fsm;
pub mod profiles;

pub use arena_core as core;

#[cfg(test)]
mod tests;
