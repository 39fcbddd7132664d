//! Headless arena server.
//!
//! Wires the simulation engine to a fixed-rate game loop thread, routes
//! per-session events over channels and persists player records through a
//! background save worker. The network transport plugs in on top of
//! [`state::ServerHandle`] and [`state::Session`].

pub mod config;
pub mod error;
pub mod game_loop;
pub mod persistence;
pub mod state;

pub use arena_core as core;
