//! Core types and definitions for the arena simulation.
//!
//! This crate defines the vocabulary shared across all other crates:
//! components, commands, snapshots, events, static item/realm/spawner
//! tables and constants. It has no dependency on any runtime framework.

pub mod commands;
pub mod components;
pub mod constants;
pub mod enums;
pub mod error;
pub mod events;
pub mod gear;
pub mod items;
pub mod realms;
pub mod records;
pub mod spawners;
pub mod state;
pub mod types;
