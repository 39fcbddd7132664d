//! Error types surfaced to callers of the simulation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Connection-time identity and lifecycle failures.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionError {
    #[error("missing username in auth handshake")]
    MissingIdentity,
    #[error("invalid username")]
    InvalidIdentity,
    #[error("player {0} is already connected")]
    AlreadyConnected(String),
    #[error("no connected player named {0}")]
    UnknownPlayer(String),
}

/// Reasons a gear move is rejected. Nothing is mutated when one is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GearError {
    #[error("player not found")]
    NotFound,
    #[error("gear reference is malformed or out of range")]
    BadRef,
    #[error("item id is not registered")]
    UnknownItem,
    #[error("item type does not fit the equipment slot")]
    InvalidSlot,
    #[error("move would discard inventory items beyond the new capacity")]
    WouldDiscardItems,
}
