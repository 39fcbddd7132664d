//! Server-side error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use arena_core::error::SessionError;

/// Failure to load the server configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Persistence failure. Logged by callers, never fatal to the game loop.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] io::Error),
    #[error("record encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors surfaced to the transport through [`crate::state::ServerHandle`].
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("failed to spawn thread: {0}")]
    Spawn(io::Error),
    #[error("game loop is not running")]
    Stopped,
}
