//! Outbound events produced by the simulation for delivery to clients.

use serde::{Deserialize, Serialize};

use crate::error::GearError;
use crate::gear::Gear;
use crate::state::RealmSnapshot;

/// Who an outbound event is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Recipient {
    Player(String),
}

/// An event paired with its recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outbound {
    pub to: Recipient,
    pub event: ServerEvent,
}

impl Outbound {
    pub fn player(username: &str, event: ServerEvent) -> Self {
        Self {
            to: Recipient::Player(username.to_string()),
            event,
        }
    }

    pub fn error(username: &str, message: impl Into<String>) -> Self {
        Self::player(
            username,
            ServerEvent::Error {
                message: message.into(),
            },
        )
    }
}

/// Events sent from the server to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Periodic world state for the recipient's realm.
    State { snapshot: Box<RealmSnapshot> },
    /// Portal transit succeeded.
    RealmChanged { realm: String, x: f64, y: f64 },
    /// A shot left the player's weapon.
    Fired { angle: f64, at: f64 },
    /// Normalised energy level.
    Energy { value: f64, depleted: bool },
    /// Reply to a gear move request.
    GearMoved {
        request_id: u64,
        ok: bool,
        error: Option<GearError>,
        gear: Option<Gear>,
    },
    /// Player was downed and respawned.
    Respawned { realm: String, x: f64, y: f64 },
    /// Non-fatal error for the client to display.
    Error { message: String },
    /// The session is being closed by the server.
    Disconnected { reason: String },
}
