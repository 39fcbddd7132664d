//! Inbound client events, queued for processing at the next tick boundary.

use serde::{Deserialize, Serialize};

use crate::gear::GearRef;

/// A client action attributed to a connected player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerCommand {
    pub username: String,
    pub action: PlayerAction,
}

impl PlayerCommand {
    pub fn new(username: impl Into<String>, action: PlayerAction) -> Self {
        Self {
            username: username.into(),
            action,
        }
    }
}

/// All possible player actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerAction {
    /// Movement intent and aim update.
    Input {
        up: bool,
        down: bool,
        left: bool,
        right: bool,
        /// Kept unchanged when absent.
        #[serde(default)]
        angle: Option<f64>,
    },
    /// Trigger pressed.
    FireStart,
    /// Trigger released.
    FireStop,
    /// Select the active hotbar slot (clamped to the hotbar).
    SetActiveHotbar { index: i64 },
    /// Attempt portal transit.
    RequestTravel,
    /// Move or swap gear between two slots.
    GearMove {
        request_id: u64,
        from: GearRef,
        to: GearRef,
    },
}
