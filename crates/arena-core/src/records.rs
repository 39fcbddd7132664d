//! Persisted player records exchanged with the storage collaborator.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_REALM;
use crate::gear::Gear;

/// What survives a disconnect. `gear` is the JSON form of [`Gear`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub username: String,
    pub x: f64,
    pub y: f64,
    pub realm: String,
    pub gear: String,
}

impl PlayerRecord {
    /// Record for a player with no persisted state: origin of the default
    /// realm and the starter loadout.
    pub fn default_for(username: &str) -> Self {
        Self {
            username: username.to_string(),
            x: 0.0,
            y: 0.0,
            realm: DEFAULT_REALM.to_string(),
            gear: Gear::starter().to_persisted(),
        }
    }
}
