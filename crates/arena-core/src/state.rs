//! Snapshot views: the immutable, fully-consistent state broadcast per realm
//! at the end of each tick, plus the initialisation payload sent on connect.

use serde::{Deserialize, Serialize};

use crate::components::{MobId, ProjectileId, ProjectileOwner, SpawnerId};
use crate::enums::{DroneType, MobState, SpawnerKind};
use crate::gear::Gear;
use crate::realms::{Portal, RealmConfig};
use crate::types::{Position, SimTime, Velocity};

/// Everything visible in one realm after a tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RealmSnapshot {
    pub time: SimTime,
    pub realm: String,
    pub players: Vec<PlayerView>,
    pub projectiles: Vec<ProjectileView>,
    pub mobs: Vec<MobView>,
    pub spawners: Vec<SpawnerView>,
    pub portals: Vec<Portal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerView {
    pub username: String,
    pub position: Position,
    pub velocity: Velocity,
    pub angle: f64,
    pub health: f64,
    pub max_health: f64,
    pub energy: f64,
    pub max_energy: f64,
    pub active_hotbar: usize,
    pub gear: Gear,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileView {
    pub id: ProjectileId,
    pub owner: ProjectileOwner,
    pub position: Position,
    pub velocity: Velocity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MobView {
    pub id: MobId,
    pub drone_type: DroneType,
    pub position: Position,
    pub velocity: Velocity,
    pub health: f64,
    pub max_health: f64,
    pub state: MobState,
    pub target: Option<String>,
    pub spawner: Option<SpawnerId>,
}

/// Spawner configuration as shown to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnerConfigView {
    pub kind: SpawnerKind,
    pub name: String,
    pub quota: Vec<(DroneType, u32)>,
    pub spawn_radius: f64,
    pub transfer_range: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnerView {
    pub id: SpawnerId,
    pub position: Position,
    pub config: SpawnerConfigView,
    pub drone_count: u32,
}

/// Movement constants the client mirrors for prediction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PhysicsConstants {
    pub max_speed: f64,
    pub velocity_lerp: f64,
    pub friction: f64,
    pub tick_rate: u32,
}

/// Sent once when a session is accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitPayload {
    pub username: String,
    pub realm: String,
    pub position: Position,
    pub physics: PhysicsConstants,
    pub realm_size: (f64, f64),
    pub gear: Gear,
    pub realm_config: RealmConfig,
}
