//! ECS components for hecs entities.
//!
//! Components are plain data. Game logic lives in systems, not components.
//! Cross-entity links are stable identifiers resolved through the registry.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::enums::{DroneType, SpawnerKind};
use crate::gear::Gear;

/// Stable drone identifier, assigned in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MobId(pub u32);

/// Stable spawner identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpawnerId(pub u32);

/// Stable projectile identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProjectileId(pub u64);

/// Directional intent and aim as last reported by the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    /// Aim angle in radians.
    pub angle: f64,
    /// Sim time of the last update.
    #[serde(skip)]
    pub updated_at: f64,
}

/// A connected player.
#[derive(Debug, Clone)]
pub struct Player {
    pub username: String,
    pub realm: String,
    pub input: PlayerInput,
    pub active_hotbar: usize,
    pub health: f64,
    pub max_health: f64,
    pub gear: Gear,
}

/// Depleting, regenerating resource gating weapon fire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Energy {
    pub current: f64,
    pub max: f64,
    pub regen_per_sec: f64,
    /// Idle time not yet converted into a regeneration quantum.
    pub regen_accum_secs: f64,
    /// Sim time of the next status event.
    pub next_status_at: f64,
}

/// A burst in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct BurstState {
    /// Weapon the burst was started with.
    pub item_id: String,
    /// Shots still to fire.
    pub remaining: u32,
    /// Scheduled time of the next shot.
    pub next_shot_at: f64,
}

/// Per-player weapon cadence state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeaponState {
    pub last_shot_at: Option<f64>,
    /// No new burst may begin before this time.
    pub cooldown_until: f64,
    /// Automatic trigger held.
    pub trigger_held: bool,
    /// Scheduled time of the next automatic shot.
    pub auto_next_at: f64,
    pub burst: Option<BurstState>,
}

/// Advisory personality weights in 0..=1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    pub courage: f64,
    pub aggression: f64,
    pub caution: f64,
    pub intelligence: f64,
    pub teamwork: f64,
}

/// An AI-controlled hostile drone.
#[derive(Debug, Clone)]
pub struct Mob {
    pub id: MobId,
    pub drone_type: DroneType,
    pub realm: String,
    pub health: f64,
    pub max_health: f64,
    pub personality: Personality,
    /// Owning spawner, if any.
    pub spawner: Option<SpawnerId>,
    /// Username of the current target.
    pub target: Option<String>,
    /// Facing angle in radians.
    pub facing: f64,
}

/// A stationary drone spawner.
#[derive(Debug, Clone)]
pub struct Spawner {
    pub id: SpawnerId,
    pub kind: SpawnerKind,
    pub realm: String,
    /// Live drones owned by this spawner.
    pub owned: BTreeSet<MobId>,
    /// Sim time of the last spawn per tier.
    pub last_spawn: BTreeMap<DroneType, f64>,
}

/// Who fired a projectile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ProjectileOwner {
    Player(String),
    Drone(MobId),
}

/// A transient projectile.
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: ProjectileId,
    pub owner: ProjectileOwner,
    pub damage: f64,
    pub lifetime_secs: f64,
    pub realm: String,
}
