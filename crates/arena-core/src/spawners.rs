//! Static spawner type definitions.

use serde::Serialize;

use crate::enums::{DroneType, SpawnerKind};

/// Immutable spawner archetype.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpawnerType {
    pub kind: SpawnerKind,
    pub name: &'static str,
    /// Maximum live drones per tier. Tiers not listed have quota 0.
    pub quota: &'static [(DroneType, u32)],
    /// Drones appear within this radius of the spawner.
    pub spawn_radius: f64,
    /// Minimum seconds between spawns of the same tier.
    pub spawn_interval_secs: f64,
    /// Other spawners within this range may receive excess drones.
    pub transfer_range: f64,
}

impl SpawnerType {
    pub fn quota_for(&self, drone_type: DroneType) -> u32 {
        self.quota
            .iter()
            .find(|(t, _)| *t == drone_type)
            .map_or(0, |(_, n)| *n)
    }
}

static HIVE: SpawnerType = SpawnerType {
    kind: SpawnerKind::Hive,
    name: "Drone Hive",
    quota: &[(DroneType::L1, 8), (DroneType::L2, 2)],
    spawn_radius: 150.0,
    spawn_interval_secs: 5.0,
    transfer_range: 900.0,
};

static NEST: SpawnerType = SpawnerType {
    kind: SpawnerKind::Nest,
    name: "Drone Nest",
    quota: &[(DroneType::L1, 12), (DroneType::L3, 1)],
    spawn_radius: 200.0,
    spawn_interval_secs: 4.0,
    transfer_range: 900.0,
};

/// Definition for a spawner kind.
pub fn spawner_type(kind: SpawnerKind) -> &'static SpawnerType {
    match kind {
        SpawnerKind::Hive => &HIVE,
        SpawnerKind::Nest => &NEST,
    }
}
