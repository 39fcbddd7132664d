//! Entity spawn factories for the initial world.
//!
//! Places the fixed spawners and seeds each with its starting population.

use std::collections::{BTreeMap, BTreeSet};

use rand_chacha::ChaCha8Rng;

use arena_core::components::{Spawner, SpawnerId};
use arena_core::enums::{DroneType, SpawnerKind};
use arena_core::spawners::spawner_type;
use arena_core::types::Position;

use crate::registry::Registry;
use crate::systems::spawner::spawn_drone;

/// Fixed spawner placements: (kind, realm, x, y).
const SPAWNER_LAYOUT: [(SpawnerKind, &str, f64, f64); 2] = [
    (SpawnerKind::Hive, "nexus", -500.0, -450.0),
    (SpawnerKind::Nest, "nexus", 300.0, -450.0),
];

/// Place spawners and their initial drones.
pub fn setup_world(registry: &mut Registry, rng: &mut ChaCha8Rng, now: f64) {
    for (kind, realm, x, y) in SPAWNER_LAYOUT {
        if registry.realm(realm).is_none() {
            continue;
        }
        let id = spawn_spawner(registry, kind, realm, Position::new(x, y), now);
        populate(registry, rng, id, now);
    }
}

/// Create a spawner with every tier's spawn timer starting at `now`.
pub fn spawn_spawner(
    registry: &mut Registry,
    kind: SpawnerKind,
    realm: &str,
    position: Position,
    now: f64,
) -> SpawnerId {
    let id = registry.allocate_spawner_id();
    let last_spawn: BTreeMap<DroneType, f64> = DroneType::ALL.iter().map(|t| (*t, now)).collect();
    registry.insert_spawner(
        Spawner {
            id,
            kind,
            realm: realm.to_string(),
            owned: BTreeSet::new(),
            last_spawn,
        },
        position,
    )
}

/// Fill a spawner to quota with drones placed on a ring inside its radius.
fn populate(registry: &mut Registry, rng: &mut ChaCha8Rng, spawner: SpawnerId, now: f64) {
    let Some(entity) = registry.spawner(spawner) else {
        return;
    };
    let Ok((kind, realm, center)) = registry
        .world
        .query_one_mut::<(&Spawner, &Position)>(entity)
        .map(|(s, p)| (s.kind, s.realm.clone(), *p))
    else {
        return;
    };
    let def = spawner_type(kind);

    let total: u32 = def.quota.iter().map(|(_, n)| n).sum();
    let mut index = 0u32;
    for &(drone_type, count) in def.quota {
        for _ in 0..count {
            let angle = std::f64::consts::TAU * index as f64 / total.max(1) as f64;
            let at = center.offset(angle, def.spawn_radius * 0.5);
            spawn_drone(registry, rng, drone_type, &realm, at, Some(spawner), now);
            index += 1;
        }
    }
}
