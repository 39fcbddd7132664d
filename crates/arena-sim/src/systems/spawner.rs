//! Spawner manager: per-tier quotas, timed replacement spawns and
//! rebalancing of excess drones to nearby under-quota spawners.

use std::f64::consts::TAU;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use arena_core::components::{Mob, MobId, Spawner, SpawnerId};
use arena_core::enums::DroneType;
use arena_core::spawners::spawner_type;
use arena_core::types::Position;

use arena_drone_ai::brain::Brain;
use arena_drone_ai::fsm::new_patrol_leg;
use arena_drone_ai::profiles::{get_profile, roll_personality};

use crate::registry::Registry;

/// Run quota enforcement for every spawner in id order.
pub fn run(registry: &mut Registry, rng: &mut ChaCha8Rng, now: f64) {
    for spawner_id in registry.spawner_ids() {
        let Some((spawner, position)) = spawner_state(registry, spawner_id) else {
            continue;
        };
        let drones_enabled = registry
            .realm(&spawner.realm)
            .is_some_and(|r| r.features.drones);
        if !drones_enabled {
            continue;
        }
        let def = spawner_type(spawner.kind);

        for drone_type in DroneType::ALL {
            let quota = def.quota_for(drone_type);
            let owned = owned_of_type(registry, &spawner, drone_type);
            let count = owned.len() as u32;

            if count < quota {
                let due = spawner
                    .last_spawn
                    .get(&drone_type)
                    .map_or(true, |last| now - last + 1e-9 >= def.spawn_interval_secs);
                if due {
                    let at = random_point_within(position, def.spawn_radius, rng);
                    let at = registry
                        .realm(&spawner.realm)
                        .map_or(at, |r| r.clamp(at));
                    let id = spawn_drone(registry, rng, drone_type, &spawner.realm, at, Some(spawner_id), now);
                    if let Some(entity) = registry.spawner(spawner_id) {
                        if let Ok(mut s) = registry.world.get::<&mut Spawner>(entity) {
                            s.last_spawn.insert(drone_type, now);
                        }
                    }
                    debug!(spawner = spawner_id.0, mob = id.0, drone_type = drone_type.as_str(), "drone spawned");
                }
            } else if count > quota {
                // Highest id goes first.
                if let Some(&mob_id) = owned.last() {
                    if let Some(dest) = transfer_destination(registry, spawner_id, position, drone_type) {
                        transfer(registry, mob_id, spawner_id, dest);
                        debug!(mob = mob_id.0, from = spawner_id.0, to = dest.0, "drone transferred");
                    }
                }
            }
        }
    }
}

fn spawner_state(registry: &Registry, id: SpawnerId) -> Option<(Spawner, Position)> {
    let entity = registry.spawner(id)?;
    let spawner = (*registry.world.get::<&Spawner>(entity).ok()?).clone();
    let position = *registry.world.get::<&Position>(entity).ok()?;
    Some((spawner, position))
}

/// Live drones of one tier owned by a spawner, ascending by id.
fn owned_of_type(registry: &Registry, spawner: &Spawner, drone_type: DroneType) -> Vec<MobId> {
    spawner
        .owned
        .iter()
        .copied()
        .filter(|id| {
            registry
                .mob(*id)
                .and_then(|e| registry.world.get::<&Mob>(e).ok())
                .is_some_and(|m| m.drone_type == drone_type)
        })
        .collect()
}

/// Nearest other spawner within transfer range with spare quota for the tier.
fn transfer_destination(
    registry: &Registry,
    source: SpawnerId,
    origin: Position,
    drone_type: DroneType,
) -> Option<SpawnerId> {
    let (source_spawner, _) = spawner_state(registry, source)?;
    let range = spawner_type(source_spawner.kind).transfer_range;

    registry
        .spawner_ids()
        .into_iter()
        .filter(|id| *id != source)
        .filter_map(|id| spawner_state(registry, id).map(|(s, p)| (id, s, p)))
        .filter(|(_, s, _)| s.realm == source_spawner.realm)
        .map(|(id, s, p)| (id, s, p.distance_to(&origin)))
        .filter(|(_, _, distance)| *distance <= range)
        .filter(|(_, s, _)| {
            (owned_of_type(registry, s, drone_type).len() as u32) < spawner_type(s.kind).quota_for(drone_type)
        })
        .min_by(|a, b| a.2.total_cmp(&b.2).then_with(|| a.0.cmp(&b.0)))
        .map(|(id, _, _)| id)
}

/// Reassign ownership. Position and AI state are untouched.
pub fn transfer(registry: &mut Registry, mob: MobId, from: SpawnerId, to: SpawnerId) {
    if let Some(entity) = registry.spawner(from) {
        if let Ok(mut s) = registry.world.get::<&mut Spawner>(entity) {
            s.owned.remove(&mob);
        }
    }
    if let Some(entity) = registry.spawner(to) {
        if let Ok(mut s) = registry.world.get::<&mut Spawner>(entity) {
            s.owned.insert(mob);
        }
    }
    if let Some(entity) = registry.mob(mob) {
        if let Ok(mut m) = registry.world.get::<&mut Mob>(entity) {
            m.spawner = Some(to);
        }
    }
}

/// Uniform random point inside a circle.
fn random_point_within(center: Position, radius: f64, rng: &mut ChaCha8Rng) -> Position {
    let angle = rng.gen_range(0.0..TAU);
    let distance = radius * rng.gen::<f64>().sqrt();
    center.offset(angle, distance)
}

/// Create a drone with a rolled personality and register it with its spawner.
pub fn spawn_drone(
    registry: &mut Registry,
    rng: &mut ChaCha8Rng,
    drone_type: DroneType,
    realm: &str,
    position: Position,
    owner: Option<SpawnerId>,
    now: f64,
) -> MobId {
    let profile = get_profile(drone_type);
    let id = registry.allocate_mob_id();
    let personality = roll_personality(drone_type, rng);
    let home = owner
        .and_then(|s| registry.spawner(s))
        .and_then(|e| registry.world.get::<&Position>(e).ok().map(|p| *p));
    let brain = Brain::new(new_patrol_leg(position, home, now, rng));

    registry.insert_mob(
        Mob {
            id,
            drone_type,
            realm: realm.to_string(),
            health: profile.max_health,
            max_health: profile.max_health,
            personality,
            spawner: owner,
            target: None,
            facing: 0.0,
        },
        position,
        brain,
    );

    if let Some(entity) = owner.and_then(|s| registry.spawner(s)) {
        if let Ok(mut s) = registry.world.get::<&mut Spawner>(entity) {
            s.owned.insert(id);
        }
    }
    id
}
