//! Snapshot system: builds one RealmSnapshot per realm from the world.
//!
//! Read-only; runs after every other system so snapshots only ever show a
//! fully-updated tick.

use arena_core::components::*;
use arena_core::realms::RealmConfig;
use arena_core::spawners::spawner_type;
use arena_core::state::*;
use arena_core::types::{Position, SimTime, Velocity};

use arena_drone_ai::brain::Brain;

use crate::registry::Registry;

/// Build snapshots for every realm.
pub fn build_snapshots(registry: &Registry, time: &SimTime) -> Vec<RealmSnapshot> {
    registry
        .realms()
        .iter()
        .map(|realm| build_snapshot(registry, realm, time))
        .collect()
}

/// Build the snapshot for a single realm.
pub fn build_snapshot(registry: &Registry, realm: &RealmConfig, time: &SimTime) -> RealmSnapshot {
    RealmSnapshot {
        time: *time,
        realm: realm.name.clone(),
        players: build_players(registry, &realm.name),
        projectiles: build_projectiles(registry, &realm.name),
        mobs: build_mobs(registry, &realm.name),
        spawners: build_spawners(registry, &realm.name),
        portals: realm.portals.clone(),
    }
}

fn build_players(registry: &Registry, realm: &str) -> Vec<PlayerView> {
    registry
        .members(realm)
        .filter_map(|name| registry.player(name))
        .filter_map(|entity| {
            let mut query = registry
                .world
                .query_one::<(&Player, &Position, &Velocity, &Energy)>(entity)
                .ok()?;
            let (player, pos, vel, energy) = query.get()?;
            Some(PlayerView {
                username: player.username.clone(),
                position: *pos,
                velocity: *vel,
                angle: player.input.angle,
                health: player.health,
                max_health: player.max_health,
                energy: energy.current,
                max_energy: energy.max,
                active_hotbar: player.active_hotbar,
                gear: player.gear.clone(),
            })
        })
        .collect()
}

fn build_projectiles(registry: &Registry, realm: &str) -> Vec<ProjectileView> {
    let mut projectiles: Vec<ProjectileView> = registry
        .world
        .query::<(&Projectile, &Position, &Velocity)>()
        .iter()
        .filter(|(_, (p, _, _))| p.realm == realm)
        .map(|(_, (p, pos, vel))| ProjectileView {
            id: p.id,
            owner: p.owner.clone(),
            position: *pos,
            velocity: *vel,
        })
        .collect();
    projectiles.sort_by_key(|p| p.id);
    projectiles
}

fn build_mobs(registry: &Registry, realm: &str) -> Vec<MobView> {
    registry
        .mob_ids()
        .into_iter()
        .filter_map(|id| registry.mob(id))
        .filter_map(|entity| {
            let mut query = registry
                .world
                .query_one::<(&Mob, &Position, &Velocity, &Brain)>(entity)
                .ok()?;
            let (mob, pos, vel, brain) = query.get()?;
            (mob.realm == realm).then(|| MobView {
                id: mob.id,
                drone_type: mob.drone_type,
                position: *pos,
                velocity: *vel,
                health: mob.health,
                max_health: mob.max_health,
                state: brain.state(),
                target: mob.target.clone(),
                spawner: mob.spawner,
            })
        })
        .collect()
}

fn build_spawners(registry: &Registry, realm: &str) -> Vec<SpawnerView> {
    registry
        .spawner_ids()
        .into_iter()
        .filter_map(|id| registry.spawner(id))
        .filter_map(|entity| {
            let mut query = registry.world.query_one::<(&Spawner, &Position)>(entity).ok()?;
            let (spawner, pos) = query.get()?;
            if spawner.realm != realm {
                return None;
            }
            let def = spawner_type(spawner.kind);
            Some(SpawnerView {
                id: spawner.id,
                position: *pos,
                config: SpawnerConfigView {
                    kind: def.kind,
                    name: def.name.to_string(),
                    quota: def.quota.to_vec(),
                    spawn_radius: def.spawn_radius,
                    transfer_range: def.transfer_range,
                },
                drone_count: spawner
                    .owned
                    .iter()
                    .filter(|id| registry.mob(**id).is_some())
                    .count() as u32,
            })
        })
        .collect()
}
