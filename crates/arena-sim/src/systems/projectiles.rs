//! Projectile system: kinematics, expiry, collision and damage.
//!
//! Expired or out-of-bounds projectiles are removed before any collision
//! check. A projectile hits at most one target: the nearest within the hit
//! radius, ties going to the lowest id.

use hecs::Entity;
use tracing::{debug, info};

use arena_core::components::*;
use arena_core::constants::PROJECTILE_HIT_RADIUS;
use arena_core::events::{Outbound, ServerEvent};
use arena_core::types::{Position, Velocity};

use crate::registry::Registry;
use crate::systems::weapons;

/// A candidate hit. Drones order before players at equal distance.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Target {
    Mob(MobId),
    Player(String),
}

struct Flight {
    entity: Entity,
    id: ProjectileId,
    owner: ProjectileOwner,
    realm: String,
    position: Position,
    damage: f64,
}

/// Advance, expire and resolve collisions for every projectile.
pub fn run(registry: &mut Registry, dt: f64, despawn_buffer: &mut Vec<Entity>, events: &mut Vec<Outbound>) {
    despawn_buffer.clear();

    let bounds: Vec<(String, f64, f64)> = registry
        .realms()
        .iter()
        .map(|r| (r.name.clone(), r.half_width(), r.half_height()))
        .collect();

    let mut flights: Vec<Flight> = Vec::new();
    for (entity, (projectile, pos, vel)) in registry
        .world
        .query_mut::<(&mut Projectile, &mut Position, &Velocity)>()
    {
        pos.x += vel.x * dt;
        pos.y += vel.y * dt;
        projectile.lifetime_secs -= dt;

        let inside = bounds
            .iter()
            .find(|(name, _, _)| *name == projectile.realm)
            .is_some_and(|(_, hw, hh)| pos.within_half_extents(*hw, *hh));

        if projectile.lifetime_secs <= 0.0 || !inside {
            despawn_buffer.push(entity);
            continue;
        }

        flights.push(Flight {
            entity,
            id: projectile.id,
            owner: projectile.owner.clone(),
            realm: projectile.realm.clone(),
            position: *pos,
            damage: projectile.damage,
        });
    }

    flights.sort_by_key(|f| f.id);

    for flight in flights {
        let Some(target) = find_target(registry, &flight) else {
            continue;
        };
        despawn_buffer.push(flight.entity);
        match target {
            Target::Mob(id) => damage_mob(registry, id, &flight),
            Target::Player(name) => damage_player(registry, &name, flight.damage, events),
        }
    }

    for entity in despawn_buffer.drain(..) {
        let _ = registry.world.despawn(entity);
    }
}

/// Nearest opposing target within the hit radius.
fn find_target(registry: &Registry, flight: &Flight) -> Option<Target> {
    let pvp = registry
        .realm(&flight.realm)
        .is_some_and(|r| r.features.pvp);
    let mut best: Option<(f64, Target)> = None;
    let mut consider = |distance: f64, target: Target| {
        if distance > PROJECTILE_HIT_RADIUS {
            return;
        }
        let better = match &best {
            None => true,
            Some((d, t)) => distance < *d || (distance == *d && target < *t),
        };
        if better {
            best = Some((distance, target));
        }
    };

    match &flight.owner {
        ProjectileOwner::Player(shooter) => {
            for (_, (mob, pos)) in registry.world.query::<(&Mob, &Position)>().iter() {
                if mob.realm == flight.realm {
                    consider(pos.distance_to(&flight.position), Target::Mob(mob.id));
                }
            }
            if pvp {
                for (_, (player, pos)) in registry.world.query::<(&Player, &Position)>().iter() {
                    if player.realm == flight.realm && player.username != *shooter {
                        consider(
                            pos.distance_to(&flight.position),
                            Target::Player(player.username.clone()),
                        );
                    }
                }
            }
        }
        ProjectileOwner::Drone(_) => {
            let realm = registry.realm(&flight.realm);
            for (_, (player, pos)) in registry.world.query::<(&Player, &Position)>().iter() {
                let sheltered = realm.is_some_and(|r| r.in_safe_zone(pos));
                if player.realm == flight.realm && !sheltered {
                    consider(
                        pos.distance_to(&flight.position),
                        Target::Player(player.username.clone()),
                    );
                }
            }
        }
    }

    best.map(|(_, target)| target)
}

fn damage_mob(registry: &mut Registry, id: MobId, flight: &Flight) {
    let Some(entity) = registry.mob(id) else {
        return;
    };
    let dead = match registry.world.get::<&mut Mob>(entity) {
        Ok(mut mob) => {
            mob.health -= flight.damage;
            if mob.target.is_none() {
                if let ProjectileOwner::Player(shooter) = &flight.owner {
                    mob.target = Some(shooter.clone());
                }
            }
            mob.health <= 0.0
        }
        Err(_) => false,
    };

    if dead {
        if let Some(mob) = registry.remove_mob(id) {
            debug!(
                mob = id.0,
                drone_type = mob.drone_type.as_str(),
                spawner = ?mob.spawner.map(|s| s.0),
                "drone destroyed"
            );
        }
    }
}

fn damage_player(registry: &mut Registry, username: &str, damage: f64, events: &mut Vec<Outbound>) {
    let Some(entity) = registry.player(username) else {
        return;
    };
    let spawn_of = |realm: &str| registry.realm_or_default(realm).map(|r| r.spawn).unwrap_or_default();

    let downed_in = match registry.world.get::<&mut Player>(entity) {
        Ok(mut player) => {
            player.health -= damage;
            (player.health <= 0.0).then(|| player.realm.clone())
        }
        Err(_) => None,
    };
    let Some(realm) = downed_in else {
        return;
    };
    let spawn = spawn_of(&realm);

    if let Ok((player, pos, vel, energy, weapons)) = registry.world.query_one_mut::<(
        &mut Player,
        &mut Position,
        &mut Velocity,
        &mut Energy,
        &mut WeaponState,
    )>(entity)
    {
        player.health = player.max_health;
        *pos = spawn;
        *vel = Velocity::default();
        weapons::reset(energy, weapons);
    }

    info!(player = username, realm = %realm, "player downed, respawning");
    events.push(Outbound::player(
        username,
        ServerEvent::Respawned {
            realm,
            x: spawn.x,
            y: spawn.y,
        },
    ));
}
