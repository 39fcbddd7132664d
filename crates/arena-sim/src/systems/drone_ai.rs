//! Drone AI system: target acquisition, FSM evaluation and drone movement.
//!
//! Calls the FSM from arena-drone-ai for each drone, then applies the
//! resulting velocity, facing, healing and shots to the ECS.

use hecs::Entity;
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use arena_core::components::{Mob, MobId, Player, ProjectileOwner};
use arena_core::constants::{FLANK_ALLY_SEARCH_RADIUS, PROJECTILE_LIFETIME_SECS};
use arena_core::types::{Position, Velocity};

use arena_drone_ai::brain::Brain;
use arena_drone_ai::fsm::{evaluate, DroneContext, DroneUpdate};
use arena_drone_ai::profiles::get_profile;

use crate::registry::Registry;
use crate::systems::movement;

/// A player a drone could see.
struct Visible {
    username: String,
    realm: String,
    position: Position,
    sheltered: bool,
}

/// Run the drone AI for every live drone in id order.
pub fn run(registry: &mut Registry, rng: &mut ChaCha8Rng, now: f64, dt: f64) {
    let visible: Vec<Visible> = registry
        .players()
        .filter_map(|(_, entity)| {
            let player = registry.world.get::<&Player>(entity).ok()?;
            let position = *registry.world.get::<&Position>(entity).ok()?;
            let sheltered = registry
                .realm(&player.realm)
                .is_some_and(|r| r.in_safe_zone(&position));
            Some(Visible {
                username: player.username.clone(),
                realm: player.realm.clone(),
                position,
                sheltered,
            })
        })
        .collect();

    let drones: Vec<(MobId, Entity, String, Position)> = registry
        .mob_ids()
        .into_iter()
        .filter_map(|id| {
            let entity = registry.mob(id)?;
            let realm = registry.world.get::<&Mob>(entity).ok()?.realm.clone();
            let pos = *registry.world.get::<&Position>(entity).ok()?;
            Some((id, entity, realm, pos))
        })
        .collect();

    let mut updates: Vec<(Entity, DroneUpdate, Option<String>)> = Vec::with_capacity(drones.len());

    for (id, entity, realm, position) in &drones {
        let Ok((mob, velocity, brain)) = registry
            .world
            .query_one_mut::<(&Mob, &Velocity, &mut Brain)>(*entity)
        else {
            continue;
        };
        let mob = mob.clone();
        let velocity = *velocity;
        let mut brain = brain.clone();
        let profile = get_profile(mob.drone_type);

        let locate = |name: &String| {
            visible
                .iter()
                .find(|v| v.username == *name && v.realm == *realm && !v.sheltered)
                .map(|v| v.position)
        };
        let target_name = mob
            .target
            .clone()
            .filter(|name| locate(name).is_some())
            .or_else(|| acquire(&visible, realm, position, profile.detection_range));
        let target = target_name.as_ref().and_then(locate);

        let home = mob
            .spawner
            .and_then(|s| registry.spawner(s))
            .and_then(|e| registry.world.get::<&Position>(e).ok().map(|p| *p));

        let nearest_ally = drones
            .iter()
            .filter(|(other, _, other_realm, _)| other != id && other_realm == realm)
            .map(|(_, _, _, p)| *p)
            .filter(|p| p.distance_to(position) <= FLANK_ALLY_SEARCH_RADIUS)
            .min_by(|a, b| a.distance_to(position).total_cmp(&b.distance_to(position)));

        let ctx = DroneContext {
            drone_type: mob.drone_type,
            position: *position,
            velocity,
            health: mob.health,
            max_health: mob.max_health,
            intelligence: mob.personality.intelligence,
            target,
            home,
            nearest_ally,
            now,
            dt,
        };

        let update = evaluate(&mut brain, &ctx, rng);
        if update.state_changed {
            trace!(mob = id.0, state = ?brain.state(), "drone state change");
        }
        if let Ok(mut stored) = registry.world.get::<&mut Brain>(*entity) {
            *stored = brain;
        }

        let next_target = if update.clear_target { None } else { target_name };
        updates.push((*entity, update, next_target));
    }

    for (entity, update, target) in updates {
        apply(registry, entity, update, target, dt);
    }
}

/// Nearest unsheltered player in the realm within detection range.
fn acquire(visible: &[Visible], realm: &str, from: &Position, range: f64) -> Option<String> {
    visible
        .iter()
        .filter(|v| v.realm == realm && !v.sheltered)
        .map(|v| (v.position.distance_to(from), v))
        .filter(|(d, _)| *d <= range)
        .min_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.username.cmp(&b.1.username)))
        .map(|(_, v)| v.username.clone())
}

fn apply(registry: &mut Registry, entity: Entity, update: DroneUpdate, target: Option<String>, dt: f64) {
    let Ok((mob, pos, vel)) = registry
        .world
        .query_one_mut::<(&mut Mob, &mut Position, &mut Velocity)>(entity)
    else {
        return;
    };

    mob.target = target;
    mob.health = (mob.health + update.heal).min(mob.max_health);
    if let Some(facing) = update.facing {
        mob.facing = facing;
    }
    *vel = update.velocity;

    let shot = update.fire.map(|angle| (mob.id, mob.realm.clone(), *pos, angle, mob.drone_type));

    let realm = mob.realm.clone();
    let (hw, hh) = registry
        .realm(&realm)
        .map(|r| (r.half_width(), r.half_height()))
        .unwrap_or((f64::MAX, f64::MAX));
    if let Ok((pos, vel)) = registry
        .world
        .query_one_mut::<(&mut Position, &mut Velocity)>(entity)
    {
        movement::integrate(pos, vel, dt, hw, hh);
    }

    if let Some((id, realm, origin, angle, drone_type)) = shot {
        let profile = get_profile(drone_type);
        registry.spawn_projectile(
            ProjectileOwner::Drone(id),
            &realm,
            origin,
            Velocity::from_angle(angle, profile.projectile_speed),
            profile.projectile_damage,
            PROJECTILE_LIFETIME_SECS,
        );
    }
}
