//! Weapon and energy economy.
//!
//! Fire requests are resolved at the tick boundary; shots are produced by
//! [`run`] from per-player cadence state so bursts and automatic fire are
//! independent of how often clients send events. Energy regenerates in
//! fixed quanta while the player is not firing.

use arena_core::components::{BurstState, Energy, Player, ProjectileOwner, WeaponState};
use arena_core::constants::*;
use arena_core::events::{Outbound, ServerEvent};
use arena_core::items::{self, WeaponStats};
use arena_core::types::{Position, Velocity};

use crate::registry::Registry;

/// Tolerance for comparing accumulated float energy and timestamps.
const EPSILON: f64 = 1e-9;

/// Result of a fire-start request. Failures are expected steady-state
/// outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// A burst was scheduled.
    BurstStarted,
    /// The automatic trigger is now held.
    TriggerHeld,
    /// Already bursting or holding the trigger.
    AlreadyFiring,
    NoWeapon,
    InsufficientEnergy,
    CoolingDown,
    UnknownPlayer,
}

/// A shot produced this tick.
struct Shot {
    username: String,
    realm: String,
    origin: Position,
    angle: f64,
    at: f64,
    stats: WeaponStats,
}

/// The weapon a player fires: the active hotbar item if it is a weapon,
/// otherwise the first weapon on the hotbar.
pub fn active_weapon(player: &Player) -> Option<(&'static str, WeaponStats)> {
    let weapon_in = |slot: &Option<arena_core::gear::ItemRef>| {
        slot.as_ref()
            .and_then(|item| items::item(&item.id))
            .and_then(|def| def.weapon.map(|w| (def.id, w)))
    };
    player
        .gear
        .hotbar
        .get(player.active_hotbar)
        .and_then(weapon_in)
        .or_else(|| player.gear.hotbar.iter().find_map(weapon_in))
}

/// Handle a fire-start request.
pub fn fire_start(registry: &mut Registry, username: &str, now: f64) -> FireOutcome {
    let Some(entity) = registry.player(username) else {
        return FireOutcome::UnknownPlayer;
    };
    let Ok((player, energy, weapons)) = registry
        .world
        .query_one_mut::<(&Player, &Energy, &mut WeaponState)>(entity)
    else {
        return FireOutcome::UnknownPlayer;
    };

    let Some((item_id, stats)) = active_weapon(player) else {
        return FireOutcome::NoWeapon;
    };
    if weapons.burst.is_some() || weapons.trigger_held {
        return FireOutcome::AlreadyFiring;
    }
    if energy.current + EPSILON < stats.cost.resolve(energy.max) {
        return FireOutcome::InsufficientEnergy;
    }

    if stats.automatic {
        let earliest = weapons
            .last_shot_at
            .map_or(now, |t| t + stats.auto_interval_secs());
        weapons.trigger_held = true;
        weapons.auto_next_at = earliest.max(now);
        FireOutcome::TriggerHeld
    } else {
        if now + EPSILON < weapons.cooldown_until {
            return FireOutcome::CoolingDown;
        }
        weapons.burst = Some(BurstState {
            item_id: item_id.to_string(),
            remaining: stats.burst_shots.max(1),
            next_shot_at: now,
        });
        FireOutcome::BurstStarted
    }
}

/// Release the automatic trigger. A running burst is not cancelled.
pub fn fire_stop(registry: &mut Registry, username: &str) {
    let Some(entity) = registry.player(username) else {
        return;
    };
    if let Ok(mut weapons) = registry.world.get::<&mut WeaponState>(entity) {
        weapons.trigger_held = false;
    }
}

/// Produce due shots, regenerate energy and emit energy status events.
pub fn run(
    registry: &mut Registry,
    now: f64,
    dt: f64,
    status_interval_secs: f64,
    events: &mut Vec<Outbound>,
) {
    let mut shots: Vec<Shot> = Vec::new();

    for (_entity, (player, pos, energy, weapons)) in registry
        .world
        .query_mut::<(&Player, &Position, &mut Energy, &mut WeaponState)>()
    {
        let fire = |at: f64, stats: WeaponStats| Shot {
            username: player.username.clone(),
            realm: player.realm.clone(),
            origin: *pos,
            angle: player.input.angle,
            at,
            stats,
        };

        if let Some(burst) = weapons.burst.take() {
            run_burst(burst, energy, weapons, now, &mut |at, stats| shots.push(fire(at, stats)));
        }

        if weapons.trigger_held {
            match active_weapon(player) {
                Some((_, stats)) if stats.automatic => {
                    let cost = stats.cost.resolve(energy.max);
                    while weapons.auto_next_at <= now + EPSILON {
                        if energy.current + EPSILON < cost {
                            weapons.trigger_held = false;
                            break;
                        }
                        energy.current = (energy.current - cost).max(0.0);
                        weapons.last_shot_at = Some(weapons.auto_next_at);
                        shots.push(fire(weapons.auto_next_at, stats));
                        weapons.auto_next_at += stats.auto_interval_secs();
                    }
                }
                _ => weapons.trigger_held = false,
            }
        }

        let firing = weapons.burst.is_some() || weapons.trigger_held;
        regenerate(energy, firing, dt);

        if now + EPSILON >= energy.next_status_at {
            energy.next_status_at = now + status_interval_secs;
            events.push(Outbound::player(
                &player.username,
                ServerEvent::Energy {
                    value: normalized(energy),
                    depleted: energy.current <= 0.0,
                },
            ));
        }
    }

    for shot in shots {
        let velocity = Velocity::from_angle(shot.angle, shot.stats.projectile_speed);
        registry.spawn_projectile(
            ProjectileOwner::Player(shot.username.clone()),
            &shot.realm,
            shot.origin,
            velocity,
            shot.stats.damage,
            PROJECTILE_LIFETIME_SECS,
        );
        events.push(Outbound::player(
            &shot.username,
            ServerEvent::Fired {
                angle: shot.angle,
                at: shot.at,
            },
        ));
    }
}

/// Fire every burst shot scheduled at or before `now`. Shots are stamped
/// with their scheduled time so spacing is exact regardless of tick phase.
fn run_burst(
    mut burst: BurstState,
    energy: &mut Energy,
    weapons: &mut WeaponState,
    now: f64,
    emit: &mut dyn FnMut(f64, WeaponStats),
) {
    let Some(stats) = items::item(&burst.item_id).and_then(|def| def.weapon) else {
        return;
    };
    let cost = stats.cost.resolve(energy.max);

    while burst.remaining > 0 && burst.next_shot_at <= now + EPSILON {
        if energy.current + EPSILON < cost {
            burst.remaining = 0;
            break;
        }
        energy.current = (energy.current - cost).max(0.0);
        weapons.last_shot_at = Some(burst.next_shot_at);
        emit(burst.next_shot_at, stats);
        burst.remaining -= 1;
        burst.next_shot_at += BURST_SHOT_DELAY_SECS;
    }

    if burst.remaining == 0 {
        let last = weapons.last_shot_at.unwrap_or(now);
        weapons.cooldown_until = last + stats.burst_cooldown_secs();
    } else {
        weapons.burst = Some(burst);
    }
}

/// Linear regeneration in fixed quanta, suspended while firing.
pub fn regenerate(energy: &mut Energy, firing: bool, dt: f64) {
    if firing || energy.current >= energy.max {
        energy.regen_accum_secs = 0.0;
        energy.current = energy.current.min(energy.max);
        return;
    }

    energy.regen_accum_secs += dt.max(0.0);
    while energy.regen_accum_secs + EPSILON >= ENERGY_REGEN_STEP_SECS {
        energy.regen_accum_secs -= ENERGY_REGEN_STEP_SECS;
        energy.current = (energy.current + energy.regen_per_sec * ENERGY_REGEN_STEP_SECS).min(energy.max);
        if energy.current >= energy.max {
            energy.regen_accum_secs = 0.0;
            break;
        }
    }
}

/// Energy as a 0..=1 fraction of capacity.
pub fn normalized(energy: &Energy) -> f64 {
    if energy.max > 0.0 {
        (energy.current / energy.max).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Refill energy and clear any firing state.
pub fn reset(energy: &mut Energy, weapons: &mut WeaponState) {
    energy.current = energy.max;
    energy.regen_accum_secs = 0.0;
    *weapons = WeaponState::default();
}
