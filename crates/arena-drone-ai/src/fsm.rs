//! Drone behavior finite state machine.
//!
//! Evaluated once per drone per tick. Health thresholds are checked first
//! (retreat, then regroup); otherwise the current behavior runs and may
//! request a transition. No ECS dependency; operates on plain data and an
//! injected RNG so tests can drive it deterministically.

use std::f64::consts::{FRAC_PI_2, TAU};

use glam::DVec2;
use rand::Rng;

use arena_core::constants::*;
use arena_core::enums::{DroneType, MobState};
use arena_core::types::{Position, Velocity};

use crate::brain::{AdvancedPhase, Behavior, Brain, FlankManeuver, PatrolLeg};
use crate::profiles::{get_profile, DroneProfile};

/// Input to the FSM for a single drone.
pub struct DroneContext {
    pub drone_type: DroneType,
    pub position: Position,
    pub velocity: Velocity,
    pub health: f64,
    pub max_health: f64,
    /// Intelligence trait, selects the flank variant.
    pub intelligence: f64,
    /// Position of the current target, if it still resolves in this realm.
    pub target: Option<Position>,
    /// Position of the owning spawner.
    pub home: Option<Position>,
    /// Nearest other drone within ally search radius.
    pub nearest_ally: Option<Position>,
    /// Current sim time.
    pub now: f64,
    pub dt: f64,
}

/// Output from the FSM.
#[derive(Debug, Clone, PartialEq)]
pub struct DroneUpdate {
    pub velocity: Velocity,
    /// Facing angle in radians, if it changed.
    pub facing: Option<f64>,
    /// Angle of a shot fired this tick.
    pub fire: Option<f64>,
    /// The target is lost and should be forgotten.
    pub clear_target: bool,
    /// Health recovered this tick.
    pub heal: f64,
    pub state_changed: bool,
}

impl DroneUpdate {
    fn moving(velocity: Velocity) -> Self {
        Self {
            velocity,
            facing: (velocity.speed() > 0.0).then(|| velocity.heading()),
            fire: None,
            clear_target: false,
            heal: 0.0,
            state_changed: false,
        }
    }
}

/// Roll a new patrol leg. Drones beyond the leash head back home.
pub fn new_patrol_leg<R: Rng + ?Sized>(
    position: Position,
    home: Option<Position>,
    now: f64,
    rng: &mut R,
) -> PatrolLeg {
    let heading = match home {
        Some(home) if position.distance_to(&home) > PATROL_LEASH => position.angle_to(&home),
        _ => rng.gen_range(0.0..TAU),
    };
    PatrolLeg {
        heading,
        remaining: rng.gen_range(PATROL_LEG_MIN..=PATROL_LEG_MAX),
        decide_at: now + rng.gen_range(PATROL_DECISION_MIN_SECS..=PATROL_DECISION_MAX_SECS),
    }
}

/// Evaluate the FSM for one drone, mutating its brain in place.
pub fn evaluate<R: Rng + ?Sized>(brain: &mut Brain, ctx: &DroneContext, rng: &mut R) -> DroneUpdate {
    let profile = get_profile(ctx.drone_type);
    let before = brain.state();

    let mut update = match forced_transition(brain, ctx, &profile) {
        Some(update) => update,
        None => run_behavior(brain, ctx, &profile, rng),
    };

    update.state_changed = brain.state() != before;
    update
}

/// Health-threshold overrides. Returns the entry update if one fired.
fn forced_transition(
    brain: &mut Brain,
    ctx: &DroneContext,
    profile: &DroneProfile,
) -> Option<DroneUpdate> {
    let ratio = if ctx.max_health > 0.0 {
        ctx.health / ctx.max_health
    } else {
        0.0
    };
    let prev = brain.prev_health_ratio;
    brain.prev_health_ratio = ratio;
    let state = brain.state();

    if let Some(retreat) = profile.retreat_threshold {
        let crossed = prev > retreat;
        if ratio <= retreat && state != MobState::Retreat && (crossed || state != MobState::Regroup) {
            brain.behavior = Behavior::Retreat;
            let velocity = match ctx.target {
                Some(target) => flee(ctx.position, target, profile.boosted_speed()),
                None => ctx.velocity,
            };
            return Some(DroneUpdate::moving(velocity));
        }
        if ratio <= retreat {
            return None;
        }
    }

    if let Some(regroup) = profile.regroup_threshold {
        if ratio <= regroup && !matches!(state, MobState::Retreat | MobState::Regroup) {
            brain.behavior = Behavior::Regroup {
                until: ctx.now + REGROUP_DURATION_SECS,
            };
            return Some(DroneUpdate::moving(decay(ctx.velocity)));
        }
    }

    None
}

fn run_behavior<R: Rng + ?Sized>(
    brain: &mut Brain,
    ctx: &DroneContext,
    profile: &DroneProfile,
    rng: &mut R,
) -> DroneUpdate {
    match brain.behavior.clone() {
        Behavior::Patrol(leg) => run_patrol(brain, leg, ctx, profile, rng),
        Behavior::Idle { until } => run_idle(brain, until, ctx, profile, rng),
        Behavior::Chase => run_chase(brain, ctx, profile, rng),
        Behavior::Attack => run_attack(brain, ctx, profile, rng),
        Behavior::Retreat => run_retreat(brain, ctx, profile),
        Behavior::Regroup { until } => run_regroup(brain, until, ctx, rng),
        Behavior::Flank {
            started_at,
            maneuver,
        } => run_flank(brain, started_at, maneuver, ctx, profile, rng),
    }
}

fn run_patrol<R: Rng + ?Sized>(
    brain: &mut Brain,
    mut leg: PatrolLeg,
    ctx: &DroneContext,
    profile: &DroneProfile,
    rng: &mut R,
) -> DroneUpdate {
    if let Some(target) = ctx.target {
        brain.behavior = Behavior::Chase;
        return DroneUpdate::moving(seek(ctx.position, target, profile.speed));
    }

    if ctx.now >= leg.decide_at || leg.remaining <= 0.0 {
        if rng.gen_bool(0.5) {
            brain.behavior = Behavior::Idle {
                until: ctx.now + rng.gen_range(IDLE_MIN_SECS..=IDLE_MAX_SECS),
            };
            return DroneUpdate::moving(decay(ctx.velocity));
        }
        leg = new_patrol_leg(ctx.position, ctx.home, ctx.now, rng);
    }

    let velocity = Velocity::from_angle(leg.heading, profile.speed);
    leg.remaining -= profile.speed * ctx.dt;
    brain.behavior = Behavior::Patrol(leg);
    DroneUpdate::moving(velocity)
}

fn run_idle<R: Rng + ?Sized>(
    brain: &mut Brain,
    until: f64,
    ctx: &DroneContext,
    profile: &DroneProfile,
    rng: &mut R,
) -> DroneUpdate {
    if let Some(target) = ctx.target {
        brain.behavior = Behavior::Chase;
        return DroneUpdate::moving(seek(ctx.position, target, profile.speed));
    }

    if ctx.now >= until {
        let leg = new_patrol_leg(ctx.position, ctx.home, ctx.now, rng);
        let velocity = Velocity::from_angle(leg.heading, profile.speed);
        brain.behavior = Behavior::Patrol(leg);
        return DroneUpdate::moving(velocity);
    }

    DroneUpdate::moving(decay(ctx.velocity))
}

fn run_chase<R: Rng + ?Sized>(
    brain: &mut Brain,
    ctx: &DroneContext,
    profile: &DroneProfile,
    rng: &mut R,
) -> DroneUpdate {
    let Some(target) = ctx.target else {
        return lose_target(brain, ctx, rng);
    };

    let distance = ctx.position.distance_to(&target);
    if distance > profile.detection_range * LOSE_TARGET_RANGE_FACTOR {
        return lose_target(brain, ctx, rng);
    }

    if distance <= profile.attack_range {
        brain.behavior = Behavior::Attack;
        let mut update = DroneUpdate::moving(decay(ctx.velocity));
        update.facing = Some(ctx.position.angle_to(&target));
        return update;
    }

    DroneUpdate::moving(seek(ctx.position, target, profile.speed))
}

fn run_attack<R: Rng + ?Sized>(
    brain: &mut Brain,
    ctx: &DroneContext,
    profile: &DroneProfile,
    rng: &mut R,
) -> DroneUpdate {
    let Some(target) = ctx.target else {
        return lose_target(brain, ctx, rng);
    };

    if ctx.position.distance_to(&target) > profile.attack_range {
        brain.behavior = Behavior::Chase;
        return DroneUpdate::moving(seek(ctx.position, target, profile.speed));
    }

    let aim = ctx.position.angle_to(&target);
    let mut update = DroneUpdate::moving(decay(ctx.velocity));
    update.facing = Some(aim);

    let ready = brain
        .last_shot_at
        .map_or(true, |last| ctx.now - last >= profile.attack_cooldown_secs);
    if ready {
        update.fire = Some(aim);
        brain.last_shot_at = Some(ctx.now);

        if profile.flank_chance > 0.0 && rng.gen_bool(profile.flank_chance) {
            brain.behavior = Behavior::Flank {
                started_at: ctx.now,
                maneuver: begin_flank(ctx, rng),
            };
        }
    }

    update
}

fn run_retreat(brain: &mut Brain, ctx: &DroneContext, profile: &DroneProfile) -> DroneUpdate {
    let escaped = match ctx.target {
        Some(target) => {
            ctx.position.distance_to(&target)
                > profile.detection_range * RETREAT_ESCAPE_RANGE_FACTOR
        }
        None => true,
    };

    if escaped {
        brain.behavior = Behavior::Regroup {
            until: ctx.now + REGROUP_DURATION_SECS,
        };
        return DroneUpdate::moving(decay(ctx.velocity));
    }

    let target = ctx.target.unwrap_or(ctx.position);
    DroneUpdate::moving(flee(ctx.position, target, profile.boosted_speed()))
}

fn run_regroup<R: Rng + ?Sized>(
    brain: &mut Brain,
    until: f64,
    ctx: &DroneContext,
    rng: &mut R,
) -> DroneUpdate {
    if ctx.now >= until {
        let leg = new_patrol_leg(ctx.position, ctx.home, ctx.now, rng);
        brain.behavior = Behavior::Patrol(leg);
        return DroneUpdate::moving(decay(ctx.velocity));
    }

    let mut update = DroneUpdate::moving(decay(ctx.velocity));
    update.heal = (ctx.max_health * REGROUP_HEAL_PER_SEC * ctx.dt)
        .min((ctx.max_health - ctx.health).max(0.0));
    update
}

fn run_flank<R: Rng + ?Sized>(
    brain: &mut Brain,
    started_at: f64,
    maneuver: FlankManeuver,
    ctx: &DroneContext,
    profile: &DroneProfile,
    rng: &mut R,
) -> DroneUpdate {
    let Some(target) = ctx.target else {
        return lose_target(brain, ctx, rng);
    };

    if ctx.now - started_at >= FLANK_TIMEOUT_SECS {
        brain.behavior = Behavior::Attack;
        return DroneUpdate::moving(decay(ctx.velocity));
    }

    let (next, velocity) = match maneuver {
        FlankManeuver::Basic { side, until } => {
            if ctx.now >= until {
                brain.behavior = Behavior::Attack;
                return DroneUpdate::moving(decay(ctx.velocity));
            }
            let sidestep = ctx.position.angle_to(&target) + side * FRAC_PI_2;
            (
                FlankManeuver::Basic { side, until },
                Velocity::from_angle(sidestep, profile.speed),
            )
        }
        FlankManeuver::Advanced(phase) => {
            match advance_phase(phase, ctx, target, profile, rng) {
                Some((phase, velocity)) => (FlankManeuver::Advanced(phase), velocity),
                None => {
                    brain.behavior = Behavior::Attack;
                    let mut update = DroneUpdate::moving(decay(ctx.velocity));
                    update.facing = Some(ctx.position.angle_to(&target));
                    return update;
                }
            }
        }
    };

    brain.behavior = Behavior::Flank {
        started_at,
        maneuver: next,
    };
    DroneUpdate::moving(velocity)
}

/// Step the advanced flank. `None` means the swoop is complete.
fn advance_phase<R: Rng + ?Sized>(
    phase: AdvancedPhase,
    ctx: &DroneContext,
    target: Position,
    profile: &DroneProfile,
    rng: &mut R,
) -> Option<(AdvancedPhase, Velocity)> {
    match phase {
        AdvancedPhase::Assessment { until } => {
            if ctx.now < until {
                return Some((
                    AdvancedPhase::Assessment { until },
                    flee(ctx.position, target, profile.speed),
                ));
            }
            let next = match ctx.nearest_ally {
                Some(ally) => AdvancedPhase::Cover {
                    point: cover_point(ally, target),
                    until: ctx.now + FLANK_COVER_MAX_SECS,
                },
                None => AdvancedPhase::Swooping {
                    path: swoop_path(ctx.position, target, profile.attack_range, rng),
                    next: 0,
                },
            };
            advance_phase(next, ctx, target, profile, rng)
        }
        AdvancedPhase::Cover { point, until } => {
            if ctx.now >= until || ctx.position.distance_to(&point) <= FLANK_ARRIVE_RADIUS {
                let path = swoop_path(ctx.position, target, profile.attack_range, rng);
                return advance_phase(AdvancedPhase::Swooping { path, next: 0 }, ctx, target, profile, rng);
            }
            Some((
                AdvancedPhase::Cover { point, until },
                seek(ctx.position, point, profile.speed),
            ))
        }
        AdvancedPhase::Swooping { path, mut next } => {
            while let Some(waypoint) = path.get(next) {
                if ctx.position.distance_to(waypoint) > FLANK_ARRIVE_RADIUS {
                    break;
                }
                next += 1;
            }
            let waypoint = *path.get(next)?;
            let velocity = seek(ctx.position, waypoint, profile.boosted_speed());
            Some((AdvancedPhase::Swooping { path, next }, velocity))
        }
    }
}

/// Pick the flank variant for this drone and build its opening state.
fn begin_flank<R: Rng + ?Sized>(ctx: &DroneContext, rng: &mut R) -> FlankManeuver {
    if ctx.intelligence >= ADVANCED_FLANK_INTELLIGENCE {
        FlankManeuver::Advanced(AdvancedPhase::Assessment {
            until: ctx.now + FLANK_ASSESS_SECS,
        })
    } else {
        FlankManeuver::Basic {
            side: if rng.gen_bool(0.5) { 1.0 } else { -1.0 },
            until: ctx.now + rng.gen_range(BASIC_FLANK_MIN_SECS..=BASIC_FLANK_MAX_SECS),
        }
    }
}

/// A point behind `ally` as seen from `target`.
pub fn cover_point(ally: Position, target: Position) -> Position {
    let away = (ally.as_dvec2() - target.as_dvec2()).normalize_or_zero();
    Position::from_dvec2(ally.as_dvec2() + away * FLANK_COVER_OFFSET)
}

/// Waypoints on an arc around `target`, starting from the drone's bearing
/// and sweeping in a random direction.
pub fn swoop_path<R: Rng + ?Sized>(
    from: Position,
    target: Position,
    attack_range: f64,
    rng: &mut R,
) -> Vec<Position> {
    let radius = attack_range * SWOOP_RADIUS_FACTOR;
    let start = target.angle_to(&from);
    let sweep = if rng.gen_bool(0.5) { SWOOP_ARC } else { -SWOOP_ARC };
    (1..=SWOOP_WAYPOINTS)
        .map(|i| target.offset(start + sweep * i as f64 / SWOOP_WAYPOINTS as f64, radius))
        .collect()
}

fn lose_target<R: Rng + ?Sized>(brain: &mut Brain, ctx: &DroneContext, rng: &mut R) -> DroneUpdate {
    let leg = new_patrol_leg(ctx.position, ctx.home, ctx.now, rng);
    brain.behavior = Behavior::Patrol(leg);
    let mut update = DroneUpdate::moving(decay(ctx.velocity));
    update.clear_target = true;
    update
}

/// Velocity of magnitude `speed` from `from` toward `to`.
fn seek(from: Position, to: Position, speed: f64) -> Velocity {
    let dir: DVec2 = (to.as_dvec2() - from.as_dvec2()).normalize_or_zero();
    Velocity::from_dvec2(dir * speed)
}

/// Velocity of magnitude `speed` from `from` directly away from `threat`.
fn flee(from: Position, threat: Position, speed: f64) -> Velocity {
    let mut dir = (from.as_dvec2() - threat.as_dvec2()).normalize_or_zero();
    if dir == DVec2::ZERO {
        dir = DVec2::X;
    }
    Velocity::from_dvec2(dir * speed)
}

fn decay(velocity: Velocity) -> Velocity {
    let v = velocity.as_dvec2() * DRONE_IDLE_DECAY;
    if v.length() < VELOCITY_EPSILON {
        Velocity::default()
    } else {
        Velocity::from_dvec2(v)
    }
}
