//! Tests for the simulation engine, systems, gear validator and sessions.

use hecs::Entity;

use arena_core::commands::{PlayerAction, PlayerCommand};
use arena_core::components::*;
use arena_core::constants::*;
use arena_core::enums::*;
use arena_core::error::{GearError, SessionError};
use arena_core::events::{Outbound, Recipient, ServerEvent};
use arena_core::gear::{Gear, GearRef, ItemRef};
use arena_core::items::{BACKPACK_TIER1, PISTOL_A, RIFLE_A};
use arena_core::records::PlayerRecord;
use arena_core::types::{Position, Velocity};

use arena_drone_ai::brain::Brain;

use crate::engine::{SimConfig, SimulationEngine, TickOutput};
use crate::gear::apply_move;
use crate::systems::{movement, weapons};
use crate::systems::weapons::FireOutcome;

// ---- Helpers ----

fn bare_engine() -> SimulationEngine {
    SimulationEngine::new(SimConfig {
        populate_world: false,
        ..Default::default()
    })
}

fn join(engine: &mut SimulationEngine, name: &str) -> Entity {
    engine.connect(name, None).unwrap();
    engine.registry().player(name).unwrap()
}

fn place(engine: &mut SimulationEngine, entity: Entity, x: f64, y: f64) {
    *engine
        .registry_mut()
        .world
        .get::<&mut Position>(entity)
        .unwrap() = Position::new(x, y);
}

fn energy_of(engine: &SimulationEngine, entity: Entity) -> f64 {
    engine.registry().world.get::<&Energy>(entity).unwrap().current
}

fn set_energy(engine: &mut SimulationEngine, entity: Entity, value: f64) {
    engine
        .registry_mut()
        .world
        .get::<&mut Energy>(entity)
        .unwrap()
        .current = value;
}

fn command(engine: &mut SimulationEngine, name: &str, action: PlayerAction) {
    engine.queue_command(PlayerCommand::new(name, action));
}

fn fired_times(out: &TickOutput) -> Vec<f64> {
    out.events
        .iter()
        .filter_map(|o| match o.event {
            ServerEvent::Fired { at, .. } => Some(at),
            _ => None,
        })
        .collect()
}

fn mob_entity(engine: &SimulationEngine, id: MobId) -> Option<Entity> {
    engine.registry().mob(id)
}

fn mob_health(engine: &SimulationEngine, id: MobId) -> f64 {
    let entity = mob_entity(engine, id).unwrap();
    engine.registry().world.get::<&Mob>(entity).unwrap().health
}

fn set_mob_health(engine: &mut SimulationEngine, id: MobId, health: f64) {
    let entity = mob_entity(engine, id).unwrap();
    engine
        .registry_mut()
        .world
        .get::<&mut Mob>(entity)
        .unwrap()
        .health = health;
}

fn mob_state(engine: &SimulationEngine, id: MobId) -> MobState {
    let entity = mob_entity(engine, id).unwrap();
    engine.registry().world.get::<&Brain>(entity).unwrap().state()
}

fn owned_of(engine: &SimulationEngine, spawner: SpawnerId, drone_type: DroneType) -> usize {
    let registry = engine.registry();
    let entity = registry.spawner(spawner).unwrap();
    let spawner = registry.world.get::<&Spawner>(entity).unwrap();
    spawner
        .owned
        .iter()
        .filter(|id| {
            registry
                .mob(**id)
                .and_then(|e| registry.world.get::<&Mob>(e).ok())
                .is_some_and(|m| m.drone_type == drone_type)
        })
        .count()
}

fn player_projectile(engine: &mut SimulationEngine, owner: &str, at: Position, damage: f64) {
    engine.registry_mut().spawn_projectile(
        ProjectileOwner::Player(owner.to_string()),
        DEFAULT_REALM,
        at,
        Velocity::default(),
        damage,
        PROJECTILE_LIFETIME_SECS,
    );
}

// ---- Determinism ----

#[test]
fn test_determinism_same_seed() {
    let run = || {
        let mut engine = SimulationEngine::new(SimConfig {
            seed: 12345,
            ..Default::default()
        });
        let e = join(&mut engine, "ann");
        place(&mut engine, e, -400.0, -300.0);
        let mut frames = Vec::new();
        for i in 0..240 {
            if i % 40 == 0 {
                command(
                    &mut engine,
                    "ann",
                    PlayerAction::Input {
                        up: i % 80 == 0,
                        down: false,
                        left: false,
                        right: true,
                        angle: Some(-1.2),
                    },
                );
                command(&mut engine, "ann", PlayerAction::FireStart);
            }
            let out = engine.tick();
            frames.push(serde_json::to_string(&out.snapshots).unwrap());
        }
        frames
    };
    assert_eq!(run(), run(), "snapshots diverged with same seed");
}

#[test]
fn test_world_setup_fills_spawners() {
    let mut engine = SimulationEngine::new(SimConfig::default());
    let out = engine.tick();
    let nexus = out.snapshots.iter().find(|s| s.realm == "nexus").unwrap();
    assert_eq!(nexus.spawners.len(), 2);
    for spawner in &nexus.spawners {
        let quota: u32 = spawner.config.quota.iter().map(|(_, n)| n).sum();
        assert_eq!(spawner.drone_count, quota);
    }
    let range = out.snapshots.iter().find(|s| s.realm == "range").unwrap();
    assert!(range.mobs.is_empty());
}

// ---- Movement ----

#[test]
fn test_velocity_never_exceeds_max_speed() {
    let inputs = [
        (true, false, false, true),
        (false, true, true, false),
        (true, true, true, true),
        (false, false, false, true),
    ];
    let mut vel = Velocity::new(MAX_SPEED * 3.0, -MAX_SPEED * 2.0);
    for (up, down, left, right) in inputs {
        let input = PlayerInput {
            up,
            down,
            left,
            right,
            ..Default::default()
        };
        for _ in 0..120 {
            vel = movement::step_velocity(vel, &input);
            assert!(vel.speed() <= MAX_SPEED + 1e-9, "speed {}", vel.speed());
        }
    }
}

#[test]
fn test_diagonal_target_is_normalised() {
    let input = PlayerInput {
        up: true,
        right: true,
        ..Default::default()
    };
    let target = movement::target_velocity(&input);
    assert!((target.speed() - MAX_SPEED).abs() < 1e-9);
    assert!(target.x > 0.0 && target.y < 0.0);
}

#[test]
fn test_friction_only_on_idle_axis() {
    let input = PlayerInput {
        right: true,
        ..Default::default()
    };
    let v = movement::step_velocity(Velocity::new(0.0, 100.0), &input);
    assert!((v.y - 100.0 * FRICTION).abs() < 1e-9);
    assert!((v.x - MAX_SPEED * VELOCITY_LERP).abs() < 1e-9);
}

#[test]
fn test_small_velocity_zeroed() {
    let v = movement::step_velocity(Velocity::new(0.5, -0.5), &PlayerInput::default());
    assert_eq!(v, Velocity::default());
}

#[test]
fn test_position_clamped_to_realm() {
    let mut engine = bare_engine();
    let e = join(&mut engine, "ann");
    place(&mut engine, e, 990.0, -990.0);
    for _ in 0..60 {
        command(
            &mut engine,
            "ann",
            PlayerAction::Input {
                up: true,
                down: false,
                left: false,
                right: true,
                angle: None,
            },
        );
        engine.tick();
        let pos = *engine.registry().world.get::<&Position>(e).unwrap();
        assert!(pos.x <= 1000.0 && pos.y >= -1000.0, "escaped to {pos:?}");
    }
}

#[test]
fn test_stale_input_is_neutralised() {
    let mut engine = bare_engine();
    let e = join(&mut engine, "ann");
    command(
        &mut engine,
        "ann",
        PlayerAction::Input {
            up: false,
            down: false,
            left: false,
            right: true,
            angle: Some(0.5),
        },
    );
    for _ in 0..(TICK_RATE * 2) {
        engine.tick();
    }
    let player = engine.registry().world.get::<&Player>(e).unwrap();
    assert!(!player.input.right);
    assert!((player.input.angle - 0.5).abs() < 1e-12);
    drop(player);
    for _ in 0..(TICK_RATE * 3) {
        engine.tick();
    }
    let vel = *engine.registry().world.get::<&Velocity>(e).unwrap();
    assert_eq!(vel, Velocity::default());
}

// ---- Weapons & energy ----

#[test]
fn test_fire_with_insufficient_energy_is_noop() {
    let mut engine = bare_engine();
    let e = join(&mut engine, "ann");
    set_energy(&mut engine, e, 0.2);
    let outcome = weapons::fire_start(engine.registry_mut(), "ann", 0.0);
    assert_eq!(outcome, FireOutcome::InsufficientEnergy);
    assert!((energy_of(&engine, e) - 0.2).abs() < 1e-12);
    assert_eq!(engine.registry().projectile_count(), 0);
}

#[test]
fn test_fire_without_weapon_is_noop() {
    let mut engine = bare_engine();
    let record = PlayerRecord {
        gear: Gear::default().to_persisted(),
        ..PlayerRecord::default_for("ann")
    };
    engine.connect("ann", Some(record)).unwrap();
    let outcome = weapons::fire_start(engine.registry_mut(), "ann", 0.0);
    assert_eq!(outcome, FireOutcome::NoWeapon);
}

#[test]
fn test_burst_scenario() {
    let mut engine = bare_engine();
    let e = join(&mut engine, "ann");
    command(&mut engine, "ann", PlayerAction::FireStart);

    let mut shots = Vec::new();
    for _ in 0..7 {
        let out = engine.tick();
        shots.extend(fired_times(&out));
    }

    assert_eq!(shots.len(), 3);
    assert_eq!(engine.registry().projectile_count(), 3);
    for pair in shots.windows(2) {
        assert!((pair[1] - pair[0] - BURST_SHOT_DELAY_SECS).abs() < 1e-9);
    }
    assert!((energy_of(&engine, e) - (1.0 - 3.0 * 0.33)).abs() < 1e-9);

    // Refilled energy does not bypass the burst cooldown.
    set_energy(&mut engine, e, 1.0);
    let last = shots[2];
    let early = weapons::fire_start(engine.registry_mut(), "ann", last + 0.5);
    assert_eq!(early, FireOutcome::CoolingDown);
    let later = weapons::fire_start(engine.registry_mut(), "ann", last + 1.0);
    assert_eq!(later, FireOutcome::BurstStarted);
}

#[test]
fn test_burst_aborts_when_energy_runs_out() {
    let mut engine = bare_engine();
    let e = join(&mut engine, "ann");
    set_energy(&mut engine, e, 0.7);
    command(&mut engine, "ann", PlayerAction::FireStart);
    let mut shots = 0;
    for _ in 0..10 {
        shots += fired_times(&engine.tick()).len();
    }
    assert_eq!(shots, 2);
    let weapons = engine.registry().world.get::<&WeaponState>(e).unwrap();
    assert!(weapons.burst.is_none());
    assert!(weapons.cooldown_until > 0.0);
}

#[test]
fn test_automatic_fire_while_held() {
    let mut engine = bare_engine();
    let e = join(&mut engine, "ann");
    command(&mut engine, "ann", PlayerAction::SetActiveHotbar { index: 1 });
    command(&mut engine, "ann", PlayerAction::FireStart);

    let mut shots = 0;
    for _ in 0..TICK_RATE {
        shots += fired_times(&engine.tick()).len();
    }
    assert_eq!(shots, 10);
    assert!((energy_of(&engine, e) - 0.5).abs() < 1e-9);

    command(&mut engine, "ann", PlayerAction::FireStop);
    let mut after = 0;
    for _ in 0..TICK_RATE {
        after += fired_times(&engine.tick()).len();
    }
    assert_eq!(after, 0);
}

#[test]
fn test_automatic_trigger_released_when_energy_exhausted() {
    let mut engine = bare_engine();
    let e = join(&mut engine, "ann");
    set_energy(&mut engine, e, 0.12);
    command(&mut engine, "ann", PlayerAction::SetActiveHotbar { index: 1 });
    command(&mut engine, "ann", PlayerAction::FireStart);
    let mut shots = 0;
    for _ in 0..15 {
        shots += fired_times(&engine.tick()).len();
    }
    assert_eq!(shots, 2);
    assert!(!engine.registry().world.get::<&WeaponState>(e).unwrap().trigger_held);
}

#[test]
fn test_energy_regenerates_monotonically_to_max() {
    let mut engine = bare_engine();
    let e = join(&mut engine, "ann");
    set_energy(&mut engine, e, 0.3);
    let mut last = 0.3;
    for _ in 0..(TICK_RATE * 4) {
        engine.tick();
        let now = energy_of(&engine, e);
        assert!(now >= last - 1e-12);
        assert!(now <= PLAYER_MAX_ENERGY);
        last = now;
    }
    assert!((last - PLAYER_MAX_ENERGY).abs() < 1e-9);
}

#[test]
fn test_energy_regen_is_quantised() {
    let mut energy = Energy {
        current: 0.5,
        max: 1.0,
        regen_per_sec: ENERGY_REGEN_PER_SEC,
        regen_accum_secs: 0.0,
        next_status_at: 0.0,
    };
    weapons::regenerate(&mut energy, false, 0.05);
    assert!((energy.current - 0.5).abs() < 1e-12);
    weapons::regenerate(&mut energy, false, 0.05);
    assert!((energy.current - 0.525).abs() < 1e-9);
    weapons::regenerate(&mut energy, true, 0.5);
    assert!((energy.current - 0.525).abs() < 1e-9);
}

#[test]
fn test_energy_status_events_are_periodic() {
    let mut engine = bare_engine();
    join(&mut engine, "ann");
    let mut count = 0;
    for _ in 0..TICK_RATE {
        let out = engine.tick();
        count += out
            .events
            .iter()
            .filter(|o| matches!(o.event, ServerEvent::Energy { .. }))
            .count();
    }
    assert_eq!(count, 10);
}

// ---- Projectiles ----

#[test]
fn test_projectile_expires_and_never_hits() {
    let mut engine = bare_engine();
    join(&mut engine, "ann");
    let mob = engine.spawn_test_drone(DroneType::L1, Position::new(400.0, 400.0), None);
    engine.registry_mut().spawn_projectile(
        ProjectileOwner::Player("ann".into()),
        DEFAULT_REALM,
        Position::new(400.0, 400.0),
        Velocity::default(),
        10.0,
        DT * 0.5,
    );
    engine.tick();
    assert_eq!(engine.registry().projectile_count(), 0);
    assert_eq!(mob_health(&engine, mob), 30.0);
}

#[test]
fn test_projectile_out_of_bounds_removed_before_collision() {
    let mut engine = bare_engine();
    join(&mut engine, "ann");
    let mob = engine.spawn_test_drone(DroneType::L1, Position::new(1000.0, 0.0), None);
    engine.registry_mut().spawn_projectile(
        ProjectileOwner::Player("ann".into()),
        DEFAULT_REALM,
        Position::new(995.0, 0.0),
        Velocity::new(600.0, 0.0),
        10.0,
        PROJECTILE_LIFETIME_SECS,
    );
    engine.tick();
    assert_eq!(engine.registry().projectile_count(), 0);
    assert_eq!(mob_health(&engine, mob), 30.0);
}

#[test]
fn test_hit_damages_and_assigns_target() {
    let mut engine = bare_engine();
    let e = join(&mut engine, "ann");
    place(&mut engine, e, -100.0, 300.0);
    let mob = engine.spawn_test_drone(DroneType::L1, Position::new(200.0, 0.0), None);
    player_projectile(&mut engine, "ann", Position::new(190.0, 0.0), 10.0);
    engine.tick();
    assert_eq!(engine.registry().projectile_count(), 0);
    assert_eq!(mob_health(&engine, mob), 20.0);
    let entity = mob_entity(&engine, mob).unwrap();
    assert_eq!(
        engine.registry().world.get::<&Mob>(entity).unwrap().target.as_deref(),
        Some("ann")
    );
    assert_eq!(mob_state(&engine, mob), MobState::Chase);
}

#[test]
fn test_hit_tie_breaks_on_lowest_id() {
    let mut engine = bare_engine();
    join(&mut engine, "ann");
    let first = engine.spawn_test_drone(DroneType::L1, Position::new(300.0, 10.0), None);
    let second = engine.spawn_test_drone(DroneType::L1, Position::new(300.0, -10.0), None);
    player_projectile(&mut engine, "ann", Position::new(300.0, 0.0), 10.0);
    engine.tick();
    assert_eq!(mob_health(&engine, first), 20.0);
    assert_eq!(mob_health(&engine, second), 30.0);
}

#[test]
fn test_hit_prefers_nearest() {
    let mut engine = bare_engine();
    join(&mut engine, "ann");
    let far = engine.spawn_test_drone(DroneType::L1, Position::new(300.0, 5.0), None);
    let near = engine.spawn_test_drone(DroneType::L1, Position::new(300.0, -3.0), None);
    player_projectile(&mut engine, "ann", Position::new(300.0, 0.0), 10.0);
    engine.tick();
    assert_eq!(mob_health(&engine, far), 30.0);
    assert_eq!(mob_health(&engine, near), 20.0);
}

#[test]
fn test_mob_death_deregisters_from_spawner() {
    let mut engine = bare_engine();
    join(&mut engine, "ann");
    let spawner = engine.spawn_test_spawner(SpawnerKind::Hive, Position::new(-500.0, -450.0));
    let mob = engine.spawn_test_drone(DroneType::L1, Position::new(-500.0, -400.0), Some(spawner));
    set_mob_health(&mut engine, mob, 5.0);
    assert_eq!(owned_of(&engine, spawner, DroneType::L1), 1);

    player_projectile(&mut engine, "ann", Position::new(-500.0, -400.0), 10.0);
    engine.tick();
    assert!(mob_entity(&engine, mob).is_none());
    assert_eq!(owned_of(&engine, spawner, DroneType::L1), 0);
    let registry = engine.registry();
    let entity = registry.spawner(spawner).unwrap();
    assert!(registry.world.get::<&Spawner>(entity).unwrap().owned.is_empty());
}

#[test]
fn test_drone_projectile_damages_player() {
    let mut engine = bare_engine();
    let e = join(&mut engine, "ann");
    place(&mut engine, e, 500.0, 500.0);
    engine.registry_mut().spawn_projectile(
        ProjectileOwner::Drone(MobId(99)),
        DEFAULT_REALM,
        Position::new(500.0, 500.0),
        Velocity::default(),
        12.0,
        PROJECTILE_LIFETIME_SECS,
    );
    engine.tick();
    assert_eq!(engine.registry().world.get::<&Player>(e).unwrap().health, 88.0);
}

#[test]
fn test_player_in_safe_zone_not_hit() {
    let mut engine = bare_engine();
    let e = join(&mut engine, "ann");
    engine.registry_mut().spawn_projectile(
        ProjectileOwner::Drone(MobId(99)),
        DEFAULT_REALM,
        Position::new(0.0, 0.0),
        Velocity::default(),
        12.0,
        PROJECTILE_LIFETIME_SECS,
    );
    engine.tick();
    assert_eq!(engine.registry().world.get::<&Player>(e).unwrap().health, PLAYER_MAX_HEALTH);
}

#[test]
fn test_lethal_hit_respawns_player() {
    let mut engine = bare_engine();
    let e = join(&mut engine, "ann");
    place(&mut engine, e, 500.0, 500.0);
    set_energy(&mut engine, e, 0.1);
    engine.registry_mut().world.get::<&mut Player>(e).unwrap().health = 5.0;
    engine.registry_mut().spawn_projectile(
        ProjectileOwner::Drone(MobId(99)),
        DEFAULT_REALM,
        Position::new(500.0, 500.0),
        Velocity::default(),
        12.0,
        PROJECTILE_LIFETIME_SECS,
    );
    let out = engine.tick();
    assert!(out
        .events
        .iter()
        .any(|o| matches!(o.event, ServerEvent::Respawned { .. }) && o.to == Recipient::Player("ann".into())));
    let registry = engine.registry();
    assert_eq!(registry.world.get::<&Player>(e).unwrap().health, PLAYER_MAX_HEALTH);
    assert_eq!(*registry.world.get::<&Position>(e).unwrap(), Position::new(0.0, 0.0));
    assert_eq!(registry.world.get::<&Energy>(e).unwrap().current, PLAYER_MAX_ENERGY);
}

// ---- Drone AI ----

#[test]
fn test_drone_acquires_nearby_player() {
    let mut engine = bare_engine();
    let e = join(&mut engine, "ann");
    place(&mut engine, e, 450.0, 400.0);
    let mob = engine.spawn_test_drone(DroneType::L1, Position::new(400.0, 400.0), None);
    engine.tick();
    let entity = mob_entity(&engine, mob).unwrap();
    assert_eq!(
        engine.registry().world.get::<&Mob>(entity).unwrap().target.as_deref(),
        Some("ann")
    );
    assert_eq!(mob_state(&engine, mob), MobState::Chase);
}

#[test]
fn test_drone_ignores_player_in_safe_zone() {
    let mut engine = bare_engine();
    join(&mut engine, "ann");
    let mob = engine.spawn_test_drone(DroneType::L1, Position::new(100.0, 0.0), None);
    engine.tick();
    let entity = mob_entity(&engine, mob).unwrap();
    assert!(engine.registry().world.get::<&Mob>(entity).unwrap().target.is_none());
}

#[test]
fn test_drone_l1_at_one_hp_never_retreats() {
    let mut engine = bare_engine();
    let e = join(&mut engine, "ann");
    place(&mut engine, e, 600.0, 600.0);
    let mob = engine.spawn_test_drone(DroneType::L1, Position::new(650.0, 600.0), None);
    set_mob_health(&mut engine, mob, 1.0);
    for _ in 0..(TICK_RATE * 5) {
        engine.tick();
        let state = mob_state(&engine, mob);
        assert!(!matches!(state, MobState::Retreat | MobState::Regroup), "entered {state:?}");
    }
}

#[test]
fn test_drone_retreats_when_threshold_crossed() {
    let mut engine = bare_engine();
    let e = join(&mut engine, "ann");
    place(&mut engine, e, 650.0, 600.0);
    let mob = engine.spawn_test_drone(DroneType::L2, Position::new(600.0, 600.0), None);
    engine.tick();
    engine.tick();
    assert!(matches!(mob_state(&engine, mob), MobState::Chase | MobState::Attack));

    set_mob_health(&mut engine, mob, 10.0);
    engine.tick();
    assert_eq!(mob_state(&engine, mob), MobState::Retreat);
}

#[test]
fn test_attacking_drone_fires_projectiles() {
    let mut engine = bare_engine();
    let e = join(&mut engine, "ann");
    place(&mut engine, e, 700.0, 600.0);
    engine.spawn_test_drone(DroneType::L1, Position::new(600.0, 600.0), None);
    let mut drone_shots = 0;
    for _ in 0..(TICK_RATE * 2) {
        engine.tick();
        drone_shots += engine
            .registry()
            .world
            .query::<&Projectile>()
            .iter()
            .filter(|(_, p)| matches!(p.owner, ProjectileOwner::Drone(_)))
            .count();
    }
    assert!(drone_shots > 0);
}

// ---- Spawners ----

#[test]
fn test_spawner_spawns_one_after_interval() {
    let mut engine = bare_engine();
    let center = Position::new(-500.0, -450.0);
    let spawner = engine.spawn_test_spawner(SpawnerKind::Hive, center);
    let interval_ticks = (5.0 * TICK_RATE as f64).round() as u32;

    for _ in 0..interval_ticks {
        engine.tick();
    }
    assert_eq!(owned_of(&engine, spawner, DroneType::L1), 0);

    let out = engine.tick();
    assert_eq!(owned_of(&engine, spawner, DroneType::L1), 1);
    let nexus = out.snapshots.iter().find(|s| s.realm == "nexus").unwrap();
    let drone = nexus
        .mobs
        .iter()
        .find(|m| m.drone_type == DroneType::L1)
        .unwrap();
    assert!(drone.position.distance_to(&center) <= 150.0 + 1e-9);
    assert_eq!(drone.spawner, Some(spawner));
}

#[test]
fn test_spawner_transfers_one_per_tick_until_at_quota() {
    let mut engine = bare_engine();
    let source = engine.spawn_test_spawner(SpawnerKind::Hive, Position::new(0.0, -500.0));
    let dest = engine.spawn_test_spawner(SpawnerKind::Nest, Position::new(400.0, -500.0));
    let mut source_ids = Vec::new();
    for i in 0..10 {
        source_ids.push(engine.spawn_test_drone(
            DroneType::L1,
            Position::new(i as f64 * 5.0, -450.0),
            Some(source),
        ));
    }
    for i in 0..4 {
        engine.spawn_test_drone(DroneType::L1, Position::new(400.0 + i as f64 * 5.0, -450.0), Some(dest));
    }

    engine.tick();
    assert_eq!(owned_of(&engine, source, DroneType::L1), 9);
    assert_eq!(owned_of(&engine, dest, DroneType::L1), 5);
    let moved = mob_entity(&engine, source_ids[9]).unwrap();
    assert_eq!(engine.registry().world.get::<&Mob>(moved).unwrap().spawner, Some(dest));

    engine.tick();
    assert_eq!(owned_of(&engine, source, DroneType::L1), 8);
    assert_eq!(owned_of(&engine, dest, DroneType::L1), 6);

    engine.tick();
    assert_eq!(owned_of(&engine, source, DroneType::L1), 8);
    assert_eq!(owned_of(&engine, dest, DroneType::L1), 6);
}

#[test]
fn test_no_transfer_out_of_range() {
    let mut engine = bare_engine();
    let source = engine.spawn_test_spawner(SpawnerKind::Hive, Position::new(-900.0, -500.0));
    let dest = engine.spawn_test_spawner(SpawnerKind::Nest, Position::new(900.0, -500.0));
    for _ in 0..9 {
        engine.spawn_test_drone(DroneType::L1, Position::new(-900.0, -450.0), Some(source));
    }
    engine.tick();
    assert_eq!(owned_of(&engine, source, DroneType::L1), 9);
    assert_eq!(owned_of(&engine, dest, DroneType::L1), 0);
}

// ---- Gear ----

#[test]
fn test_equip_type_mismatch_rejected_and_unchanged() {
    let mut gear = Gear::starter();
    let before = gear.clone();
    let err = apply_move(
        &mut gear,
        GearRef::Inventory { index: 1 },
        GearRef::Equipment {
            slot: EquipSlot::Head,
        },
    )
    .unwrap_err();
    assert_eq!(err, GearError::InvalidSlot);
    assert_eq!(gear, before);
}

#[test]
fn test_swap_checked_in_both_directions() {
    let mut gear = Gear::starter();
    gear.equipment.head = Some(ItemRef::new("item_helmet_basic"));
    let before = gear.clone();
    let err = apply_move(
        &mut gear,
        GearRef::Equipment {
            slot: EquipSlot::Head,
        },
        GearRef::Inventory { index: 1 },
    )
    .unwrap_err();
    assert_eq!(err, GearError::InvalidSlot);
    assert_eq!(gear, before);
}

#[test]
fn test_equip_matching_item() {
    let mut gear = Gear::starter();
    gear.inventory[0] = Some(ItemRef::new("item_helmet_basic"));
    apply_move(
        &mut gear,
        GearRef::Inventory { index: 0 },
        GearRef::Equipment {
            slot: EquipSlot::Head,
        },
    )
    .unwrap();
    assert_eq!(gear.equipment.head, Some(ItemRef::new("item_helmet_basic")));
    assert!(gear.inventory[0].is_none());
}

#[test]
fn test_swap_two_occupied_slots() {
    let mut gear = Gear::starter();
    apply_move(&mut gear, GearRef::Hotbar { index: 0 }, GearRef::Hotbar { index: 1 }).unwrap();
    assert_eq!(gear.hotbar[0], Some(ItemRef::new(RIFLE_A)));
    assert_eq!(gear.hotbar[1], Some(ItemRef::new(PISTOL_A)));
}

#[test]
fn test_bad_ref_and_unknown_item() {
    let mut gear = Gear::starter();
    assert_eq!(
        apply_move(&mut gear, GearRef::Inventory { index: 10 }, GearRef::Hotbar { index: 0 }),
        Err(GearError::BadRef)
    );
    assert_eq!(
        apply_move(&mut gear, GearRef::Hotbar { index: 0 }, GearRef::Hotbar { index: 4 }),
        Err(GearError::BadRef)
    );
    gear.inventory[0] = Some(ItemRef::new("item_mystery"));
    assert_eq!(
        apply_move(
            &mut gear,
            GearRef::Inventory { index: 0 },
            GearRef::Equipment {
                slot: EquipSlot::Chest
            }
        ),
        Err(GearError::UnknownItem)
    );
    // Unknown items still move freely between inventory and hotbar.
    apply_move(&mut gear, GearRef::Inventory { index: 0 }, GearRef::Hotbar { index: 3 }).unwrap();
}

#[test]
fn test_backpack_grows_and_shrinks_inventory() {
    let mut gear = Gear::starter();
    gear.inventory[0] = Some(ItemRef::new(BACKPACK_TIER1));
    let backpack = GearRef::Equipment {
        slot: EquipSlot::Backpack,
    };

    apply_move(&mut gear, GearRef::Inventory { index: 0 }, backpack).unwrap();
    assert_eq!(gear.inventory.len(), BASE_INVENTORY_CAPACITY + 4);
    assert_eq!(gear.inventory[1], Some(ItemRef::new(PISTOL_A)));
    assert!(gear.inventory[0].is_none());

    apply_move(&mut gear, backpack, GearRef::Inventory { index: 0 }).unwrap();
    assert_eq!(gear.inventory.len(), BASE_INVENTORY_CAPACITY);
    assert_eq!(gear.inventory[0], Some(ItemRef::new(BACKPACK_TIER1)));
    assert_eq!(gear.inventory[1], Some(ItemRef::new(PISTOL_A)));
}

#[test]
fn test_unequip_backpack_blocked_when_overflowing() {
    let mut gear = Gear::starter();
    gear.equipment.backpack = Some(ItemRef::new(BACKPACK_TIER1));
    gear.resize_inventory(gear.capacity());
    gear.inventory[6] = Some(ItemRef::new("item_boots_basic"));
    let before = gear.clone();

    let err = apply_move(
        &mut gear,
        GearRef::Equipment {
            slot: EquipSlot::Backpack,
        },
        GearRef::Inventory { index: 0 },
    )
    .unwrap_err();
    assert_eq!(err, GearError::WouldDiscardItems);
    assert_eq!(gear, before);
}

#[test]
fn test_gear_move_command_replies() {
    let mut engine = bare_engine();
    join(&mut engine, "ann");
    command(
        &mut engine,
        "ann",
        PlayerAction::GearMove {
            request_id: 7,
            from: GearRef::Inventory { index: 1 },
            to: GearRef::Inventory { index: 3 },
        },
    );
    let out = engine.tick();
    let reply = out
        .events
        .iter()
        .find_map(|o| match &o.event {
            ServerEvent::GearMoved {
                request_id,
                ok,
                gear,
                ..
            } => Some((*request_id, *ok, gear.clone())),
            _ => None,
        })
        .unwrap();
    assert_eq!(reply.0, 7);
    assert!(reply.1);
    assert_eq!(reply.2.unwrap().inventory[3], Some(ItemRef::new(PISTOL_A)));
}

// ---- Sessions ----

#[test]
fn test_connect_rejects_bad_identity() {
    let mut engine = bare_engine();
    assert_eq!(engine.connect("", None).unwrap_err(), SessionError::MissingIdentity);
    assert_eq!(engine.connect("   ", None).unwrap_err(), SessionError::MissingIdentity);
    let long = "x".repeat(USERNAME_MAX_LEN + 1);
    assert_eq!(engine.connect(&long, None).unwrap_err(), SessionError::InvalidIdentity);
    assert_eq!(engine.registry().player_count(), 0);
}

#[test]
fn test_connect_rejects_duplicate() {
    let mut engine = bare_engine();
    join(&mut engine, "ann");
    assert_eq!(
        engine.connect("ann", None).unwrap_err(),
        SessionError::AlreadyConnected("ann".into())
    );
}

#[test]
fn test_connect_default_record_payload() {
    let mut engine = bare_engine();
    let init = engine.connect("ann", None).unwrap();
    assert_eq!(init.realm, DEFAULT_REALM);
    assert_eq!(init.position, Position::new(0.0, 0.0));
    assert_eq!(init.gear, Gear::starter());
    assert_eq!(init.realm_size, (REALM_WIDTH, REALM_HEIGHT));
    assert!(init.realm_config.features.drones);
    assert_eq!(init.physics.max_speed, MAX_SPEED);
}

#[test]
fn test_connect_unknown_realm_falls_back() {
    let mut engine = bare_engine();
    let record = PlayerRecord {
        realm: "atlantis".into(),
        x: 5000.0,
        ..PlayerRecord::default_for("ann")
    };
    let init = engine.connect("ann", Some(record)).unwrap();
    assert_eq!(init.realm, DEFAULT_REALM);
    assert_eq!(init.position.x, 1000.0);
}

#[test]
fn test_disconnect_returns_record() {
    let mut engine = bare_engine();
    let e = join(&mut engine, "ann");
    place(&mut engine, e, 12.0, -34.0);
    let record = engine.disconnect("ann").unwrap();
    assert_eq!(record.username, "ann");
    assert_eq!((record.x, record.y), (12.0, -34.0));
    assert_eq!(Gear::from_persisted(&record.gear).0, Gear::starter());
    assert!(!engine.is_connected("ann"));
    assert!(engine.disconnect("ann").is_none());
    let out = engine.tick();
    assert!(out.snapshots.iter().all(|s| s.players.is_empty()));
}

#[test]
fn test_player_records_for_all_connected() {
    let mut engine = bare_engine();
    join(&mut engine, "ann");
    join(&mut engine, "bob");
    let names: Vec<String> = engine.player_records().into_iter().map(|r| r.username).collect();
    assert_eq!(names, vec!["ann".to_string(), "bob".to_string()]);
}

#[test]
fn test_active_hotbar_clamped() {
    let mut engine = bare_engine();
    let e = join(&mut engine, "ann");
    command(&mut engine, "ann", PlayerAction::SetActiveHotbar { index: 9 });
    engine.tick();
    assert_eq!(engine.registry().world.get::<&Player>(e).unwrap().active_hotbar, 3);
    command(&mut engine, "ann", PlayerAction::SetActiveHotbar { index: -2 });
    engine.tick();
    assert_eq!(engine.registry().world.get::<&Player>(e).unwrap().active_hotbar, 0);
}

// ---- Travel ----

#[test]
fn test_travel_through_portal() {
    let mut engine = bare_engine();
    let e = join(&mut engine, "ann");
    place(&mut engine, e, 310.0, 290.0);
    command(&mut engine, "ann", PlayerAction::RequestTravel);
    let out = engine.tick();

    let changed = out.events.iter().find_map(|o| match &o.event {
        ServerEvent::RealmChanged { realm, x, y } => Some((realm.clone(), *x, *y)),
        _ => None,
    });
    assert_eq!(changed, Some(("range".to_string(), 300.0, 300.0)));

    let range = out.snapshots.iter().find(|s| s.realm == "range").unwrap();
    assert_eq!(range.players.len(), 1);
    let nexus = out.snapshots.iter().find(|s| s.realm == "nexus").unwrap();
    assert!(nexus.players.is_empty());
}

#[test]
fn test_travel_away_from_portal_is_noop() {
    let mut engine = bare_engine();
    join(&mut engine, "ann");
    command(&mut engine, "ann", PlayerAction::RequestTravel);
    let out = engine.tick();
    assert!(!out
        .events
        .iter()
        .any(|o| matches!(o.event, ServerEvent::RealmChanged { .. })));
    assert!(out.events.iter().any(|o| {
        matches!(o.event, ServerEvent::Error { .. }) && o.to == Recipient::Player("ann".into())
    }));
    assert_eq!(out.snapshots.iter().find(|s| s.realm == "nexus").unwrap().players.len(), 1);
}

#[test]
fn test_command_for_unknown_player_reports_error() {
    let mut engine = bare_engine();
    command(&mut engine, "ghost", PlayerAction::FireStart);
    let out = engine.tick();
    assert_eq!(out.events.len(), 1);
    match &out.events[0] {
        Outbound {
            to: Recipient::Player(name),
            event: ServerEvent::Error { message },
        } => {
            assert_eq!(name, "ghost");
            assert_eq!(message, "not connected");
        }
        other => panic!("expected error, got {other:?}"),
    }
    assert!(!engine.is_connected("ghost"));
}

#[test]
fn test_snapshot_scoped_to_realm() {
    let mut engine = bare_engine();
    let e = join(&mut engine, "ann");
    place(&mut engine, e, 300.0, 300.0);
    command(&mut engine, "ann", PlayerAction::RequestTravel);
    engine.tick();
    command(&mut engine, "ann", PlayerAction::FireStart);
    let out = engine.tick();
    let range = out.snapshots.iter().find(|s| s.realm == "range").unwrap();
    let nexus = out.snapshots.iter().find(|s| s.realm == "nexus").unwrap();
    assert_eq!(range.projectiles.len(), 1);
    assert!(nexus.projectiles.is_empty());
}
