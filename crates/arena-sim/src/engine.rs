//! Simulation engine: the authoritative core of the game.
//!
//! `SimulationEngine` owns the entity registry, processes queued player
//! commands at the tick boundary, runs all systems in a fixed order, and
//! produces one `RealmSnapshot` per realm. Completely headless; time only
//! advances when `tick()` is called, enabling deterministic testing.

use std::collections::VecDeque;

use hecs::Entity;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::debug;

use arena_core::commands::{PlayerAction, PlayerCommand};
use arena_core::components::Player;
use arena_core::constants::{ENERGY_STATUS_INTERVAL_SECS, HOTBAR_SLOTS};
use arena_core::error::{GearError, SessionError};
use arena_core::events::{Outbound, ServerEvent};
use arena_core::realms::builtin_realms;
use arena_core::records::PlayerRecord;
use arena_core::state::{InitPayload, RealmSnapshot};
use arena_core::types::SimTime;

use crate::gear;
use crate::registry::Registry;
use crate::session;
use crate::systems;
use crate::world_setup;

/// Configuration for starting a new simulation.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// RNG seed for determinism. Same seed = same simulation.
    pub seed: u64,
    /// Interval between per-player energy status events.
    pub energy_status_interval_secs: f64,
    /// Place the fixed spawners and their starting drones.
    pub populate_world: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            energy_status_interval_secs: ENERGY_STATUS_INTERVAL_SECS,
            populate_world: true,
        }
    }
}

/// Everything a tick produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TickOutput {
    /// One snapshot per realm.
    pub snapshots: Vec<RealmSnapshot>,
    /// Addressed events raised during the tick.
    pub events: Vec<Outbound>,
}

/// The simulation engine. Owns the registry and all sim state.
pub struct SimulationEngine {
    registry: Registry,
    time: SimTime,
    rng: ChaCha8Rng,
    status_interval_secs: f64,
    command_queue: VecDeque<PlayerCommand>,
    despawn_buffer: Vec<Entity>,
    events: Vec<Outbound>,
}

impl SimulationEngine {
    /// Create a new simulation engine with the given config.
    pub fn new(config: SimConfig) -> Self {
        let mut engine = Self {
            registry: Registry::new(builtin_realms()),
            time: SimTime::default(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            status_interval_secs: config.energy_status_interval_secs,
            command_queue: VecDeque::new(),
            despawn_buffer: Vec::new(),
            events: Vec::new(),
        };
        if config.populate_world {
            world_setup::setup_world(&mut engine.registry, &mut engine.rng, 0.0);
        }
        engine
    }

    /// Queue a player command for processing at the next tick boundary.
    pub fn queue_command(&mut self, command: PlayerCommand) {
        self.command_queue.push_back(command);
    }

    /// Accept a session, materialising the player from `record` or defaults.
    pub fn connect(
        &mut self,
        username: &str,
        record: Option<PlayerRecord>,
    ) -> Result<InitPayload, SessionError> {
        session::connect(&mut self.registry, username, record, self.time.elapsed_secs)
    }

    /// Remove a player, returning its record for persistence.
    pub fn disconnect(&mut self, username: &str) -> Option<PlayerRecord> {
        self.command_queue.retain(|c| c.username != username);
        session::disconnect(&mut self.registry, username)
    }

    /// Records for all connected players.
    pub fn player_records(&self) -> Vec<PlayerRecord> {
        session::records(&self.registry)
    }

    /// Whether `username` currently has a player in the world.
    pub fn is_connected(&self, username: &str) -> bool {
        self.registry.has_player(username)
    }

    /// Advance the simulation by one tick.
    pub fn tick(&mut self) -> TickOutput {
        self.process_commands();
        self.run_systems();
        self.time.advance();

        TickOutput {
            snapshots: systems::snapshot::build_snapshots(&self.registry, &self.time),
            events: std::mem::take(&mut self.events),
        }
    }

    /// Get the current simulation time.
    pub fn time(&self) -> SimTime {
        self.time
    }

    /// Read-only access to the registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Mutable registry access for test setup.
    #[cfg(test)]
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Spawn a drone directly (for tests needing a controlled population).
    #[cfg(test)]
    pub fn spawn_test_drone(
        &mut self,
        drone_type: arena_core::enums::DroneType,
        position: arena_core::types::Position,
        owner: Option<arena_core::components::SpawnerId>,
    ) -> arena_core::components::MobId {
        let now = self.time.elapsed_secs;
        systems::spawner::spawn_drone(
            &mut self.registry,
            &mut self.rng,
            drone_type,
            arena_core::constants::DEFAULT_REALM,
            position,
            owner,
            now,
        )
    }

    /// Place an empty spawner in the default realm.
    #[cfg(test)]
    pub fn spawn_test_spawner(
        &mut self,
        kind: arena_core::enums::SpawnerKind,
        position: arena_core::types::Position,
    ) -> arena_core::components::SpawnerId {
        let now = self.time.elapsed_secs;
        world_setup::spawn_spawner(
            &mut self.registry,
            kind,
            arena_core::constants::DEFAULT_REALM,
            position,
            now,
        )
    }

    /// Process all queued commands.
    fn process_commands(&mut self) {
        while let Some(command) = self.command_queue.pop_front() {
            self.handle_command(command);
        }
    }

    /// Handle a single player command.
    fn handle_command(&mut self, command: PlayerCommand) {
        let now = self.time.elapsed_secs;
        let PlayerCommand { username, action } = command;
        let Some(entity) = self.registry.player(&username) else {
            debug!(player = %username, "command for unknown player dropped");
            self.events.push(Outbound::error(&username, "not connected"));
            return;
        };

        match action {
            PlayerAction::Input {
                up,
                down,
                left,
                right,
                angle,
            } => {
                if let Ok(mut player) = self.registry.world.get::<&mut Player>(entity) {
                    let input = &mut player.input;
                    input.up = up;
                    input.down = down;
                    input.left = left;
                    input.right = right;
                    if let Some(angle) = angle.filter(|a| a.is_finite()) {
                        input.angle = angle;
                    }
                    input.updated_at = now;
                }
            }
            PlayerAction::FireStart => {
                let outcome = systems::weapons::fire_start(&mut self.registry, &username, now);
                debug!(player = %username, ?outcome, "fire start");
            }
            PlayerAction::FireStop => {
                systems::weapons::fire_stop(&mut self.registry, &username);
            }
            PlayerAction::SetActiveHotbar { index } => {
                if let Ok(mut player) = self.registry.world.get::<&mut Player>(entity) {
                    player.active_hotbar = index.clamp(0, HOTBAR_SLOTS as i64 - 1) as usize;
                }
            }
            PlayerAction::RequestTravel => {
                session::travel(&mut self.registry, &username, &mut self.events);
            }
            PlayerAction::GearMove {
                request_id,
                from,
                to,
            } => {
                let event = match self.registry.world.get::<&mut Player>(entity) {
                    Ok(mut player) => {
                        let result = gear::apply_move(&mut player.gear, from, to);
                        ServerEvent::GearMoved {
                            request_id,
                            ok: result.is_ok(),
                            error: result.err(),
                            gear: Some(player.gear.clone()),
                        }
                    }
                    Err(_) => ServerEvent::GearMoved {
                        request_id,
                        ok: false,
                        error: Some(GearError::NotFound),
                        gear: None,
                    },
                };
                self.events.push(Outbound::player(&username, event));
            }
        }
    }

    /// Run all systems in order.
    fn run_systems(&mut self) {
        let now = self.time.elapsed_secs;
        let dt = self.time.dt();

        // 1. Movement integration
        systems::movement::run(&mut self.registry, now, dt);
        // 2. Weapons and energy
        systems::weapons::run(
            &mut self.registry,
            now,
            dt,
            self.status_interval_secs,
            &mut self.events,
        );
        // 3. Projectiles (kinematics, expiry, hits)
        systems::projectiles::run(
            &mut self.registry,
            dt,
            &mut self.despawn_buffer,
            &mut self.events,
        );
        // 4. Drone AI
        systems::drone_ai::run(&mut self.registry, &mut self.rng, now, dt);
        // 5. Spawners
        systems::spawner::run(&mut self.registry, &mut self.rng, now);
    }
}
