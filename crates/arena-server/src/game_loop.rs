//! Game loop thread: runs the simulation at a fixed rate and routes output.
//!
//! The engine is created inside this thread and never leaves it. Commands
//! arrive over `mpsc`; each session has its own event sender. Saving goes
//! through the [`SaveWorker`] so the loop never touches the disk.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use arena_core::events::{Outbound, Recipient, ServerEvent};
use arena_sim::{SimulationEngine, TickOutput};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::persistence::{PlayerStore, SaveWorker};
use crate::state::LoopCommand;

/// Spawn the game loop in a new thread.
///
/// Returns the command sender for the transport layer and the thread handle.
pub fn spawn_game_loop(
    config: &ServerConfig,
    store: Arc<dyn PlayerStore>,
) -> Result<(mpsc::Sender<LoopCommand>, JoinHandle<()>), ServerError> {
    let (cmd_tx, cmd_rx) = mpsc::channel::<LoopCommand>();
    let saver = SaveWorker::spawn(store)?;
    let sim_config = config.sim_config();
    let pacing = Pacing {
        tick: config.tick_duration(),
        save_interval: config.save_interval(),
    };

    let handle = std::thread::Builder::new()
        .name("arena-game-loop".into())
        .spawn(move || {
            let engine = SimulationEngine::new(sim_config);
            run_game_loop(engine, cmd_rx, saver, pacing);
        })
        .map_err(ServerError::Spawn)?;

    Ok((cmd_tx, handle))
}

#[derive(Debug, Clone, Copy)]
struct Pacing {
    tick: Duration,
    save_interval: Duration,
}

/// Per-session outbound channels.
#[derive(Default)]
struct Router {
    sessions: BTreeMap<String, mpsc::Sender<ServerEvent>>,
}

impl Router {
    /// Deliver a tick's output. Returns sessions whose receiver is gone.
    fn route(&self, output: TickOutput) -> BTreeSet<String> {
        let mut dead = BTreeSet::new();

        for snapshot in output.snapshots {
            for player in &snapshot.players {
                let event = ServerEvent::State {
                    snapshot: Box::new(snapshot.clone()),
                };
                self.deliver(&player.username, event, &mut dead);
            }
        }

        for Outbound { to, event } in output.events {
            let Recipient::Player(name) = to;
            self.deliver(&name, event, &mut dead);
        }
        dead
    }

    fn deliver(&self, name: &str, event: ServerEvent, dead: &mut BTreeSet<String>) {
        if let Some(tx) = self.sessions.get(name) {
            if tx.send(event).is_err() {
                dead.insert(name.to_string());
            }
        }
    }

    fn broadcast(&self, event: ServerEvent) {
        for tx in self.sessions.values() {
            let _ = tx.send(event.clone());
        }
    }
}

/// The game loop. Runs until Shutdown or until every command sender is gone.
fn run_game_loop(
    mut engine: SimulationEngine,
    cmd_rx: mpsc::Receiver<LoopCommand>,
    saver: SaveWorker,
    pacing: Pacing,
) {
    let mut router = Router::default();
    let mut next_tick_time = Instant::now();
    let mut last_save = Instant::now();

    loop {
        // 1. Drain all pending commands
        let mut stop = false;
        loop {
            match cmd_rx.try_recv() {
                Ok(LoopCommand::Connect {
                    username,
                    record,
                    outbox,
                    reply,
                }) => {
                    // A save still in flight is newer than anything the store returned.
                    let record = saver.pending(&username).or(record);
                    let result = engine.connect(&username, record);
                    if result.is_ok() {
                        router.sessions.insert(username, outbox);
                    }
                    let _ = reply.send(result);
                }
                Ok(LoopCommand::Disconnect { username }) => {
                    end_session(&mut engine, &mut router, &saver, &username);
                }
                Ok(LoopCommand::Player(cmd)) => engine.queue_command(cmd),
                Ok(LoopCommand::Shutdown) | Err(mpsc::TryRecvError::Disconnected) => {
                    stop = true;
                    break;
                }
                Err(mpsc::TryRecvError::Empty) => break,
            }
        }
        if stop {
            break;
        }

        // 2. Advance one tick and deliver its output
        let tick_started = Instant::now();
        let output = engine.tick();
        for name in router.route(output) {
            debug!(player = %name, "session receiver dropped");
            end_session(&mut engine, &mut router, &saver, &name);
        }

        // 3. Periodic save of everyone connected
        if last_save.elapsed() >= pacing.save_interval {
            for record in engine.player_records() {
                saver.save(record);
            }
            saver.retry_failed();
            last_save = Instant::now();
        }

        let work = tick_started.elapsed();
        if work > pacing.tick {
            warn!(tick = engine.time().tick, ?work, "tick overran its budget");
        }

        // 4. Sleep until the next tick
        next_tick_time += pacing.tick;
        let now = Instant::now();
        if next_tick_time > now {
            std::thread::sleep(next_tick_time - now);
        } else if now - next_tick_time > pacing.tick * 2 {
            // Too far behind, reset to avoid a catch-up spiral
            next_tick_time = now;
        }
    }

    router.broadcast(ServerEvent::Disconnected {
        reason: "server shutting down".into(),
    });
    let records = engine.player_records();
    info!(players = records.len(), "game loop stopping, saving players");
    for record in records {
        saver.save(record);
    }
    saver.shutdown();
}

fn end_session(engine: &mut SimulationEngine, router: &mut Router, saver: &SaveWorker, username: &str) {
    router.sessions.remove(username);
    if let Some(record) = engine.disconnect(username) {
        saver.save(record);
    }
}
