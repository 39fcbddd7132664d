//! Handles shared between the transport layer and the game loop thread.
//!
//! Every mutation reaches the simulation as a [`LoopCommand`] on a single
//! channel drained at the start of each tick. Outbound events for a session
//! arrive on that session's own receiver.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::{info, warn};

use arena_core::commands::{PlayerAction, PlayerCommand};
use arena_core::error::SessionError;
use arena_core::events::ServerEvent;
use arena_core::records::PlayerRecord;
use arena_core::state::InitPayload;
use arena_sim::session::validate_username;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::game_loop;
use crate::persistence::PlayerStore;

/// Commands sent to the game loop thread.
#[derive(Debug)]
pub enum LoopCommand {
    /// Materialise a player. The outcome is sent back on `reply`.
    Connect {
        username: String,
        record: Option<PlayerRecord>,
        outbox: mpsc::Sender<ServerEvent>,
        reply: mpsc::Sender<Result<InitPayload, SessionError>>,
    },
    /// Remove a player and persist its record.
    Disconnect { username: String },
    /// A player command to forward to the simulation engine.
    Player(PlayerCommand),
    /// Save everyone and stop the game loop.
    Shutdown,
}

/// A running server: the game loop thread plus the store it loads from.
pub struct ServerHandle {
    commands: mpsc::Sender<LoopCommand>,
    store: Arc<dyn PlayerStore>,
    thread: Option<JoinHandle<()>>,
}

impl ServerHandle {
    /// Spawn the game loop and save worker.
    pub fn start(config: &ServerConfig, store: Arc<dyn PlayerStore>) -> Result<Self, ServerError> {
        let (commands, thread) = game_loop::spawn_game_loop(config, store.clone())?;
        info!(
            seed = config.server.seed,
            tick_rate = config.server.tick_rate,
            "game loop started"
        );
        Ok(Self {
            commands,
            store,
            thread: Some(thread),
        })
    }

    /// Open a session for `username`.
    ///
    /// The persisted record is loaded here, on the caller's thread. A failed
    /// load is logged and the player starts from the default record.
    pub fn connect(&self, username: &str) -> Result<Session, ServerError> {
        let username = validate_username(username)?;
        let record = match self.store.load(&username) {
            Ok(record) => record,
            Err(e) => {
                warn!(player = %username, error = %e, "failed to load record, using defaults");
                None
            }
        };

        let (outbox, events) = mpsc::channel();
        let (reply, response) = mpsc::channel();
        self.commands
            .send(LoopCommand::Connect {
                username: username.clone(),
                record,
                outbox,
                reply,
            })
            .map_err(|_| ServerError::Stopped)?;
        let init = response.recv().map_err(|_| ServerError::Stopped)??;

        Ok(Session {
            username,
            init,
            events,
            commands: self.commands.clone(),
        })
    }

    /// Stop the loop, saving every connected player, and wait for it.
    pub fn shutdown(mut self) {
        let _ = self.commands.send(LoopCommand::Shutdown);
        self.join();
    }

    /// Block until the game loop exits.
    pub fn wait(mut self) {
        self.join();
    }

    fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("game loop thread panicked");
            }
        }
    }
}

/// One connected player. Dropping it disconnects the player.
pub struct Session {
    username: String,
    init: InitPayload,
    events: mpsc::Receiver<ServerEvent>,
    commands: mpsc::Sender<LoopCommand>,
}

impl Session {
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Initialisation payload produced on connect.
    pub fn init(&self) -> &InitPayload {
        &self.init
    }

    /// Queue an action for the next tick.
    pub fn send(&self, action: PlayerAction) -> Result<(), ServerError> {
        self.commands
            .send(LoopCommand::Player(PlayerCommand::new(self.username.clone(), action)))
            .map_err(|_| ServerError::Stopped)
    }

    /// Events delivered to this session.
    pub fn events(&self) -> &mpsc::Receiver<ServerEvent> {
        &self.events
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let _ = self.commands.send(LoopCommand::Disconnect {
            username: self.username.clone(),
        });
    }
}
