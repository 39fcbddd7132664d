//! # Arena Server
//!
//! Headless authoritative simulation host.
//!
//! ```bash
//! # Defaults: 30 Hz, seed 42, records under ./data/players
//! arena-server
//!
//! # Config file, with CLI overrides
//! arena-server --config server.toml --seed 7 --data-dir /var/lib/arena
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use arena_server::config::ServerConfig;
use arena_server::persistence::JsonFileStore;
use arena_server::state::ServerHandle;

#[derive(Parser, Debug)]
#[command(name = "arena-server")]
#[command(about = "Authoritative arena simulation server")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for player records
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Simulation RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = match &args.config {
        Some(path) => match ServerConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                error!("{e}");
                return ExitCode::FAILURE;
            }
        },
        None => ServerConfig::default(),
    };

    // CLI takes precedence over the file
    if let Some(dir) = args.data_dir {
        config.persistence.data_dir = dir;
    }
    if let Some(seed) = args.seed {
        config.server.seed = seed;
    }

    info!("Server configuration:");
    info!("  Tick rate: {} Hz", config.server.tick_rate);
    info!("  Seed: {}", config.server.seed);
    info!("  Data dir: {}", config.persistence.data_dir.display());
    info!("  Save interval: {}s", config.persistence.save_interval_secs);

    let store = Arc::new(JsonFileStore::new(config.persistence.data_dir.clone()));
    match ServerHandle::start(&config, store) {
        Ok(server) => {
            server.wait();
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("failed to start server: {e}");
            ExitCode::FAILURE
        }
    }
}
