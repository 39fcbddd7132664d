//! Server configuration.
//!
//! Loaded from TOML; every field has a default so a partial file (or none
//! at all) is valid.
//!
//! ```toml
//! [server]
//! tick_rate = 30
//! seed = 42
//!
//! [persistence]
//! data_dir = "data/players"
//! save_interval_secs = 30
//!
//! [energy]
//! status_interval_ms = 100
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use arena_core::constants::{SAVE_INTERVAL_SECS, TICK_RATE};
use arena_sim::SimConfig;

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: ServerSettings,
    pub persistence: PersistenceSettings,
    pub energy: EnergySettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Real-time ticks per second. The simulation always advances by its
    /// fixed step, so a rate other than the native one speeds the world up
    /// or slows it down.
    pub tick_rate: u32,
    /// RNG seed for the simulation.
    pub seed: u64,
    /// Place the fixed spawners and their drones at startup.
    pub populate_world: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            tick_rate: TICK_RATE,
            seed: 42,
            populate_world: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceSettings {
    /// Directory holding one JSON record per player.
    pub data_dir: PathBuf,
    /// Seconds between periodic saves of every connected player.
    pub save_interval_secs: u64,
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/players"),
            save_interval_secs: SAVE_INTERVAL_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergySettings {
    /// Milliseconds between energy status events per player.
    pub status_interval_ms: u64,
}

impl Default for EnergySettings {
    fn default() -> Self {
        Self {
            status_interval_ms: 100,
        }
    }
}

impl ServerConfig {
    /// Load and validate a config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.tick_rate == 0 {
            return Err(ConfigError::Invalid("server.tick_rate must be positive".into()));
        }
        if self.energy.status_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "energy.status_interval_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Engine configuration derived from these settings.
    pub fn sim_config(&self) -> SimConfig {
        SimConfig {
            seed: self.server.seed,
            energy_status_interval_secs: self.energy.status_interval_ms as f64 / 1000.0,
            populate_world: self.server.populate_world,
        }
    }

    /// Wall-clock duration of one tick.
    pub fn tick_duration(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.server.tick_rate.max(1)))
    }

    pub fn save_interval(&self) -> Duration {
        Duration::from_secs(self.persistence.save_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = ServerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.server.tick_rate, 30);
        assert_eq!(config.persistence.save_interval_secs, 30);
        assert_eq!(config.energy.status_interval_ms, 100);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = ServerConfig::from_toml_str(
            r#"
            [server]
            seed = 7

            [persistence]
            data_dir = "/var/lib/arena"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.seed, 7);
        assert_eq!(config.server.tick_rate, 30);
        assert_eq!(config.persistence.data_dir, PathBuf::from("/var/lib/arena"));
        assert_eq!(config.persistence.save_interval_secs, 30);
    }

    #[test]
    fn test_zero_tick_rate_rejected() {
        let err = ServerConfig::from_toml_str("[server]\ntick_rate = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let err = ServerConfig::from_toml_str("[server\nseed = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let path = std::env::temp_dir().join("arena_test_config_missing.toml");
        let _ = std::fs::remove_file(&path);
        match ServerConfig::from_file(&path) {
            Err(ConfigError::Read { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected read error, got {other:?}"),
        }
    }

    #[test]
    fn test_sim_config_and_durations() {
        let mut config = ServerConfig::default();
        config.energy.status_interval_ms = 250;
        let sim = config.sim_config();
        assert_eq!(sim.seed, 42);
        assert!((sim.energy_status_interval_secs - 0.25).abs() < 1e-12);
        assert_eq!(config.tick_duration(), Duration::from_nanos(1_000_000_000 / 30));
        assert_eq!(config.save_interval(), Duration::from_secs(30));
    }
}
