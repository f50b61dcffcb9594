//! Environment-driven server configuration.

use crate::error::{ServerError, ServerResult};
use classboard_model::ClockConfig;
use classboard_store::StoreConfig;
use classboard_sync::{EngineConfig, GuardConfig};
use std::path::PathBuf;

/// Environment variable names.
const ENV_DATA_DIR: &str = "CLASSBOARD_DATA_DIR";
const ENV_PEERS: &str = "CLASSBOARD_PEERS";
const ENV_SYNC_SECRET: &str = "CLASSBOARD_SYNC_SECRET";
const ENV_MIN_ROSTER: &str = "CLASSBOARD_MIN_ROSTER";
const ENV_MASTER_MODE: &str = "CLASSBOARD_MASTER_MODE";
const ENV_RESTORE_LOCK: &str = "CLASSBOARD_RESTORE_LOCK";
const ENV_UTC_OFFSET: &str = "CLASSBOARD_UTC_OFFSET";

/// Server node configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Data directory for the snapshot store.
    pub data_dir: PathBuf,
    /// Peer base URLs.
    pub peers: Vec<String>,
    /// Shared replica secret, cleartext (hashed at the auth boundary).
    pub sync_secret: Option<String>,
    /// Minimum safe roster size for the corruption guard.
    pub min_roster: usize,
    /// Master mode: restricts what this node accepts from replicas.
    pub master_mode: bool,
    /// Restore lock: temporarily blocks all writes.
    pub restore_lock: bool,
    /// Server clock (fixed UTC offset).
    pub clock: ClockConfig,
}

impl ServerConfig {
    /// Creates a configuration with defaults for the given data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            peers: Vec::new(),
            sync_secret: None,
            min_roster: 25,
            master_mode: false,
            restore_lock: false,
            clock: ClockConfig::default(),
        }
    }

    /// Reads the configuration surface from the environment.
    pub fn from_env() -> ServerResult<Self> {
        let data_dir = std::env::var(ENV_DATA_DIR).unwrap_or_else(|_| "instance".into());
        let mut config = Self::new(data_dir);

        if let Ok(peers) = std::env::var(ENV_PEERS) {
            config.peers = peers
                .split(',')
                .map(|p| p.trim().trim_end_matches('/').to_string())
                .filter(|p| !p.is_empty())
                .collect();
        }
        if let Ok(secret) = std::env::var(ENV_SYNC_SECRET) {
            if !secret.trim().is_empty() {
                config.sync_secret = Some(secret);
            }
        }
        if let Ok(min) = std::env::var(ENV_MIN_ROSTER) {
            config.min_roster = min
                .trim()
                .parse()
                .map_err(|_| ServerError::Internal(format!("invalid {ENV_MIN_ROSTER}: {min}")))?;
        }
        config.master_mode = env_flag(ENV_MASTER_MODE);
        config.restore_lock = env_flag(ENV_RESTORE_LOCK);
        if let Ok(offset) = std::env::var(ENV_UTC_OFFSET) {
            config.clock = ClockConfig::from_offset_str(&offset)
                .map_err(|err| ServerError::Internal(err.to_string()))?;
        }

        Ok(config)
    }

    /// Sets the peer list.
    #[must_use]
    pub fn with_peers(mut self, peers: Vec<String>) -> Self {
        self.peers = peers;
        self
    }

    /// Sets the shared secret.
    #[must_use]
    pub fn with_sync_secret(mut self, secret: impl Into<String>) -> Self {
        self.sync_secret = Some(secret.into());
        self
    }

    /// Sets master mode.
    #[must_use]
    pub fn with_master_mode(mut self, on: bool) -> Self {
        self.master_mode = on;
        self
    }

    /// Sets the restore lock.
    #[must_use]
    pub fn with_restore_lock(mut self, on: bool) -> Self {
        self.restore_lock = on;
        self
    }

    /// Sets the minimum roster size.
    #[must_use]
    pub fn with_min_roster(mut self, min: usize) -> Self {
        self.min_roster = min;
        self
    }

    /// The engine configuration this server config implies.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new()
            .with_peers(self.peers.clone())
            .with_master_mode(self.master_mode)
            .with_restore_lock(self.restore_lock)
            .with_clock(self.clock)
            .with_guard(GuardConfig {
                min_roster: self.min_roster,
                ..GuardConfig::default()
            })
    }

    /// The store configuration this server config implies.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(self.clock)
    }
}

fn env_flag(name: &str) -> bool {
    matches!(
        std::env::var(name).unwrap_or_default().trim(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::new("instance");
        assert_eq!(config.min_roster, 25);
        assert!(!config.master_mode);
        assert!(config.sync_secret.is_none());
    }

    #[test]
    fn builder() {
        let config = ServerConfig::new("instance")
            .with_peers(vec!["http://10.0.0.2:5000".into()])
            .with_sync_secret("s3cret-s3cret-s3cret")
            .with_master_mode(true)
            .with_min_roster(30);
        assert_eq!(config.peers.len(), 1);
        assert!(config.master_mode);
        assert_eq!(config.engine_config().guard.min_roster, 30);
    }
}
