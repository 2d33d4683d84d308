//! Launch configuration loading and saving.
//!
//! `config.json` only carries timeouts handed to the asynchronous collaborators.
//! The server address lives in the preference store alongside the session keys.

use crate::error::{CoreError, Result};
use crate::storage::StorageConfig;
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_PROBE_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_FEED_TIMEOUT_MS: u64 = 15_000;

/// Timeouts for the connectivity probe and the feed fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchConfig {
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    #[serde(default = "default_feed_timeout_ms")]
    pub feed_timeout_ms: u64,
}

fn default_probe_timeout_ms() -> u64 {
    DEFAULT_PROBE_TIMEOUT_MS
}

fn default_feed_timeout_ms() -> u64 {
    DEFAULT_FEED_TIMEOUT_MS
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            feed_timeout_ms: DEFAULT_FEED_TIMEOUT_MS,
        }
    }
}

impl LaunchConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn feed_timeout(&self) -> Duration {
        Duration::from_millis(self.feed_timeout_ms)
    }
}

/// Loads the launch configuration, returning defaults if the file is missing or malformed.
pub fn load_launch_config(storage: &StorageConfig) -> LaunchConfig {
    let path = storage.config_file();
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => return LaunchConfig::default(),
    };

    serde_json::from_str(&content).unwrap_or_else(|err| {
        tracing::warn!(path = %path.display(), error = %err, "Malformed launch config, using defaults");
        LaunchConfig::default()
    })
}

/// Saves the launch configuration to disk.
pub fn save_launch_config(storage: &StorageConfig, config: &LaunchConfig) -> Result<()> {
    let path = storage.config_file();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| CoreError::Io {
            context: "create config directory".to_string(),
            source,
        })?;
    }
    let content = serde_json::to_string_pretty(config).map_err(|source| CoreError::Json {
        context: "serialize launch config".to_string(),
        source,
    })?;
    fs::write(&path, content).map_err(|source| CoreError::Io {
        context: format!("write {}", path.display()),
        source,
    })
}
