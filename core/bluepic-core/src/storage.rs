//! Storage configuration and path management for BluePic.
//!
//! All on-disk locations used by the core and the command line driver are
//! decided here so tests can point everything at a temp directory.
//!
//! ## Design Principles
//!
//! - **Single source of truth**: All path decisions centralized here
//! - **Testable**: `StorageConfig::with_root()` enables test injection

use std::path::{Path, PathBuf};

/// Central configuration for all BluePic storage paths.
///
/// Production code uses `StorageConfig::default()` which points to `~/.bluepic/`.
/// Tests use `StorageConfig::with_root(temp_dir)` for isolation.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(std::env::temp_dir);
        Self {
            root: home.join(".bluepic"),
        }
    }
}

impl StorageConfig {
    /// Creates a StorageConfig with a custom root directory.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    /// Returns the root directory for BluePic data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Files
    // ─────────────────────────────────────────────────────────────────────────────

    /// Path to preferences.json (the key-value preference store).
    pub fn preferences_file(&self) -> PathBuf {
        self.root.join("preferences.json")
    }

    /// Path to config.json (launch timeouts).
    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.json")
    }

    /// Path to feed.json, read by the file-backed feed service.
    pub fn feed_file(&self) -> PathBuf {
        self.root.join("feed.json")
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Directories
    // ─────────────────────────────────────────────────────────────────────────────

    /// Path to logs/ directory (rolling CLI logs).
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_hang_off_root() {
        let storage = StorageConfig::with_root(PathBuf::from("/tmp/bluepic-test"));
        assert_eq!(storage.root(), Path::new("/tmp/bluepic-test"));
        assert_eq!(
            storage.preferences_file(),
            PathBuf::from("/tmp/bluepic-test/preferences.json")
        );
        assert_eq!(
            storage.config_file(),
            PathBuf::from("/tmp/bluepic-test/config.json")
        );
        assert_eq!(storage.logs_dir(), PathBuf::from("/tmp/bluepic-test/logs"));
    }

    #[test]
    fn test_default_root_is_dot_bluepic() {
        let storage = StorageConfig::default();
        assert!(storage.root().ends_with(".bluepic"));
    }
}
