//! Key-value preference store.
//!
//! The platform store (UserDefaults, SharedPreferences) is an external
//! collaborator; the core only needs synchronous `get`/`set`/`remove` that are
//! durable before they return. Two implementations live here:
//!
//! - [`MemoryPreferenceStore`]: shared in-process map, used by tests and
//!   embedders that persist elsewhere.
//! - [`JsonPreferenceStore`]: `preferences.json` with atomic writes.
//!
//! # File Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "values": {
//!     "user_id": "10153",
//!     "hasPressedLater": false
//!   }
//! }
//! ```
//!
//! # Defensive Design
//!
//! Empty, corrupt, or future-version files load as an empty store with a
//! warning. A launch must never be blocked by a broken preferences file.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use fs_err as fs;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{CoreError, Result};

/// Keys persisted by the core.
pub mod keys {
    pub const USER_ID: &str = "user_id";
    pub const USER_NAME: &str = "user_name";
    pub const SIGNED_IN_WITH: &str = "signedInWith";
    pub const HAS_PRESSED_LATER: &str = "hasPressedLater";
    pub const SERVER_URL: &str = "server_url";
}

const STORE_VERSION: u32 = 1;

/// A stored preference value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    Bool(bool),
    String(String),
}

impl From<bool> for PrefValue {
    fn from(value: bool) -> Self {
        PrefValue::Bool(value)
    }
}

impl From<&str> for PrefValue {
    fn from(value: &str) -> Self {
        PrefValue::String(value.to_string())
    }
}

impl From<String> for PrefValue {
    fn from(value: String) -> Self {
        PrefValue::String(value)
    }
}

/// Synchronous key-value store. Writes are durable when the call returns.
pub trait PreferenceStore: Send {
    fn get(&self, key: &str) -> Option<PrefValue>;

    fn set(&mut self, key: &str, value: PrefValue) -> Result<()>;

    fn remove(&mut self, key: &str) -> Result<()>;

    /// Applies every change or none of them. `None` removes the key.
    fn apply_all(&mut self, changes: &[(&str, Option<PrefValue>)]) -> Result<()>;

    /// Reads a string value. Values of another type are reported and treated as absent.
    fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key) {
            Some(PrefValue::String(value)) => Some(value),
            Some(PrefValue::Bool(_)) => {
                let err = CoreError::PreferenceType {
                    key: key.to_string(),
                    expected: "string",
                };
                tracing::warn!(error = %err, "Ignoring mistyped preference");
                None
            }
            None => None,
        }
    }

    /// Reads a bool value; absent or mistyped values read as `false`.
    fn get_bool(&self, key: &str) -> bool {
        match self.get(key) {
            Some(PrefValue::Bool(value)) => value,
            Some(PrefValue::String(_)) => {
                let err = CoreError::PreferenceType {
                    key: key.to_string(),
                    expected: "bool",
                };
                tracing::warn!(error = %err, "Reading mistyped preference as false");
                false
            }
            None => false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory store
// ─────────────────────────────────────────────────────────────────────────────

/// Process-local store. Clones share the same map, so a test can keep a handle
/// while the session owns another and then "restart" from it.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferenceStore {
    values: Arc<Mutex<BTreeMap<String, PrefValue>>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, PrefValue>> {
        // Recover from poisoning - a panicking writer cannot leave a half-written entry
        self.values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Option<PrefValue> {
        self.lock().get(key).cloned()
    }

    fn set(&mut self, key: &str, value: PrefValue) -> Result<()> {
        self.lock().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }

    fn apply_all(&mut self, changes: &[(&str, Option<PrefValue>)]) -> Result<()> {
        let mut values = self.lock();
        for (key, change) in changes {
            match change {
                Some(value) => values.insert(key.to_string(), value.clone()),
                None => values.remove(*key),
            };
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File-backed store
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    #[serde(default)]
    values: BTreeMap<String, PrefValue>,
}

/// Preference store backed by a JSON file, rewritten atomically on every change.
#[derive(Debug)]
pub struct JsonPreferenceStore {
    values: BTreeMap<String, PrefValue>,
    file_path: PathBuf,
}

impl JsonPreferenceStore {
    /// Opens the store at `file_path`. A missing file is an empty store.
    pub fn load(file_path: &Path) -> Result<Self> {
        let empty = || JsonPreferenceStore {
            values: BTreeMap::new(),
            file_path: file_path.to_path_buf(),
        };

        if !file_path.exists() {
            return Ok(empty());
        }

        let content = fs::read_to_string(file_path).map_err(|source| CoreError::Io {
            context: "read preferences".to_string(),
            source,
        })?;

        if content.trim().is_empty() {
            tracing::warn!(path = %file_path.display(), "Empty preferences file, starting fresh");
            return Ok(empty());
        }

        match serde_json::from_str::<StoreFile>(&content) {
            Ok(file) if file.version == STORE_VERSION => Ok(JsonPreferenceStore {
                values: file.values,
                file_path: file_path.to_path_buf(),
            }),
            Ok(file) => {
                tracing::warn!(
                    version = file.version,
                    expected = STORE_VERSION,
                    "Unsupported preferences version, starting fresh"
                );
                Ok(empty())
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to parse preferences, starting fresh");
                Ok(empty())
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn save(&self) -> Result<()> {
        let store_file = StoreFile {
            version: STORE_VERSION,
            values: self.values.clone(),
        };
        let content = serde_json::to_string_pretty(&store_file).map_err(|source| {
            CoreError::Json {
                context: "serialize preferences".to_string(),
                source,
            }
        })?;

        let parent_dir = self.file_path.parent().ok_or(CoreError::NoStoragePath)?;
        fs::create_dir_all(parent_dir).map_err(|source| CoreError::Io {
            context: "create preferences directory".to_string(),
            source,
        })?;

        let persist_failed = |source| CoreError::PersistFailed {
            path: self.file_path.clone(),
            source,
        };
        let mut temp_file = NamedTempFile::new_in(parent_dir).map_err(persist_failed)?;
        temp_file
            .write_all(content.as_bytes())
            .map_err(persist_failed)?;
        temp_file.flush().map_err(persist_failed)?;
        temp_file
            .persist(&self.file_path)
            .map_err(|e| persist_failed(e.error))?;

        Ok(())
    }

    /// Applies `changes` and writes the file once; restores the previous
    /// values if the write fails.
    fn apply(&mut self, changes: &[(&str, Option<PrefValue>)]) -> Result<()> {
        let previous = self.values.clone();
        for (key, change) in changes {
            match change {
                Some(value) => self.values.insert(key.to_string(), value.clone()),
                None => self.values.remove(*key),
            };
        }

        if let Err(err) = self.save() {
            self.values = previous;
            return Err(err);
        }
        Ok(())
    }
}

impl PreferenceStore for JsonPreferenceStore {
    fn get(&self, key: &str) -> Option<PrefValue> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: PrefValue) -> Result<()> {
        self.apply(&[(key, Some(value))])
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if !self.values.contains_key(key) {
            return Ok(());
        }
        self.apply(&[(key, None)])
    }

    fn apply_all(&mut self, changes: &[(&str, Option<PrefValue>)]) -> Result<()> {
        self.apply(changes)
    }
}

#[cfg(test)]
pub mod test_utils {
    //! Store that refuses writes touching one key.

    use super::*;

    /// Wraps a [`MemoryPreferenceStore`]; any write that touches `failing_key`
    /// fails and changes nothing.
    pub struct FailingPreferenceStore {
        pub inner: MemoryPreferenceStore,
        pub failing_key: &'static str,
    }

    impl FailingPreferenceStore {
        pub fn new(inner: MemoryPreferenceStore, failing_key: &'static str) -> Self {
            Self { inner, failing_key }
        }

        fn check(&self, key: &str) -> Result<()> {
            if key == self.failing_key {
                return Err(CoreError::Io {
                    context: format!("write {}", key),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
                });
            }
            Ok(())
        }
    }

    impl PreferenceStore for FailingPreferenceStore {
        fn get(&self, key: &str) -> Option<PrefValue> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: PrefValue) -> Result<()> {
            self.check(key)?;
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<()> {
            self.check(key)?;
            self.inner.remove(key)
        }

        fn apply_all(&mut self, changes: &[(&str, Option<PrefValue>)]) -> Result<()> {
            for (key, _) in changes {
                self.check(key)?;
            }
            self.inner.apply_all(changes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_clones_share_values() {
        let handle = MemoryPreferenceStore::new();
        let mut owned = handle.clone();

        owned.set(keys::USER_ID, "abc".into()).unwrap();
        assert_eq!(handle.get_string(keys::USER_ID), Some("abc".to_string()));

        owned.remove(keys::USER_ID).unwrap();
        assert!(handle.is_empty());
    }

    #[test]
    fn test_typed_getters_ignore_mismatched_types() {
        let mut store = MemoryPreferenceStore::new();
        store.set(keys::USER_NAME, true.into()).unwrap();
        store.set(keys::HAS_PRESSED_LATER, "yes".into()).unwrap();

        assert_eq!(store.get_string(keys::USER_NAME), None);
        assert!(!store.get_bool(keys::HAS_PRESSED_LATER));
        assert!(!store.get_bool("missing"));
    }

    #[test]
    fn test_json_store_persists_across_loads() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("prefs").join("preferences.json");

        let mut store = JsonPreferenceStore::load(&path).unwrap();
        store.set(keys::USER_NAME, "Ada".into()).unwrap();
        store.set(keys::HAS_PRESSED_LATER, true.into()).unwrap();

        let reloaded = JsonPreferenceStore::load(&path).unwrap();
        assert_eq!(reloaded.get_string(keys::USER_NAME), Some("Ada".to_string()));
        assert!(reloaded.get_bool(keys::HAS_PRESSED_LATER));
    }

    #[test]
    fn test_json_store_remove_is_durable() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("preferences.json");

        let mut store = JsonPreferenceStore::load(&path).unwrap();
        store.set(keys::USER_ID, "42".into()).unwrap();
        store.remove(keys::USER_ID).unwrap();
        store.remove("never-set").unwrap();

        let reloaded = JsonPreferenceStore::load(&path).unwrap();
        assert_eq!(reloaded.get(keys::USER_ID), None);
    }

    #[test]
    fn test_json_store_batch_is_all_or_nothing() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let path = blocker.join("preferences.json");

        let mut store = JsonPreferenceStore::load(&path).unwrap();
        let result = store.apply_all(&[
            (keys::USER_ID, Some(PrefValue::from("g-77"))),
            (keys::USER_NAME, Some(PrefValue::from("Grace"))),
        ]);

        assert!(result.is_err());
        assert_eq!(store.get(keys::USER_ID), None);
        assert_eq!(store.get(keys::USER_NAME), None);
    }

    #[test]
    fn test_json_store_batch_writes_and_removes_together() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("preferences.json");

        let mut store = JsonPreferenceStore::load(&path).unwrap();
        store.set(keys::USER_ID, "10153".into()).unwrap();
        store
            .apply_all(&[
                (keys::USER_ID, None),
                (keys::SIGNED_IN_WITH, Some(PrefValue::from("SignedOut"))),
            ])
            .unwrap();

        let reloaded = JsonPreferenceStore::load(&path).unwrap();
        assert_eq!(reloaded.get(keys::USER_ID), None);
        assert_eq!(
            reloaded.get_string(keys::SIGNED_IN_WITH),
            Some("SignedOut".to_string())
        );
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("preferences.json");
        fs::write(&path, "{\"version\": 1, \"values\": ").unwrap();

        let store = JsonPreferenceStore::load(&path).unwrap();
        assert_eq!(store.get(keys::USER_ID), None);
    }

    #[test]
    fn test_empty_and_future_version_files_load_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("preferences.json");

        fs::write(&path, "   \n").unwrap();
        assert!(JsonPreferenceStore::load(&path).unwrap().values.is_empty());

        fs::write(&path, r#"{"version": 9, "values": {"user_id": "x"}}"#).unwrap();
        assert!(JsonPreferenceStore::load(&path).unwrap().values.is_empty());
    }

    #[test]
    fn test_file_format_is_stable() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("preferences.json");

        let mut store = JsonPreferenceStore::load(&path).unwrap();
        store.set(keys::SIGNED_IN_WITH, "SignedOut".into()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["version"], 1);
        assert_eq!(raw["values"]["signedInWith"], "SignedOut");
    }
}
