//! Persisted console preferences.
//!
//! The engine remembers exactly two scalars across sessions: the last
//! page address (to prefill the outbound-message form) and the
//! controller credential. Both are best effort: a missing or broken
//! store must never prevent normal operation.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use log::{info, warn};

/// Key of the remembered page address.
pub const ADDRESS_KEY: &str = "pager_addr";

/// Key of the persisted controller credential.
pub const CREDENTIAL_KEY: &str = "pager_auth";

const PREFS_FILE_NAME: &str = "console-prefs.json";
const PREFS_DIR_NAME: &str = "pagercon";

/// Caller-provided persistent key/value store.
///
/// All operations are best effort: implementations log failures
/// instead of surfacing them.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Remembered page address, defaulting to 0 when absent or unreadable.
pub fn remembered_address(store: &dyn KeyValueStore) -> u32 {
    store
        .get(ADDRESS_KEY)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0)
}

/// Ephemeral store for tests and embedders with their own persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
    }
}

/// File-backed store: one flat JSON object, written atomically
/// (temp file + rename).
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl JsonFileStore {
    /// Open the store at the platform config directory
    /// (`<config_dir>/pagercon/console-prefs.json`).
    pub fn open_default() -> Self {
        let dir = dirs::config_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(PREFS_DIR_NAME);
        Self::open(dir.join(PREFS_FILE_NAME))
    }

    /// Open a store at an explicit path. A missing file starts empty;
    /// an unreadable one is logged and discarded.
    pub fn open(path: PathBuf) -> Self {
        let entries = match fs::read_to_string(&path) {
            Ok(data) => serde_json::from_str(&data).unwrap_or_else(|e| {
                warn!(
                    "Discarding unreadable preference file {}: {}",
                    path.display(),
                    e
                );
                HashMap::new()
            }),
            Err(_) => {
                info!(
                    "No preference file at {}, starting empty",
                    path.display()
                );
                HashMap::new()
            }
        };

        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn persist(&self, entries: &HashMap<String, String>) {
        let json = match serde_json::to_string_pretty(entries) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize preferences: {}", e);
                return;
            }
        };

        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!(
                    "Failed to create preference directory {}: {}",
                    parent.display(),
                    e
                );
                return;
            }
        }

        let temp_path = self.path.with_extension("json.tmp");
        if let Err(e) = fs::write(&temp_path, json) {
            warn!(
                "Failed to write preferences to {}: {}",
                temp_path.display(),
                e
            );
            return;
        }

        if let Err(e) = fs::rename(&temp_path, &self.path) {
            warn!(
                "Failed to move preferences into place at {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_owned(), value.to_owned());
        self.persist(&entries);
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        self.persist(&entries);
    }
}
