//! Persisted state - one JSON value per key
//!
//! Every mutable table of the workbench is stored under its own key. Values
//! that are missing or fail to parse fall back to their documented default,
//! so a corrupted file never prevents the tool from starting.

use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Keys of the persisted values
pub mod keys {
    pub const STEP: &str = "step";
    pub const PROFILES: &str = "profiles";
    pub const ACTIVE_PROFILE: &str = "active_profile";
    pub const ADJUSTMENTS: &str = "adjustments";
    pub const LOOP_TYPES: &str = "loop_types";
    pub const LOOP_SETUP: &str = "loop_setup";
    pub const LOOP_PRESETS: &str = "loop_presets";
    pub const SHEET: &str = "sheet";
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode value: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Invalid store key '{0}'")]
    InvalidKey(String),
}

/// Key/value storage for structured-text values
pub trait Store {
    /// Raw stored text for a key
    fn get(&self, key: &str) -> Option<String>;

    /// Replace the stored text for a key
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Load a value, falling back to `default` when absent or unreadable
pub fn load_or<T, S, F>(store: &S, key: &str, default: F) -> T
where
    T: DeserializeOwned,
    S: Store + ?Sized,
    F: FnOnce() -> T,
{
    match store.get(key) {
        None => default(),
        Some(content) => match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Stored value '{}' is unreadable ({}), using default", key, e);
                default()
            }
        },
    }
}

/// Encode and store a value
pub fn save<T, S>(store: &mut S, key: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize + ?Sized,
    S: Store + ?Sized,
{
    let content = serde_json::to_string_pretty(value)?;
    store.set(key, &content)
}

fn check_key(key: &str) -> Result<(), StoreError> {
    let ok = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

/// Store keeping one `<key>.json` file per key in a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        check_key(key).ok()?;
        fs::read_to_string(self.path(key)).ok()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        check_key(key)?;
        // Readers only ever see a complete value: write aside, then rename
        let path = self.path(key);
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// In-memory store, used by tests and dry runs
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        check_key(key)?;
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        let mut table = BTreeMap::new();
        table.insert("AR1|L".to_string(), 10.0);
        save(&mut store, keys::ADJUSTMENTS, &table).unwrap();

        let loaded: BTreeMap<String, f64> = load_or(&store, keys::ADJUSTMENTS, BTreeMap::new);
        assert_eq!(loaded, table);
    }

    #[test]
    fn test_missing_key_uses_default() {
        let store = MemoryStore::new();
        let value: Vec<u32> = load_or(&store, "nothing", || vec![1, 2]);
        assert_eq!(value, vec![1, 2]);
    }

    #[test]
    fn test_corrupt_value_uses_default() {
        let mut store = MemoryStore::new();
        store.set(keys::LOOP_TYPES, "{not json").unwrap();
        let value: BTreeMap<String, f64> = load_or(&store, keys::LOOP_TYPES, || {
            let mut m = BTreeMap::new();
            m.insert("SL".to_string(), 0.0);
            m
        });
        assert_eq!(value.get("SL"), Some(&0.0));
    }

    #[test]
    fn test_file_store_writes_one_file_per_key() {
        let tmp = TempDir::new().unwrap();
        let mut store = FileStore::open(tmp.path().join("state")).unwrap();
        save(&mut store, keys::STEP, &"loops").unwrap();

        let path = tmp.path().join("state").join("step.json");
        assert!(path.exists());
        assert_eq!(store.get(keys::STEP).as_deref(), Some("\"loops\""));
    }

    #[test]
    fn test_invalid_keys_are_rejected() {
        let mut store = MemoryStore::new();
        assert!(matches!(
            store.set("../escape", "1"),
            Err(StoreError::InvalidKey(_))
        ));
        assert!(store.set("", "1").is_err());
    }
}
