//! Key-value storage capability
//!
//! Everything PayTrack persists is a string under a string key. Two stores are
//! in play: a long-lived *local* store (PIN, settings, projects) and a
//! *session* store whose lifetime is one unlocked session.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Result, StoreError};

/// A flat string-to-string store
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` if the key is absent
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key; removing an absent key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// Shared handle to a store
pub type SharedStore = Arc<dyn KeyValueStore>;

/// The pair of stores every service works against
#[derive(Clone)]
pub struct Stores {
    /// Long-lived store
    pub local: SharedStore,
    /// Store scoped to one unlocked session
    pub session: SharedStore,
}

impl Stores {
    /// Bundle a local and a session store
    pub fn new(local: SharedStore, session: SharedStore) -> Self {
        Self { local, session }
    }

    /// Two fresh in-memory stores
    pub fn in_memory() -> Self {
        Self {
            local: Arc::new(MemoryStore::new()),
            session: Arc::new(MemoryStore::new()),
        }
    }
}

/// Read and decode a JSON value
///
/// Missing keys, empty strings and a literal `null` all read as `None`.
pub fn get_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    match store.get(key)? {
        Some(raw) if !raw.trim().is_empty() && raw.trim() != "null" => {
            Ok(Some(serde_json::from_str(&raw)?))
        }
        _ => Ok(None),
    }
}

/// Encode and write a JSON value
pub fn set_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

/// Store held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys held
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether the store holds no keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// Store persisted as a single JSON object on disk
///
/// Every write rewrites the whole file through a temp file and a rename.
pub struct JsonFileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open (or lazily create) a store at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            StoreError::Corrupt(format!("{}: {}", self.path.display(), e))
        })
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let content = serde_json::to_string_pretty(entries)?;

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, &content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600))?;
        }

        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)?;
        tracing::trace!("Wrote {} to {:?}", key, self.path);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.get("missing").unwrap().is_none());

        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(store.len(), 1);

        store.remove("a").unwrap();
        store.remove("a").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_get_json_treats_empty_and_null_as_missing() {
        let store = MemoryStore::new();
        store.set("empty", "").unwrap();
        store.set("null", "null").unwrap();

        assert!(get_json::<Sample>(&store, "empty").unwrap().is_none());
        assert!(get_json::<Sample>(&store, "null").unwrap().is_none());
        assert!(get_json::<Sample>(&store, "missing").unwrap().is_none());
    }

    #[test]
    fn test_get_json_rejects_garbage() {
        let store = MemoryStore::new();
        store.set("bad", "{not json").unwrap();
        assert!(matches!(
            get_json::<Sample>(&store, "bad"),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("local.json");

        let store = JsonFileStore::open(&path).unwrap();
        set_json(
            &store,
            "sample",
            &Sample {
                name: "rent".to_string(),
                count: 3,
            },
        )
        .unwrap();
        store.set("pin", "4321").unwrap();
        drop(store);

        let reopened = JsonFileStore::open(&path).unwrap();
        let sample: Sample = get_json(&reopened, "sample").unwrap().unwrap();
        assert_eq!(sample.count, 3);
        assert_eq!(reopened.get("pin").unwrap().as_deref(), Some("4321"));

        reopened.remove("pin").unwrap();
        assert!(reopened.get("pin").unwrap().is_none());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_file_store_reports_corruption() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("local.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert!(matches!(store.get("x"), Err(StoreError::Corrupt(_))));
    }
}
