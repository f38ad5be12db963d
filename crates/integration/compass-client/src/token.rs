//! Client-side key-value store holding the bearer token.
//!
//! The file store re-reads its file on every lookup so a token written by
//! another process (a `login` in a second shell) is picked up immediately.

use crate::Result;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use tracing::warn;

/// Key-value storage for client credentials
pub trait TokenStore: Send + Sync {
    /// Value under `key`; empty values read as absent
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with one entry
    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        if let Ok(mut values) = store.values.write() {
            values.insert(key.to_string(), value.to_string());
        }
        store
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.read().ok()?;
        values.get(key).filter(|v| !v.is_empty()).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if let Ok(mut values) = self.values.write() {
            values.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        if let Ok(mut values) = self.values.write() {
            values.remove(key);
        }
        Ok(())
    }
}

/// JSON file store (`{"token": "..."}`)
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(values)?;

        // Write to temp file first, then rename (atomic)
        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, &content)?;
        std::fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut values = self.read_all()?;
        apply(&mut values);
        self.write_all(&values)
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.read_all() {
            Ok(values) => values.get(key).filter(|v| !v.is_empty()).cloned(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unreadable token store");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|values| {
            values.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.get("token"), None);

        store.set("token", "abc").unwrap();
        assert_eq!(store.get("token").as_deref(), Some("abc"));

        store.set("token", "").unwrap();
        assert_eq!(store.get("token"), None);

        store.set("token", "xyz").unwrap();
        store.remove("token").unwrap();
        assert_eq!(store.get("token"), None);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let store = FileTokenStore::at_path(&path);
        assert_eq!(store.get("token"), None);
        store.set("token", "abc").unwrap();
        store.set("theme", "dark").unwrap();

        let reopened = FileTokenStore::at_path(&path);
        assert_eq!(reopened.get("token").as_deref(), Some("abc"));
        assert_eq!(reopened.get("theme").as_deref(), Some("dark"));

        reopened.remove("token").unwrap();
        assert_eq!(store.get("token"), None);
        assert_eq!(store.get("theme").as_deref(), Some("dark"));
    }

    #[test]
    fn test_file_store_corrupt_file_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileTokenStore::at_path(&path);
        assert_eq!(store.get("token"), None);
        assert!(store.set("token", "abc").is_err());
    }
}
