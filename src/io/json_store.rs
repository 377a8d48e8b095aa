//! JSON-file backed `AtomicStore`
//!
//! Each key lives in `<dir>/<key>.json`. Values are cached in a `MemoryStore`
//! and loaded from disk on first access. A write commits to the cache and then
//! rewrites the file (temp file + rename) while still holding the key's lock,
//! so the file always reflects the latest commit that reached disk.

use crate::core::atomic_store::MemoryStore;
use crate::core::traits::{AtomicStore, Committed};
use crate::types::LedgerError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Durable store rooted at a directory
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    cache: MemoryStore,
}

impl JsonFileStore {
    /// Open (creating if needed) the store directory
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| LedgerError::storage(&dir.display().to_string(), e.to_string()))?;
        debug!(dir = %dir.display(), "Opened JSON store");
        Ok(JsonFileStore {
            dir,
            cache: MemoryStore::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, LedgerError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(LedgerError::validation(
                "key",
                format!("'{}' is not a valid store key", key),
            ));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    /// Populate the cache from disk the first time `key` is touched
    fn load(&self, key: &str) -> Result<PathBuf, LedgerError> {
        let path = self.path_for(key)?;
        if self.cache.contains_key(key) {
            return Ok(path);
        }

        match fs::read_to_string(&path) {
            Ok(text) => {
                let value: Value =
                    serde_json::from_str(&text).map_err(|e| LedgerError::from(e).with_key(key))?;
                self.cache.insert_if_absent(key, value);
                debug!(key = %key, path = %path.display(), "Loaded value from disk");
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(LedgerError::from(e).with_key(key)),
        }
        Ok(path)
    }
}

impl AtomicStore for JsonFileStore {
    fn read<T>(&self, key: &str) -> Result<T, LedgerError>
    where
        T: DeserializeOwned + Default,
    {
        self.load(key)?;
        self.cache.read(key)
    }

    fn write<T, R, F>(&self, key: &str, updater: F) -> Result<Committed<R>, LedgerError>
    where
        T: Serialize + DeserializeOwned + Default,
        F: FnOnce(&mut T) -> Result<R, LedgerError>,
    {
        let path = self.load(key)?;
        self.cache
            .write_with(key, updater, |value| persist(&path, value).map_err(|e| e.with_key(key)))
    }
}

fn persist(path: &Path, value: &Value) -> Result<(), LedgerError> {
    let text = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, text)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn push(store: &JsonFileStore, n: u32) -> Committed<usize> {
        store
            .write("numbers", |numbers: &mut Vec<u32>| {
                numbers.push(n);
                Ok(numbers.len())
            })
            .unwrap()
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = JsonFileStore::open(dir.path()).unwrap();
            assert!(push(&store, 1).persist_error.is_none());
            push(&store, 2);
        }

        let reopened = JsonFileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.read::<Vec<u32>>("numbers").unwrap(), vec![1, 2]);
        assert!(dir.path().join("numbers.json").exists());
        assert!(!dir.path().join("numbers.json.tmp").exists());
    }

    #[test]
    fn test_missing_file_reads_default() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        assert!(store.read::<Vec<u32>>("numbers").unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_storage_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("numbers.json"), "{ not json").unwrap();

        let store = JsonFileStore::open(dir.path()).unwrap();
        let result = store.read::<Vec<u32>>("numbers");
        assert!(matches!(result, Err(LedgerError::Storage { key, .. }) if key == "numbers"));
    }

    #[test]
    fn test_unsafe_key_rejected() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.read::<Vec<u32>>("../escape"),
            Err(LedgerError::Validation { .. })
        ));
    }

    #[test]
    fn test_disk_failure_keeps_memory_commit() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("data");
        let store = JsonFileStore::open(&data_dir).unwrap();
        push(&store, 1);

        fs::remove_dir_all(&data_dir).unwrap();
        let committed = push(&store, 2);

        assert!(matches!(
            committed.persist_error,
            Some(LedgerError::Storage { ref key, .. }) if key == "numbers"
        ));
        assert_eq!(store.read::<Vec<u32>>("numbers").unwrap(), vec![1, 2]);
    }
}
