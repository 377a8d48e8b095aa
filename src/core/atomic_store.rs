//! In-memory atomic key-value store
//!
//! `MemoryStore` keeps one JSON value per key in a `DashMap`. A write holds the
//! key's entry lock for the whole read-modify-write, so concurrent writers on
//! the same key are serialized and every updater sees the latest committed
//! value. Writers on different keys do not block each other.
//!
//! The updater works on a freshly decoded copy; the copy replaces the stored
//! value only when the updater succeeds, which makes a failed updater a no-op.

use crate::core::traits::{AtomicStore, Committed};
use crate::types::LedgerError;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Thread-safe in-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Seed `key` with `value` unless another writer got there first
    pub(crate) fn insert_if_absent(&self, key: &str, value: Value) {
        self.entries.entry(key.to_string()).or_insert(value);
    }

    /// Read-modify-write with a persistence hook
    ///
    /// `persist` runs under the entry lock with the new value, so the medium
    /// sees commits in the same order as memory does. Its failure does not
    /// undo the in-memory commit.
    pub(crate) fn write_with<T, R, F, P>(
        &self,
        key: &str,
        updater: F,
        persist: P,
    ) -> Result<Committed<R>, LedgerError>
    where
        T: Serialize + DeserializeOwned + Default,
        F: FnOnce(&mut T) -> Result<R, LedgerError>,
        P: FnOnce(&Value) -> Result<(), LedgerError>,
    {
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert(Value::Null);

        let mut current: T = decode(key, entry.value())?;
        let value = updater(&mut current)?;
        let next = serde_json::to_value(&current).map_err(|e| LedgerError::from(e).with_key(key))?;

        let persist_error = persist(&next).err();
        *entry.value_mut() = next;

        Ok(Committed {
            value,
            persist_error,
        })
    }
}

impl AtomicStore for MemoryStore {
    fn read<T>(&self, key: &str) -> Result<T, LedgerError>
    where
        T: DeserializeOwned + Default,
    {
        // Clone out so the shard lock is not held while decoding
        let value = self.entries.get(key).map(|entry| entry.value().clone());
        match value {
            Some(value) => decode(key, &value),
            None => Ok(T::default()),
        }
    }

    fn write<T, R, F>(&self, key: &str, updater: F) -> Result<Committed<R>, LedgerError>
    where
        T: Serialize + DeserializeOwned + Default,
        F: FnOnce(&mut T) -> Result<R, LedgerError>,
    {
        self.write_with(key, updater, |_| Ok(()))
    }
}

/// Decode a stored value; `null` stands for "never written"
pub(crate) fn decode<T>(key: &str, value: &Value) -> Result<T, LedgerError>
where
    T: DeserializeOwned + Default,
{
    if value.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(value.clone()).map_err(|e| LedgerError::from(e).with_key(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_read_missing_key_returns_default() {
        let store = MemoryStore::new();
        let value: Vec<u32> = store.read("missing").unwrap();
        assert!(value.is_empty());
        assert!(!store.contains_key("missing"));
    }

    #[test]
    fn test_write_then_read() {
        let store = MemoryStore::new();

        let committed = store
            .write("numbers", |numbers: &mut Vec<u32>| {
                numbers.push(7);
                Ok(numbers.len())
            })
            .unwrap();

        assert_eq!(committed.value, 1);
        assert!(committed.persist_error.is_none());
        assert_eq!(store.read::<Vec<u32>>("numbers").unwrap(), vec![7]);
    }

    #[test]
    fn test_failed_updater_commits_nothing() {
        let store = MemoryStore::new();
        store
            .write("numbers", |numbers: &mut Vec<u32>| {
                numbers.push(1);
                Ok(())
            })
            .unwrap();

        let result = store.write("numbers", |numbers: &mut Vec<u32>| {
            numbers.push(2);
            Err::<(), _>(LedgerError::validation("numbers", "rejected"))
        });

        assert!(matches!(result, Err(LedgerError::Validation { .. })));
        assert_eq!(store.read::<Vec<u32>>("numbers").unwrap(), vec![1]);
    }

    #[test]
    fn test_sequential_updaters_see_latest_value() {
        let store = MemoryStore::new();
        for _ in 0..100 {
            store
                .write("counter", |n: &mut u64| {
                    *n += 1;
                    Ok(())
                })
                .unwrap();
        }
        assert_eq!(store.read::<u64>("counter").unwrap(), 100);
    }

    #[test]
    fn test_concurrent_writers_lose_no_update() {
        let store = Arc::new(MemoryStore::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..250 {
                        store
                            .write("counter", |n: &mut u64| {
                                *n += 1;
                                Ok(())
                            })
                            .unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.read::<u64>("counter").unwrap(), 2_000);
    }

    #[test]
    fn test_persist_failure_keeps_memory_commit() {
        let store = MemoryStore::new();

        let committed = store
            .write_with(
                "counter",
                |n: &mut u64| {
                    *n = 42;
                    Ok(())
                },
                |_| Err(LedgerError::storage("counter", "quota exceeded")),
            )
            .unwrap();

        assert_eq!(
            committed.persist_error,
            Some(LedgerError::storage("counter", "quota exceeded"))
        );
        assert_eq!(store.read::<u64>("counter").unwrap(), 42);
    }

    #[test]
    fn test_undecodable_value_is_a_storage_error() {
        let store = MemoryStore::new();
        store.insert_if_absent("numbers", Value::String("not a list".to_string()));

        let result = store.read::<Vec<u32>>("numbers");
        assert!(matches!(result, Err(LedgerError::Storage { key, .. }) if key == "numbers"));
    }
}
