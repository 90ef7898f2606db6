//! In-memory persistent store.
//!
//! Process-local stand-in for the persistent backend, with an optional
//! byte quota that behaves like a browser storage origin limit.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use unite_core::{PersistentStore, StorageError, UniteResult};

/// In-memory store for tests and hosts without a disk.
///
/// Clones share the same underlying map, like two handles on one storage
/// origin.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<RwLock<BTreeMap<String, String>>>,
    /// Maximum total size of keys plus values, in bytes.
    quota_bytes: Option<usize>,
}

impl InMemoryStore {
    /// Create an unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects writes past `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: Arc::default(),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total bytes used by keys and values.
    pub fn used_bytes(&self) -> usize {
        self.entries
            .read()
            .map(|e| e.iter().map(|(k, v)| k.len() + v.len()).sum())
            .unwrap_or(0)
    }
}

impl PersistentStore for InMemoryStore {
    fn get(&self, key: &str) -> UniteResult<Option<String>> {
        let entries = self.entries.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> UniteResult<()> {
        let mut entries = self.entries.write().map_err(|_| StorageError::LockPoisoned)?;

        if let Some(quota) = self.quota_bytes {
            let used: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = key.len() + value.len();
            if used + needed > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    bytes: needed,
                }
                .into());
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> UniteResult<bool> {
        let mut entries = self.entries.write().map_err(|_| StorageError::LockPoisoned)?;
        Ok(entries.remove(key).is_some())
    }

    fn keys(&self) -> UniteResult<Vec<String>> {
        let entries = self.entries.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(entries.keys().cloned().collect())
    }

    fn keys_with_prefix(&self, prefix: &str) -> UniteResult<Vec<String>> {
        let entries = self.entries.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }
}
