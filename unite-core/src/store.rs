//! Persistent key/value store abstraction.
//!
//! The store is shared by the whole client process, not only the cache.
//! Implementations must be safe to call from any thread and atomic at the
//! single-key granularity. They make no ownership assumptions about keys;
//! namespacing is the caller's job.

use crate::UniteResult;

/// Synchronous string-to-string store with key enumeration.
pub trait PersistentStore: Send + Sync {
    /// Get the value stored under `key`.
    fn get(&self, key: &str) -> UniteResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> UniteResult<()>;

    /// Remove `key`. Returns true if a value was present.
    fn remove(&self, key: &str) -> UniteResult<bool>;

    /// Enumerate every key in the store.
    fn keys(&self) -> UniteResult<Vec<String>>;

    /// Enumerate keys starting with `prefix`.
    ///
    /// Backends with ordered keys should override this with a range scan.
    fn keys_with_prefix(&self, prefix: &str) -> UniteResult<Vec<String>> {
        Ok(self
            .keys()?
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .collect())
    }
}

impl<S: PersistentStore + ?Sized> PersistentStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> UniteResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> UniteResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> UniteResult<bool> {
        (**self).remove(key)
    }

    fn keys(&self) -> UniteResult<Vec<String>> {
        (**self).keys()
    }

    fn keys_with_prefix(&self, prefix: &str) -> UniteResult<Vec<String>> {
        (**self).keys_with_prefix(prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct VecStore {
        entries: Mutex<BTreeMap<String, String>>,
    }

    impl PersistentStore for VecStore {
        fn get(&self, key: &str) -> UniteResult<Option<String>> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> UniteResult<()> {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn remove(&self, key: &str) -> UniteResult<bool> {
            Ok(self.entries.lock().unwrap().remove(key).is_some())
        }

        fn keys(&self) -> UniteResult<Vec<String>> {
            Ok(self.entries.lock().unwrap().keys().cloned().collect())
        }
    }

    #[test]
    fn test_default_keys_with_prefix_filters() {
        let store = VecStore::default();
        store.set("ns:a", "1").unwrap();
        store.set("ns:b", "2").unwrap();
        store.set("theme", "dark").unwrap();

        let keys = store.keys_with_prefix("ns:").unwrap();
        assert_eq!(keys, vec!["ns:a".to_string(), "ns:b".to_string()]);
    }

    #[test]
    fn test_arc_store_delegates() {
        let store = Arc::new(VecStore::default());
        let shared: Arc<VecStore> = Arc::clone(&store);
        shared.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
        assert!(shared.remove("k").unwrap());
        assert!(!shared.remove("k").unwrap());
    }
}
