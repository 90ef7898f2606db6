//! Unite Test Utilities
//!
//! Shared test infrastructure for the component cache:
//! - Fakes for the host capabilities (clock, execution context, observer)
//! - A fault-injecting persistent store wrapper
//! - Proptest generators for keys and payloads
//! - Fixtures and assertions

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

// Re-export core types for convenience
pub use unite_core::{
    CacheObserver, CacheOperation, CachePolicy, Clock, DurationMs, EvictionReason,
    ExecutionContext, PersistentStore, StorageError, TimestampMs, UniteError, UniteResult,
};

// ============================================================================
// FAKE HOST CAPABILITIES
// ============================================================================

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now: TimestampMs) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    pub fn set(&self, now: TimestampMs) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, by: DurationMs) {
        self.now.fetch_add(by, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> TimestampMs {
        self.now.load(Ordering::SeqCst)
    }
}

/// Execution context that can flip between client and non-client.
#[derive(Debug)]
pub struct SwitchableContext {
    client: AtomicBool,
}

impl SwitchableContext {
    pub fn new(client: bool) -> Self {
        Self {
            client: AtomicBool::new(client),
        }
    }

    pub fn set_client(&self, client: bool) {
        self.client.store(client, Ordering::SeqCst);
    }
}

impl ExecutionContext for SwitchableContext {
    fn is_client(&self) -> bool {
        self.client.load(Ordering::SeqCst)
    }
}

/// A suppressed failure captured by [`RecordingObserver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuppressedFailure {
    pub operation: CacheOperation,
    pub key: Option<String>,
    pub error: UniteError,
}

/// Observer that records everything it is told.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    suppressed: Mutex<Vec<SuppressedFailure>>,
    evictions: Mutex<Vec<(String, EvictionReason)>>,
}

impl RecordingObserver {
    pub fn suppressed(&self) -> Vec<SuppressedFailure> {
        self.suppressed
            .lock()
            .expect("observer lock poisoned")
            .clone()
    }

    pub fn suppressed_count(&self) -> usize {
        self.suppressed.lock().expect("observer lock poisoned").len()
    }

    pub fn evictions(&self) -> Vec<(String, EvictionReason)> {
        self.evictions
            .lock()
            .expect("observer lock poisoned")
            .clone()
    }
}

impl CacheObserver for RecordingObserver {
    fn on_suppressed(&self, operation: CacheOperation, key: Option<&str>, error: &UniteError) {
        self.suppressed
            .lock()
            .expect("observer lock poisoned")
            .push(SuppressedFailure {
                operation,
                key: key.map(str::to_string),
                error: error.clone(),
            });
    }

    fn on_evicted(&self, key: &str, reason: &EvictionReason) {
        self.evictions
            .lock()
            .expect("observer lock poisoned")
            .push((key.to_string(), reason.clone()));
    }
}

// ============================================================================
// FAULT INJECTION
// ============================================================================

/// Wraps a store and fails selected operations on demand.
///
/// Failed `set` calls report [`StorageError::QuotaExceeded`]; every other
/// failure reports [`StorageError::Unavailable`].
#[derive(Debug)]
pub struct FaultyStore<S> {
    inner: S,
    fail_gets: AtomicBool,
    fail_sets: AtomicBool,
    fail_removes: AtomicBool,
    fail_keys: AtomicBool,
}

impl<S: PersistentStore> FaultyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_gets: AtomicBool::new(false),
            fail_sets: AtomicBool::new(false),
            fail_removes: AtomicBool::new(false),
            fail_keys: AtomicBool::new(false),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    pub fn fail_sets(&self, fail: bool) {
        self.fail_sets.store(fail, Ordering::SeqCst);
    }

    pub fn fail_removes(&self, fail: bool) {
        self.fail_removes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_keys(&self, fail: bool) {
        self.fail_keys.store(fail, Ordering::SeqCst);
    }

    /// Fail every operation.
    pub fn fail_all(&self, fail: bool) {
        self.fail_gets(fail);
        self.fail_sets(fail);
        self.fail_removes(fail);
        self.fail_keys(fail);
    }

    fn unavailable(flag: &AtomicBool) -> UniteResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable {
                reason: "injected fault".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl<S: PersistentStore> PersistentStore for FaultyStore<S> {
    fn get(&self, key: &str) -> UniteResult<Option<String>> {
        Self::unavailable(&self.fail_gets)?;
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> UniteResult<()> {
        if self.fail_sets.load(Ordering::SeqCst) {
            return Err(StorageError::QuotaExceeded {
                key: key.to_string(),
                bytes: key.len() + value.len(),
            }
            .into());
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> UniteResult<bool> {
        Self::unavailable(&self.fail_removes)?;
        self.inner.remove(key)
    }

    fn keys(&self) -> UniteResult<Vec<String>> {
        Self::unavailable(&self.fail_keys)?;
        self.inner.keys()
    }

    fn keys_with_prefix(&self, prefix: &str) -> UniteResult<Vec<String>> {
        Self::unavailable(&self.fail_keys)?;
        self.inner.keys_with_prefix(prefix)
    }
}

// ============================================================================
// FIXTURE PAYLOADS
// ============================================================================

/// Representative component payload: a rendered showcase card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentCard {
    pub title: String,
    pub slug: String,
    pub tags: Vec<String>,
    pub views: u32,
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for cache keys and payloads.

    use super::*;
    use proptest::prelude::*;
    use serde_json::Value;

    /// Generate a non-empty caller key like `card:42` or `docs/button`.
    pub fn arb_cache_key() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9:/_-]{0,31}"
    }

    /// Generate a ComponentCard.
    pub fn arb_component_card() -> impl Strategy<Value = ComponentCard> {
        (
            "[A-Za-z ]{1,24}",
            "[a-z-]{1,24}",
            prop::collection::vec("[a-z]{1,8}", 0..4),
            any::<u32>(),
        )
            .prop_map(|(title, slug, tags, views)| ComponentCard {
                title,
                slug,
                tags,
                views,
            })
    }

    /// Generate an arbitrary JSON value, nested up to a few levels.
    pub fn arb_json_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            ".{0,16}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 32, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    /// Generate a string that is never valid JSON.
    pub fn arb_garbage() -> impl Strategy<Value = String> {
        "[{<][^}>]{0,32}"
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures for common scenarios.

    use super::*;
    use std::time::Duration;

    /// Fixed epoch used by the suites: 2024-06-10T06:13:20Z.
    pub const EPOCH_MS: TimestampMs = 1_718_000_000_000;

    /// The `card:42` showcase payload.
    pub fn foo_card() -> ComponentCard {
        ComponentCard {
            title: "Foo".to_string(),
            slug: "foo".to_string(),
            tags: vec!["card".to_string()],
            views: 0,
        }
    }

    /// Default policy with a TTL short enough to step over in tests.
    pub fn short_ttl_policy(ttl_ms: u64) -> CachePolicy {
        CachePolicy::default().with_ttl(Duration::from_millis(ttl_ms))
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for cache-specific expectations.

    use super::*;

    /// Assert that every recorded failure is a storage error.
    #[track_caller]
    pub fn assert_only_storage_failures(observer: &RecordingObserver) {
        for failure in observer.suppressed() {
            match failure.error {
                UniteError::Storage(_) => {}
                other => panic!("Expected storage failure, got: {:?}", other),
            }
        }
    }

    /// Assert that `store` holds no key starting with `prefix`.
    #[track_caller]
    pub fn assert_namespace_empty<S: PersistentStore>(store: &S, prefix: &str) {
        let keys = store
            .keys_with_prefix(prefix)
            .expect("key scan should succeed");
        assert!(keys.is_empty(), "Expected no keys under {prefix}, got: {keys:?}");
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;
    use std::sync::RwLock;

    #[derive(Default)]
    struct MapStore(RwLock<BTreeMap<String, String>>);

    impl PersistentStore for MapStore {
        fn get(&self, key: &str) -> UniteResult<Option<String>> {
            Ok(self.0.read().expect("lock").get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> UniteResult<()> {
            self.0
                .write()
                .expect("lock")
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn remove(&self, key: &str) -> UniteResult<bool> {
            Ok(self.0.write().expect("lock").remove(key).is_some())
        }

        fn keys(&self) -> UniteResult<Vec<String>> {
            Ok(self.0.read().expect("lock").keys().cloned().collect())
        }
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(100);
        assert_eq!(clock.now_millis(), 100);
        clock.advance(50);
        assert_eq!(clock.now_millis(), 150);
        clock.set(7);
        assert_eq!(clock.now_millis(), 7);
    }

    #[test]
    fn test_switchable_context() {
        let ctx = SwitchableContext::new(true);
        assert!(ctx.is_client());
        ctx.set_client(false);
        assert!(!ctx.is_client());
    }

    #[test]
    fn test_faulty_store_passthrough_and_faults() {
        let store = FaultyStore::new(MapStore::default());
        store.set("k", "v").expect("set should succeed");
        assert_eq!(store.get("k").expect("get").as_deref(), Some("v"));

        store.fail_sets(true);
        assert!(matches!(
            store.set("k", "w"),
            Err(UniteError::Storage(StorageError::QuotaExceeded { .. }))
        ));

        store.fail_all(true);
        assert!(store.get("k").is_err());
        assert!(store.remove("k").is_err());
        assert!(store.keys_with_prefix("").is_err());

        store.fail_all(false);
        assert_eq!(store.inner().get("k").expect("get").as_deref(), Some("v"));
    }

    #[test]
    fn test_recording_observer() {
        let observer = RecordingObserver::default();
        observer.on_suppressed(
            CacheOperation::Write,
            Some("card:1"),
            &StorageError::LockPoisoned.into(),
        );
        observer.on_evicted("card:2", &EvictionReason::Expired);

        let suppressed = observer.suppressed();
        assert_eq!(suppressed.len(), 1);
        assert_eq!(suppressed[0].operation, CacheOperation::Write);
        assert_eq!(suppressed[0].key.as_deref(), Some("card:1"));
        assert_eq!(
            observer.evictions(),
            vec![("card:2".to_string(), EvictionReason::Expired)]
        );
        assertions::assert_only_storage_failures(&observer);
    }

    proptest! {
        #[test]
        fn prop_cache_keys_are_non_empty(key in generators::arb_cache_key()) {
            prop_assert!(!key.is_empty());
        }

        #[test]
        fn prop_garbage_never_parses(raw in generators::arb_garbage()) {
            prop_assert!(serde_json::from_str::<serde_json::Value>(&raw).is_err());
        }
    }
}
