//! The component result cache.
//!
//! Two tiers: a persistent store shared with the rest of the process, and an
//! in-memory session map answering "was this loaded during this session".
//! Reads only consult the persistent tier; the session map is never subject
//! to TTL.
//!
//! Nothing here returns an error. Every failure degrades to the operation's
//! safe default, is counted in [`CacheStats::suppressed_errors`], and is
//! reported to the configured [`CacheObserver`].

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use serde::{de::DeserializeOwned, Serialize};
use unite_core::{
    CacheObserver, CacheOperation, CachePolicy, ClientContext, Clock, EvictionReason,
    ExecutionContext, PersistentStore, StorageError, SystemClock, UniteError,
};

use crate::codec::{JsonCodec, PayloadCodec};
use crate::entry::StoredEntry;
use crate::namespace::NamespacedKey;
use crate::stats::{CacheCounters, CacheStats, TracingObserver};
use crate::sweep::{sweep_namespace, SweepReport};

/// Host capabilities injected into a cache instance.
#[derive(Clone)]
pub struct CacheDeps {
    pub context: Arc<dyn ExecutionContext>,
    pub clock: Arc<dyn Clock>,
    pub observer: Arc<dyn CacheObserver>,
}

impl Default for CacheDeps {
    fn default() -> Self {
        Self {
            context: Arc::new(ClientContext),
            clock: Arc::new(SystemClock),
            observer: Arc::new(TracingObserver),
        }
    }
}

impl CacheDeps {
    pub fn with_context(mut self, context: Arc<dyn ExecutionContext>) -> Self {
        self.context = context;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn CacheObserver>) -> Self {
        self.observer = observer;
        self
    }
}

impl std::fmt::Debug for CacheDeps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheDeps")
            .field("is_client", &self.context.is_client())
            .finish_non_exhaustive()
    }
}

/// Cache-aside store for component results.
///
/// Construct once and share by reference or `Arc`. The type is `Send + Sync`
/// whenever the payload, store and codec are.
///
/// # Example
///
/// ```ignore
/// use unite_cache::{ComponentCache, InMemoryStore};
/// use unite_core::CachePolicy;
///
/// let cache: ComponentCache<Card, _> = ComponentCache::new(InMemoryStore::new(), CachePolicy::default());
/// cache.write("card:42", Card { title: "Foo".into() });
/// assert!(cache.is_loaded_this_session("card:42"));
/// ```
pub struct ComponentCache<T, S, C = JsonCodec<T>> {
    store: S,
    codec: C,
    policy: CachePolicy,
    /// False when the policy failed validation; every operation is a no-op.
    enabled: bool,
    deps: CacheDeps,
    session: RwLock<HashMap<String, T>>,
    counters: CacheCounters,
    /// Set by the first operation that runs in a client context.
    startup_sweep: OnceLock<SweepReport>,
}

static SWEEP_NOT_RUN: SweepReport = SweepReport {
    scanned: 0,
    kept: 0,
    expired: 0,
    stale_version: 0,
    corrupt: 0,
    failures: 0,
};

impl<T, S> ComponentCache<T, S, JsonCodec<T>>
where
    T: Serialize + DeserializeOwned,
    S: PersistentStore,
{
    /// Create a cache with the default host capabilities (client context,
    /// system clock, tracing observer) and the JSON codec.
    pub fn new(store: S, policy: CachePolicy) -> Self {
        Self::with_deps(store, policy, CacheDeps::default())
    }

    /// Create a cache with explicit host capabilities and the JSON codec.
    pub fn with_deps(store: S, policy: CachePolicy, deps: CacheDeps) -> Self {
        Self::with_codec(store, policy, JsonCodec::new(), deps)
    }
}

impl<T, S, C> ComponentCache<T, S, C>
where
    S: PersistentStore,
    C: PayloadCodec<T>,
{
    /// Create a cache with a caller-supplied payload codec.
    ///
    /// In a client context this runs the startup sweep before returning.
    /// Otherwise the sweep runs on the first operation made once the context
    /// has become a client.
    pub fn with_codec(store: S, policy: CachePolicy, codec: C, deps: CacheDeps) -> Self {
        let mut cache = Self {
            store,
            codec,
            policy,
            enabled: true,
            deps,
            session: RwLock::new(HashMap::new()),
            counters: CacheCounters::default(),
            startup_sweep: OnceLock::new(),
        };

        if let Err(e) = cache.policy.validate() {
            cache.enabled = false;
            cache.suppress(CacheOperation::Init, None, &e.into());
            return cache;
        }

        // Sweeps immediately in a client context.
        cache.is_active();
        cache
    }

    /// Return the cached payload for `key`, or `None` when absent, stale,
    /// unreadable, or outside a client context.
    ///
    /// Stale and corrupt entries are deleted from the persistent store.
    pub fn read(&self, key: &str) -> Option<T> {
        if !self.is_active() {
            return None;
        }

        let payload = self.lookup(key);
        if payload.is_some() {
            self.counters.record_hit();
            tracing::debug!(key, "Component cache hit");
        } else {
            self.counters.record_miss();
            tracing::debug!(key, "Component cache miss");
        }
        payload
    }

    /// Store `payload` under `key` and mark it loaded for this session.
    ///
    /// Storage failures are swallowed; the session map is updated either way.
    pub fn write(&self, key: &str, payload: T) {
        if !self.is_active() {
            return;
        }
        let Some(nkey) = self.namespaced(CacheOperation::Write, key) else {
            return;
        };

        if self.persist(&nkey, &payload) {
            self.counters.record_write();
            tracing::debug!(key, "Component cache write");
        }

        match self.session.write() {
            Ok(mut session) => {
                session.insert(nkey.key().to_string(), payload);
            }
            Err(_) => self.suppress(
                CacheOperation::Write,
                Some(key),
                &StorageError::LockPoisoned.into(),
            ),
        }
    }

    /// Whether `key` was written during this session.
    pub fn is_loaded_this_session(&self, key: &str) -> bool {
        if !self.is_active() {
            return false;
        }
        self.session
            .read()
            .map(|session| session.contains_key(key))
            .unwrap_or(false)
    }

    /// Snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        let session_entries = self
            .session
            .read()
            .map(|session| session.len() as u64)
            .unwrap_or(0);
        self.counters.snapshot(session_entries)
    }

    /// Report of the startup sweep. Empty until the cache has been used in a
    /// client context.
    pub fn startup_sweep(&self) -> &SweepReport {
        self.startup_sweep.get().unwrap_or(&SWEEP_NOT_RUN)
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// False when the policy was rejected at construction.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether operations take effect. The first active call runs the
    /// startup sweep.
    fn is_active(&self) -> bool {
        if !self.enabled || !self.deps.context.is_client() {
            return false;
        }
        self.startup_sweep.get_or_init(|| self.run_startup_sweep());
        true
    }

    fn run_startup_sweep(&self) -> SweepReport {
        let report = sweep_namespace(
            &self.store,
            &self.policy,
            self.deps.clock.now_millis(),
            self.deps.observer.as_ref(),
        );
        self.counters.record_evictions(report.removed());
        self.counters.record_suppressed(report.failures);
        report
    }

    fn lookup(&self, key: &str) -> Option<T> {
        let nkey = self.namespaced(CacheOperation::Read, key)?;

        let raw = match self.store.get(&nkey.encode()) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                self.suppress(CacheOperation::Read, Some(key), &e);
                return None;
            }
        };

        let entry = match StoredEntry::decode(key, &raw) {
            Ok(entry) => entry,
            Err(e) => {
                self.suppress(CacheOperation::Read, Some(key), &e);
                self.evict(&nkey, EvictionReason::Corrupt);
                return None;
            }
        };

        let validity = entry.validity(&self.policy, self.deps.clock.now_millis());
        if let Some(reason) = validity.eviction_reason() {
            self.evict(&nkey, reason);
            return None;
        }

        match self.codec.from_value(entry.data) {
            Ok(payload) => Some(payload),
            Err(e) => {
                self.suppress(CacheOperation::Read, Some(key), &e);
                if e.is_corruption() {
                    self.evict(&nkey, EvictionReason::Corrupt);
                }
                None
            }
        }
    }

    fn persist(&self, nkey: &NamespacedKey, payload: &T) -> bool {
        let encoded = self.codec.to_value(payload).and_then(|data| {
            StoredEntry::new(data, &self.policy, self.deps.clock.now_millis()).encode()
        });
        let result = encoded.and_then(|raw| self.store.set(&nkey.encode(), &raw));

        match result {
            Ok(()) => true,
            Err(e) => {
                self.suppress(CacheOperation::Write, Some(nkey.key()), &e);
                false
            }
        }
    }

    fn namespaced(&self, operation: CacheOperation, key: &str) -> Option<NamespacedKey> {
        match NamespacedKey::new(&self.policy.namespace, key) {
            Ok(nkey) => Some(nkey),
            Err(e) => {
                self.suppress(operation, Some(key), &e);
                None
            }
        }
    }

    fn evict(&self, nkey: &NamespacedKey, reason: EvictionReason) {
        match self.store.remove(&nkey.encode()) {
            Ok(_) => {
                self.counters.record_evictions(1);
                self.deps.observer.on_evicted(nkey.key(), &reason);
            }
            Err(e) => self.suppress(CacheOperation::Read, Some(nkey.key()), &e),
        }
    }

    fn suppress(&self, operation: CacheOperation, key: Option<&str>, error: &UniteError) {
        self.counters.record_suppressed(1);
        self.deps.observer.on_suppressed(operation, key, error);
    }
}

impl<T, S, C> ComponentCache<T, S, C>
where
    T: Clone,
    S: PersistentStore,
    C: PayloadCodec<T>,
{
    /// Payload written under `key` during this session, without touching
    /// the persistent store.
    pub fn peek_session(&self, key: &str) -> Option<T> {
        if !self.is_active() {
            return None;
        }
        self.session
            .read()
            .ok()
            .and_then(|session| session.get(key).cloned())
    }
}

impl<T, S, C> std::fmt::Debug for ComponentCache<T, S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentCache")
            .field("policy", &self.policy)
            .field("enabled", &self.enabled)
            .field("deps", &self.deps)
            .field("startup_sweep", &self.startup_sweep.get())
            .finish_non_exhaustive()
    }
}
