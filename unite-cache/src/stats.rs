//! Cache statistics and the observability hook for suppressed failures.
//!
//! The cache never surfaces errors to its callers. Every failure it swallows
//! is routed to a [`CacheObserver`] and counted, so operators can detect a
//! systemic storage problem without the cache's semantics changing.

use std::sync::atomic::{AtomicU64, Ordering};

use unite_core::{CacheObserver, CacheOperation, EvictionReason, UniteError};

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads that returned a payload.
    pub hits: u64,
    /// Reads that returned nothing.
    pub misses: u64,
    /// Successful persistent writes.
    pub writes: u64,
    /// Persistent entries removed as expired, stale-version or corrupt.
    pub evictions: u64,
    /// Storage or codec failures swallowed by the cache.
    pub suppressed_errors: u64,
    /// Keys in the session map.
    pub session_entries: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Default observer: logs through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl CacheObserver for TracingObserver {
    fn on_suppressed(&self, operation: CacheOperation, key: Option<&str>, error: &UniteError) {
        tracing::warn!(
            operation = operation.as_str(),
            key = key.unwrap_or(""),
            error = %error,
            "Component cache failure suppressed"
        );
    }

    fn on_evicted(&self, key: &str, reason: &EvictionReason) {
        tracing::debug!(key, reason = reason.as_str(), "Component cache entry evicted");
    }
}

/// Lock-free counters behind [`CacheStats`].
#[derive(Debug, Default)]
pub(crate) struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    evictions: AtomicU64,
    suppressed_errors: AtomicU64,
}

impl CacheCounters {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_evictions(&self, count: u64) {
        self.evictions.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_suppressed(&self, count: u64) {
        self.suppressed_errors.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, session_entries: u64) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            suppressed_errors: self.suppressed_errors.load(Ordering::Relaxed),
            session_entries,
        }
    }
}
