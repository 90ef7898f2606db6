//! Unite Cache - two-tier component result cache
//!
//! Cache-aside store for rendered/loaded component results:
//!
//! - A persistent tier behind [`PersistentStore`](unite_core::PersistentStore),
//!   namespaced under a reserved key prefix, with TTL and schema-version
//!   invalidation (lazy on read, eager at startup)
//! - An in-memory session map answering "loaded during this session"
//!
//! The cache only operates in a client execution context and never surfaces
//! an error to its caller.

pub mod codec;
pub mod component_cache;
pub mod entry;
pub mod namespace;
pub mod stats;
pub mod store;
pub mod sweep;

pub use codec::{FnCodec, JsonCodec, PayloadCodec};
pub use component_cache::{CacheDeps, ComponentCache};
pub use entry::{StoredEntry, Validity};
pub use namespace::NamespacedKey;
pub use stats::{CacheStats, TracingObserver};
pub use store::{InMemoryStore, LmdbStore, LmdbStoreError};
pub use sweep::{
    inspect_namespace, purge_namespace, sweep_namespace, EntryStatus, EntrySummary, SweepReport,
};

// Re-export the capability traits callers need to build a cache.
pub use unite_core::{
    CacheObserver, CacheOperation, CachePolicy, ClientContext, Clock, EvictionReason,
    ExecutionContext, PersistentStore, ServerContext, SystemClock,
};
