//! Unite Core - shared types for the component cache
//!
//! Error taxonomy, cache policy, host capabilities (execution context,
//! clock, persistent store, observer) and settings loading. No caching
//! logic lives here; see `unite-cache`.

pub mod config;
pub mod context;
pub mod error;
pub mod observer;
pub mod policy;
pub mod store;

pub use config::{CacheSettings, LogFormat, LogSettings, CONFIG_ENV_VAR, DEFAULT_LOG_FILTER};
pub use context::{ClientContext, Clock, ExecutionContext, ServerContext, SystemClock};
pub use error::{CodecError, ConfigError, StorageError, UniteError, UniteResult, ValidationError};
pub use observer::{CacheObserver, CacheOperation, EvictionReason};
pub use policy::{CachePolicy, DEFAULT_NAMESPACE, DEFAULT_SCHEMA_VERSION, DEFAULT_TTL};
pub use store::PersistentStore;

/// Milliseconds since the Unix epoch.
pub type TimestampMs = i64;

/// Duration in milliseconds for TTL and age values.
pub type DurationMs = i64;
