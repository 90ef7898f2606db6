//! Observability hook for failures the cache swallows.

use crate::UniteError;

/// Operation during which a failure was suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOperation {
    Init,
    Read,
    Write,
    Sweep,
}

impl CacheOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheOperation::Init => "init",
            CacheOperation::Read => "read",
            CacheOperation::Write => "write",
            CacheOperation::Sweep => "sweep",
        }
    }
}

/// Why a persistent entry was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvictionReason {
    Expired,
    VersionMismatch,
    Corrupt,
}

impl EvictionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvictionReason::Expired => "expired",
            EvictionReason::VersionMismatch => "version_mismatch",
            EvictionReason::Corrupt => "corrupt",
        }
    }
}

/// Receives every failure the cache suppresses and every entry it evicts.
pub trait CacheObserver: Send + Sync {
    /// A failure was swallowed. `key` is the caller key when one applies.
    fn on_suppressed(&self, operation: CacheOperation, key: Option<&str>, error: &UniteError);

    /// A persistent entry was removed.
    fn on_evicted(&self, _key: &str, _reason: &EvictionReason) {}
}
