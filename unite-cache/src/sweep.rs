//! Namespace maintenance: the startup sweep, inspection, and purge.
//!
//! All three only ever enumerate keys under the policy namespace. The sweep
//! is best-effort: a failure on one entry is reported and the scan moves on.
//!
//! The bare namespace key (empty caller key) is reserved but can never be
//! written through the cache, so maintenance treats it as a corrupt entry.

use serde::Serialize;
use unite_core::{
    CacheObserver, CacheOperation, CachePolicy, DurationMs, EvictionReason, PersistentStore,
    TimestampMs, UniteError,
};

use crate::entry::{StoredEntry, Validity};

/// Outcome of a sweep over the cache namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Namespaced keys examined.
    pub scanned: u64,
    /// Entries left in place.
    pub kept: u64,
    /// Entries removed as expired.
    pub expired: u64,
    /// Entries removed for a schema version mismatch.
    pub stale_version: u64,
    /// Entries removed because they failed to parse.
    pub corrupt: u64,
    /// Storage failures while scanning or removing.
    pub failures: u64,
}

impl SweepReport {
    /// Total entries removed.
    pub fn removed(&self) -> u64 {
        self.expired + self.stale_version + self.corrupt
    }

    fn record_removal(&mut self, reason: &EvictionReason) {
        match reason {
            EvictionReason::Expired => self.expired += 1,
            EvictionReason::VersionMismatch => self.stale_version += 1,
            EvictionReason::Corrupt => self.corrupt += 1,
        }
    }
}

/// Remove every expired, stale-version or unparseable entry in the namespace.
pub fn sweep_namespace<S>(
    store: &S,
    policy: &CachePolicy,
    now: TimestampMs,
    observer: &dyn CacheObserver,
) -> SweepReport
where
    S: PersistentStore + ?Sized,
{
    let mut report = SweepReport::default();

    let raw_keys = match store.keys_with_prefix(&policy.namespace) {
        Ok(keys) => keys,
        Err(e) => {
            report.failures += 1;
            observer.on_suppressed(CacheOperation::Sweep, None, &e);
            return report;
        }
    };

    for raw in &raw_keys {
        let Some(key) = caller_key(policy, raw) else {
            continue;
        };
        report.scanned += 1;

        let reason = match store.get(raw) {
            Ok(Some(_)) if key.is_empty() => Some(EvictionReason::Corrupt),
            Ok(Some(value)) => match StoredEntry::decode(key, &value) {
                Ok(entry) => entry.validity(policy, now).eviction_reason(),
                Err(_) => Some(EvictionReason::Corrupt),
            },
            // Removed by another handle since enumeration.
            Ok(None) => continue,
            Err(e) => {
                report.failures += 1;
                observer.on_suppressed(CacheOperation::Sweep, Some(key), &e);
                continue;
            }
        };

        let Some(reason) = reason else {
            report.kept += 1;
            continue;
        };

        match store.remove(raw) {
            Ok(_) => {
                report.record_removal(&reason);
                observer.on_evicted(key, &reason);
            }
            Err(e) => {
                report.failures += 1;
                observer.on_suppressed(CacheOperation::Sweep, Some(key), &e);
            }
        }
    }

    tracing::info!(
        namespace = %policy.namespace,
        scanned = report.scanned,
        removed = report.removed(),
        failures = report.failures,
        "Component cache sweep finished"
    );

    report
}

/// Caller key for a raw persistent key under the namespace. Empty for the
/// bare namespace key.
fn caller_key<'a>(policy: &CachePolicy, raw: &'a str) -> Option<&'a str> {
    raw.strip_prefix(policy.namespace.as_str())
}

/// State of one namespaced entry, as seen by [`inspect_namespace`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryStatus {
    Valid,
    Expired,
    VersionMismatch,
    Corrupt,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Valid => "valid",
            EntryStatus::Expired => "expired",
            EntryStatus::VersionMismatch => "version-mismatch",
            EntryStatus::Corrupt => "corrupt",
        }
    }
}

/// Read-only view of a namespaced entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntrySummary {
    /// Caller key, without the namespace prefix.
    pub key: String,
    pub version: Option<String>,
    pub written_at: Option<TimestampMs>,
    pub age_ms: Option<DurationMs>,
    /// Size of the stored value in bytes.
    pub size_bytes: usize,
    pub status: EntryStatus,
}

/// List every entry in the namespace without modifying the store.
pub fn inspect_namespace<S>(
    store: &S,
    policy: &CachePolicy,
    now: TimestampMs,
) -> Result<Vec<EntrySummary>, UniteError>
where
    S: PersistentStore + ?Sized,
{
    let mut summaries = Vec::new();

    for raw in store.keys_with_prefix(&policy.namespace)? {
        let Some(key) = caller_key(policy, &raw) else {
            continue;
        };
        let Some(value) = store.get(&raw)? else {
            continue;
        };

        let decoded = if key.is_empty() {
            None
        } else {
            StoredEntry::decode(key, &value).ok()
        };
        let summary = match decoded {
            Some(entry) => {
                let status = match entry.validity(policy, now) {
                    Validity::Valid => EntryStatus::Valid,
                    Validity::Expired { .. } => EntryStatus::Expired,
                    Validity::VersionMismatch { .. } => EntryStatus::VersionMismatch,
                };
                EntrySummary {
                    key: key.to_string(),
                    age_ms: Some(entry.age_ms(now)),
                    version: Some(entry.version),
                    written_at: Some(entry.timestamp),
                    size_bytes: value.len(),
                    status,
                }
            }
            None => EntrySummary {
                key: key.to_string(),
                version: None,
                written_at: None,
                age_ms: None,
                size_bytes: value.len(),
                status: EntryStatus::Corrupt,
            },
        };
        summaries.push(summary);
    }

    Ok(summaries)
}

/// Remove every key in the namespace, valid or not. Returns the count removed.
pub fn purge_namespace<S>(store: &S, policy: &CachePolicy) -> Result<u64, UniteError>
where
    S: PersistentStore + ?Sized,
{
    let mut removed = 0u64;
    for raw in store.keys_with_prefix(&policy.namespace)? {
        if caller_key(policy, &raw).is_none() {
            continue;
        }
        if store.remove(&raw)? {
            removed += 1;
        }
    }
    Ok(removed)
}
