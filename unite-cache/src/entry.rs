//! Persistent entry wire format and validity rules.
//!
//! Entries are stored as a JSON object:
//!
//! ```json
//! {"data": {"title": "Foo"}, "version": "1.0.0", "timestamp": 1718000000000}
//! ```
//!
//! `version` and `timestamp` round-trip exactly. `data` holds the payload
//! as produced by the cache's [`PayloadCodec`](crate::PayloadCodec).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use unite_core::{CachePolicy, CodecError, DurationMs, EvictionReason, TimestampMs, UniteResult};

/// A cache entry as stored in the persistent backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry {
    /// Encoded payload.
    pub data: Value,
    /// Schema version in effect when the entry was written.
    pub version: String,
    /// Write time in milliseconds since the Unix epoch.
    pub timestamp: TimestampMs,
}

/// Outcome of checking an entry against the current policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validity {
    /// Readable.
    Valid,
    /// Older than the TTL.
    Expired { age_ms: DurationMs },
    /// Written under a different schema version.
    VersionMismatch { found: String },
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validity::Valid)
    }

    /// Why an entry in this state must be removed, if it must.
    pub fn eviction_reason(&self) -> Option<EvictionReason> {
        match self {
            Validity::Valid => None,
            Validity::Expired { .. } => Some(EvictionReason::Expired),
            Validity::VersionMismatch { .. } => Some(EvictionReason::VersionMismatch),
        }
    }
}

impl StoredEntry {
    /// Build an entry stamped with `policy`'s schema version.
    pub fn new(data: Value, policy: &CachePolicy, timestamp: TimestampMs) -> Self {
        Self {
            data,
            version: policy.schema_version.clone(),
            timestamp,
        }
    }

    /// Serialize for the persistent store.
    pub fn encode(&self) -> UniteResult<String> {
        serde_json::to_string(self).map_err(|e| {
            CodecError::Serialize {
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Parse a stored value. `key` is only used for error context.
    pub fn decode(key: &str, raw: &str) -> UniteResult<Self> {
        serde_json::from_str(raw).map_err(|e| {
            CodecError::MalformedEntry {
                key: key.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Age of the entry at `now`. Entries stamped in the future have age 0.
    pub fn age_ms(&self, now: TimestampMs) -> DurationMs {
        now.saturating_sub(self.timestamp).max(0)
    }

    /// Check version first, then TTL. An entry exactly `ttl` old is valid.
    pub fn validity(&self, policy: &CachePolicy, now: TimestampMs) -> Validity {
        if self.version != policy.schema_version {
            return Validity::VersionMismatch {
                found: self.version.clone(),
            };
        }
        let age_ms = self.age_ms(now);
        if age_ms > policy.ttl_millis() {
            return Validity::Expired { age_ms };
        }
        Validity::Valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use unite_core::UniteError;

    fn policy(ttl_ms: u64) -> CachePolicy {
        CachePolicy::new().with_ttl(Duration::from_millis(ttl_ms))
    }

    #[test]
    fn test_wire_format_field_names() {
        let entry = StoredEntry::new(json!({"title": "Foo"}), &CachePolicy::default(), 42);
        let raw = entry.encode().expect("encode");
        let value: Value = serde_json::from_str(&raw).expect("valid json");

        assert_eq!(value["data"], json!({"title": "Foo"}));
        assert_eq!(value["version"], json!("1.0.0"));
        assert_eq!(value["timestamp"], json!(42));
    }

    #[test]
    fn test_decode_preserves_version_and_timestamp() {
        let raw = r#"{"data":[1,2,3],"version":"1.0.0","timestamp":1718000000123}"#;
        let entry = StoredEntry::decode("card:1", raw).expect("decode");
        assert_eq!(entry.version, "1.0.0");
        assert_eq!(entry.timestamp, 1_718_000_000_123);
        assert_eq!(entry.data, json!([1, 2, 3]));
    }

    #[test]
    fn test_decode_garbage_is_malformed() {
        let err = StoredEntry::decode("card:1", "not json at all").expect_err("should fail");
        assert!(err.is_corruption());
        assert!(matches!(
            err,
            UniteError::Codec(CodecError::MalformedEntry { ref key, .. }) if key == "card:1"
        ));
    }

    #[test]
    fn test_decode_missing_fields_is_malformed() {
        let err = StoredEntry::decode("card:1", r#"{"data":1}"#).expect_err("should fail");
        assert!(err.is_corruption());
    }

    #[test]
    fn test_validity_boundaries() {
        let policy = policy(1_000);
        let entry = StoredEntry::new(Value::Null, &policy, 10_000);

        assert_eq!(entry.validity(&policy, 10_999), Validity::Valid);
        assert_eq!(entry.validity(&policy, 11_000), Validity::Valid);
        assert_eq!(
            entry.validity(&policy, 11_001),
            Validity::Expired { age_ms: 1_001 }
        );
    }

    #[test]
    fn test_version_mismatch_wins_over_age() {
        let written = policy(1_000);
        let entry = StoredEntry::new(Value::Null, &written, 10_000);
        let bumped = written.clone().with_schema_version("1.1.0");

        assert_eq!(
            entry.validity(&bumped, 10_000),
            Validity::VersionMismatch {
                found: "1.0.0".to_string()
            }
        );
    }

    #[test]
    fn test_future_timestamp_has_zero_age() {
        let entry = StoredEntry::new(Value::Null, &CachePolicy::default(), 5_000);
        assert_eq!(entry.age_ms(1_000), 0);
        assert!(entry.validity(&CachePolicy::default(), 1_000).is_valid());
    }

    #[test]
    fn test_eviction_reason() {
        assert_eq!(Validity::Valid.eviction_reason(), None);
        assert_eq!(
            Validity::Expired { age_ms: 1 }.eviction_reason(),
            Some(EvictionReason::Expired)
        );
        assert_eq!(
            Validity::VersionMismatch {
                found: "0.9.0".to_string()
            }
            .eviction_reason(),
            Some(EvictionReason::VersionMismatch)
        );
    }
}
