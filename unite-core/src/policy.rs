//! Cache policy constants.
//!
//! The policy is fixed when a cache is constructed. Bumping
//! [`DEFAULT_SCHEMA_VERSION`] invalidates every entry written under the
//! previous tag without a migration step.

use std::time::Duration;

use crate::error::ConfigError;
use crate::DurationMs;

/// Reserved key prefix owned by the component cache in a shared store.
pub const DEFAULT_NAMESPACE: &str = "unite-ui-component-cache:";

/// Current cache format version.
pub const DEFAULT_SCHEMA_VERSION: &str = "1.0.0";

/// Entries older than this are stale (7 days).
pub const DEFAULT_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Policy for a component cache instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    /// Key prefix reserved for this cache in the persistent store.
    pub namespace: String,
    /// Version tag written into every entry.
    pub schema_version: String,
    /// Maximum entry age.
    pub ttl: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            schema_version: DEFAULT_SCHEMA_VERSION.to_string(),
            ttl: DEFAULT_TTL,
        }
    }
}

impl CachePolicy {
    /// Create a policy with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the namespace prefix.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the schema version tag.
    pub fn with_schema_version(mut self, version: impl Into<String>) -> Self {
        self.schema_version = version.into();
        self
    }

    /// Set the entry TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// TTL in milliseconds, saturating at `i64::MAX`.
    pub fn ttl_millis(&self) -> DurationMs {
        DurationMs::try_from(self.ttl.as_millis()).unwrap_or(DurationMs::MAX)
    }

    /// Check that the policy can address and validate entries.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.namespace.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "namespace",
                reason: "must not be empty".to_string(),
            });
        }
        if self.schema_version.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "schema_version",
                reason: "must not be empty".to_string(),
            });
        }
        if self.ttl.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "ttl",
                reason: "must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = CachePolicy::default();
        assert_eq!(policy.namespace, "unite-ui-component-cache:");
        assert_eq!(policy.schema_version, "1.0.0");
        assert_eq!(policy.ttl_millis(), 604_800_000);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let policy = CachePolicy::new()
            .with_namespace("docs:")
            .with_schema_version("1.1.0")
            .with_ttl(Duration::from_millis(1_000));
        assert_eq!(policy.namespace, "docs:");
        assert_eq!(policy.schema_version, "1.1.0");
        assert_eq!(policy.ttl_millis(), 1_000);
    }

    #[test]
    fn test_validate_rejects_empty_namespace() {
        let policy = CachePolicy::new().with_namespace("");
        assert!(matches!(
            policy.validate(),
            Err(ConfigError::InvalidValue {
                field: "namespace",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_rejects_blank_version() {
        let policy = CachePolicy::new().with_schema_version("  ");
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let policy = CachePolicy::new().with_ttl(Duration::ZERO);
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_ttl_millis_saturates() {
        let policy = CachePolicy::new().with_ttl(Duration::MAX);
        assert_eq!(policy.ttl_millis(), DurationMs::MAX);
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_ttl_millis_matches_duration(ms in 1u64..=u64::from(u32::MAX)) {
            let policy = CachePolicy::new().with_ttl(Duration::from_millis(ms));
            prop_assert_eq!(policy.ttl_millis(), ms as DurationMs);
            prop_assert!(policy.validate().is_ok());
        }

        #[test]
        fn prop_non_empty_namespace_validates(ns in "[a-z-]{1,32}:") {
            let policy = CachePolicy::new().with_namespace(ns);
            prop_assert!(policy.validate().is_ok());
        }
    }
}
