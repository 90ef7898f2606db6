//! Error types for Unite cache operations

use thiserror::Error;

/// Persistent storage errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Storage unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Storage quota exceeded writing {key} ({bytes} bytes)")]
    QuotaExceeded { key: String, bytes: usize },

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("I/O error: {reason}")]
    Io { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Entry and payload (de)serialization errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Failed to serialize payload: {reason}")]
    Serialize { reason: String },

    #[error("Failed to deserialize payload: {reason}")]
    Deserialize { reason: String },

    #[error("Malformed cache entry under {key}: {reason}")]
    MalformedEntry { key: String, reason: String },
}

/// Caller input errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Cache key must not be empty")]
    EmptyKey,
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or UNITE_CACHE_CONFIG)")]
    MissingConfigPath,

    #[error("Failed to read config file {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to parse config TOML: {reason}")]
    Parse { reason: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Master error type for all Unite cache errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UniteError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl UniteError {
    /// Returns true for errors that mean the stored bytes cannot be trusted.
    ///
    /// Entries failing this way are removed rather than retried.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            UniteError::Codec(CodecError::Deserialize { .. })
                | UniteError::Codec(CodecError::MalformedEntry { .. })
        )
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            CodecError::Serialize {
                reason: e.to_string(),
            }
        } else {
            CodecError::Deserialize {
                reason: e.to_string(),
            }
        }
    }
}

/// Result type alias for Unite operations.
pub type UniteResult<T> = Result<T, UniteError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display_quota() {
        let err = StorageError::QuotaExceeded {
            key: "unite-ui-component-cache:card:42".to_string(),
            bytes: 5_242_881,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("quota exceeded"));
        assert!(msg.contains("card:42"));
        assert!(msg.contains("5242881"));
    }

    #[test]
    fn test_codec_error_display_malformed() {
        let err = CodecError::MalformedEntry {
            key: "card:1".to_string(),
            reason: "missing field `version`".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Malformed cache entry"));
        assert!(msg.contains("card:1"));
        assert!(msg.contains("version"));
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "map_size_mb",
            reason: "must be > 0".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("map_size_mb"));
        assert!(msg.contains("must be > 0"));
    }

    #[test]
    fn test_unite_error_from_storage() {
        let err: UniteError = StorageError::LockPoisoned.into();
        assert!(matches!(err, UniteError::Storage(StorageError::LockPoisoned)));
        assert!(format!("{}", err).starts_with("Storage error"));
    }

    #[test]
    fn test_is_corruption() {
        let corrupt: UniteError = CodecError::Deserialize {
            reason: "expected value".to_string(),
        }
        .into();
        assert!(corrupt.is_corruption());

        let malformed: UniteError = CodecError::MalformedEntry {
            key: "k".to_string(),
            reason: "bad".to_string(),
        }
        .into();
        assert!(malformed.is_corruption());

        let unavailable: UniteError = StorageError::Unavailable {
            reason: "no storage".to_string(),
        }
        .into();
        assert!(!unavailable.is_corruption());
    }

    #[test]
    fn test_serde_json_error_maps_to_deserialize() {
        let err = serde_json::from_str::<serde_json::Value>("{not json")
            .expect_err("parse should fail");
        let codec: CodecError = err.into();
        assert!(matches!(codec, CodecError::Deserialize { .. }));
    }
}
