//! Settings for hosts that open a persistent cache store.
//!
//! All fields are required except `log.filter`. Cache policy
//! (namespace, schema version, TTL) is deliberately absent: it is fixed at
//! build time in [`crate::policy`].

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Environment variable naming the settings file.
pub const CONFIG_ENV_VAR: &str = "UNITE_CACHE_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheSettings {
    /// Directory holding the LMDB environment.
    pub store_path: PathBuf,
    /// Maximum LMDB map size in megabytes.
    pub map_size_mb: usize,
    pub log: LogSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSettings {
    /// `EnvFilter` directive. `RUST_LOG` wins when set, and supplies the
    /// value when the field is omitted.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl CacheSettings {
    /// Load settings from an explicit path, falling back to `UNITE_CACHE_CONFIG`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(config_path_from_env)
            .ok_or(ConfigError::MissingConfigPath)?;
        let settings = Self::from_path(&path)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "store_path",
                reason: "must not be empty".to_string(),
            });
        }
        if self.map_size_mb == 0 {
            return Err(ConfigError::InvalidValue {
                field: "map_size_mb",
                reason: "must be > 0".to_string(),
            });
        }
        if self.log.filter.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "log.filter",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Used when neither the settings file nor `RUST_LOG` names a filter.
pub const DEFAULT_LOG_FILTER: &str = "info";

fn default_log_filter() -> String {
    std::env::var("RUST_LOG")
        .ok()
        .filter(|filter| !filter.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from)
}
