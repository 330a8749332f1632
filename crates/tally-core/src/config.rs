//! Engine configuration.
//!
//! Every field has a default, so an empty TOML document is a valid config.
//!
//! ```toml
//! max_retries = 3
//! tick_interval_secs = 30
//! refresh_interval_secs = 300
//! request_timeout_secs = 30
//! sync_on_reconnect = true
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Failed sync attempts tolerated before an action is dropped.
    pub max_retries: u32,

    /// Periodic budget check interval.
    pub tick_interval_secs: u64,

    /// Full reconciliation interval.
    pub refresh_interval_secs: u64,

    /// Upper bound on a single network call.
    pub request_timeout_secs: u64,

    /// Drain the queue automatically when connectivity comes back.
    pub sync_on_reconnect: bool,

    /// Emit transient notices (queued, synced, offline, ...).
    pub notices_enabled: bool,

    /// How many emitted alerts the monitor remembers.
    pub alert_history_limit: usize,

    /// Durable key holding the pending action list.
    pub actions_key: String,

    /// Durable key holding the cache map.
    pub cache_key: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            tick_interval_secs: 30,
            refresh_interval_secs: 300,
            request_timeout_secs: 30,
            sync_on_reconnect: true,
            notices_enabled: true,
            alert_history_limit: 50,
            actions_key: "tally-offline-actions".to_string(),
            cache_key: "tally-offline-data".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_secs == 0 || self.refresh_interval_secs == 0 {
            return Err(ConfigError::Invalid("timer intervals must be non-zero".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be non-zero".into()));
        }
        if self.actions_key == self.cache_key {
            return Err(ConfigError::Invalid(
                "actions_key and cache_key must differ".into(),
            ));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
