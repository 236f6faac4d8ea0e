//! Dispatcher configuration.
//!
//! Every field has a default, so a partial JSON document is enough:
//!
//! ```json
//! { "completion": "record_failure", "sync": { "idle_timeout_ms": 5000 } }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ledger status recorded after a plugin's `process` hook returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPolicy {
    /// `done` whether the hook succeeded or not.
    #[default]
    AlwaysDone,
    /// `done` on success, `failed` when the hook errors or panics.
    RecordFailure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// How long a sync waits for the plugin's in-flight task to finish.
    pub idle_timeout_ms: u64,
}

impl SyncConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub completion: CompletionPolicy,
    pub sync: SyncConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl DispatcherConfig {
    /// v1 defaults: always `done`, 30s sync idle timeout.
    pub fn default_v1() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }
}
