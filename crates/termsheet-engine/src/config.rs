//! Engine configuration.
//!
//! Loaded from TOML. Every key is optional:
//!
//! ```toml
//! validation_debounce_ms = 500
//! visible_cache_ttl_ms = 100
//! history_capacity = 50
//! log_values = false
//!
//! [autosave]
//! enabled = true
//! debounce_ms = 30000
//! max_delay_ms = 120000
//! ```

use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use termsheet_persistence::AutoSaveConfig;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Quiet period before whole-form validation runs.
    pub validation_debounce_ms: u64,
    /// How long the visible-field list is served without recomputing.
    pub visible_cache_ttl_ms: u64,
    /// Number of change records kept.
    pub history_capacity: usize,
    pub autosave: AutoSaveConfig,
    /// Allow field values in log output. Only ever turns value logging
    /// on, so a host flag that enabled it stays in effect.
    pub log_values: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            validation_debounce_ms: 500,
            visible_cache_ttl_ms: 100,
            history_capacity: 50,
            autosave: AutoSaveConfig::default(),
            log_values: false,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn validation_debounce(&self) -> Duration {
        millis(self.validation_debounce_ms)
    }

    pub fn visible_cache_ttl(&self) -> Duration {
        millis(self.visible_cache_ttl_ms)
    }
}

/// Load the engine config, falling back to defaults when the file is
/// missing or unreadable.
pub fn load_config(path: &Path) -> EngineConfig {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!("No engine config at {}: {e}", path.display());
            return EngineConfig::default();
        }
    };
    match EngineConfig::from_toml_str(&content) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Ignoring invalid engine config {}: {e}", path.display());
            EngineConfig::default()
        }
    }
}

pub(crate) fn millis(ms: u64) -> Duration {
    Duration::milliseconds(i64::try_from(ms).unwrap_or(i64::MAX))
}
