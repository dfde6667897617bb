//! Application settings model
//!
//! This module defines the application-wide settings stored in config.toml.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::filter::TreeView;

/// Application-wide settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Server tree settings
    #[serde(default)]
    pub tree: TreeSettings,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl AppSettings {
    /// Checks settings values
    ///
    /// # Errors
    ///
    /// Returns a validation error for out-of-range values.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.tree.max_recent_connections == 0 {
            return Err(ConfigError::Validation {
                field: "tree.max_recent_connections".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "logging.level".to_string(),
                reason: "Log level cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Server tree settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSettings {
    /// Length of the recently used connections list
    #[serde(default = "default_max_recent")]
    pub max_recent_connections: usize,
    /// View shown when none is requested
    #[serde(default)]
    pub default_view: TreeView,
}

const fn default_max_recent() -> usize {
    25
}

impl Default for TreeSettings {
    fn default() -> Self {
        Self {
            max_recent_connections: default_max_recent(),
            default_view: TreeView::default(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default `tracing` filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
