use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Disk poll interval used when none is configured.
pub const DEFAULT_FILE_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Remote poll interval used when none is configured.
pub const DEFAULT_HTTP_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Settings controlling where and how often a manager synchronizes.
///
/// Intervals are expressed in milliseconds so the struct reads naturally
/// from TOML:
///
/// ```toml
/// file_path = "/etc/myapp/config.toml"
/// file_poll_interval_ms = 500
/// http_url = "https://config.example.com/myapp.toml"
/// randomize_http_poll_interval = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerSettings {
    /// Path to the config file on disk. Required.
    pub file_path: Option<PathBuf>,

    /// How often to poll the file for changes. Defaults to one second.
    pub file_poll_interval_ms: Option<u64>,

    /// Remote location to fetch configuration from. Currently only drives
    /// the remote poll schedule.
    pub http_url: Option<String>,

    /// Certificate the remote connection should be verified against.
    pub http_cert: Option<String>,

    /// How often to poll the remote location. Defaults to one minute.
    pub http_poll_interval_ms: Option<u64>,

    /// Randomize the remote poll interval from poll to poll.
    pub randomize_http_poll_interval: bool,
}

impl ManagerSettings {
    /// Parses settings from a TOML document.
    ///
    /// # Errors
    /// Returns `ConfigError::Settings` if the content is not valid TOML or
    /// contains fields of the wrong type.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Settings {
            details: e.to_string(),
        })
    }

    /// Disk poll interval with the default applied.
    pub fn file_poll_interval(&self) -> Duration {
        match self.file_poll_interval_ms {
            Some(0) | None => DEFAULT_FILE_POLL_INTERVAL,
            Some(ms) => Duration::from_millis(ms),
        }
    }

    /// Remote poll interval with the default applied.
    pub fn http_poll_interval(&self) -> Duration {
        match self.http_poll_interval_ms {
            Some(0) | None => DEFAULT_HTTP_POLL_INTERVAL,
            Some(ms) => Duration::from_millis(ms),
        }
    }
}
