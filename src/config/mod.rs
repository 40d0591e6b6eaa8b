//! Configuration capability contract and manager settings.
//!
//! Any type managed by a [`ConfigManager`](crate::config_store::ConfigManager)
//! implements [`Config`]. The manager itself is configured through
//! [`ManagerSettings`], which can be embedded in an application's own TOML.

mod settings;

pub use settings::{
    DEFAULT_FILE_POLL_INTERVAL, DEFAULT_HTTP_POLL_INTERVAL, ManagerSettings,
};

use std::fmt::Debug;

use serde::{Serialize, de::DeserializeOwned};

/// Capabilities a configuration type needs in order to be synchronized.
///
/// Equality (`PartialEq`) must compare every field, including the version;
/// the manager zeroes versions itself when it wants a content-only comparison.
/// Copies (`Clone`) must be deep, so that mutating a copy never affects the
/// original.
///
/// # Example
///
/// ```rust
/// use confsync::config::Config;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
/// struct AppConfig {
///     version: u64,
///     #[serde(default)]
///     listen_port: u16,
/// }
///
/// impl Config for AppConfig {
///     fn version(&self) -> u64 {
///         self.version
///     }
///
///     fn set_version(&mut self, version: u64) {
///         self.version = version;
///     }
///
///     fn apply_defaults(&mut self) {
///         if self.listen_port == 0 {
///             self.listen_port = 8080;
///         }
///     }
/// }
/// ```
pub trait Config:
    Clone + PartialEq + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Returns the version of this configuration.
    fn version(&self) -> u64;

    /// Overwrites the version of this configuration.
    fn set_version(&mut self, version: u64);

    /// Fills in unset fields.
    ///
    /// Must be deterministic and idempotent: applying it twice has the same
    /// effect as applying it once.
    fn apply_defaults(&mut self);
}
