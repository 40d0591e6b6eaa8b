//! confsync - keeps one in-memory configuration in step with a file on disk.
//!
//! Every change, whether it comes from an edit of the file or from a
//! programmatic update, passes through a single owning task. That task
//! persists the result with a monotonically increasing version and hands
//! each accepted configuration to consumers.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use confsync::{config::Config, config_store::ManagerBuilder};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
//! struct AppConfig {
//!     version: u64,
//!     #[serde(default)]
//!     workers: u32,
//! }
//!
//! impl Config for AppConfig {
//!     fn version(&self) -> u64 {
//!         self.version
//!     }
//!
//!     fn set_version(&mut self, version: u64) {
//!         self.version = version;
//!     }
//!
//!     fn apply_defaults(&mut self) {
//!         if self.workers == 0 {
//!             self.workers = 4;
//!         }
//!     }
//! }
//!
//! # async fn run() -> confsync::Result<()> {
//! let manager = ManagerBuilder::new()
//!     .empty_config(AppConfig::default)
//!     .file_path("app.toml")
//!     .start()?;
//!
//! let initial = manager.next().await?;
//! println!("workers: {}", initial.workers);
//!
//! manager
//!     .update(|config: &mut AppConfig| {
//!         config.workers = 8;
//!         Ok(())
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

/// Encoding of configurations to bytes.
pub mod codec;

/// Configuration capability contract and manager settings.
pub mod config;

/// Versioned configuration manager.
pub mod config_store;

/// Core error types and result aliases.
pub mod core;

/// Re-exported core types for convenience.
pub use crate::core::{BoxError, ConfigError, Result};
