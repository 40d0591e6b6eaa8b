use std::{error, io, path::PathBuf, result};

use thiserror::Error;

use crate::codec::CodecError;

/// Boxed error returned by caller-supplied update functions.
pub type BoxError = Box<dyn error::Error + Send + Sync + 'static>;

/// Error types for the configuration manager.
///
/// Disk related variants carry the path they failed on. Inside the update
/// loop these are logged and absorbed; they only reach a caller through
/// [`ConfigManager::update`](crate::config_store::ConfigManager::update) or
/// while starting the manager.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A mandatory manager setting was not provided
    #[error("{field} must be specified")]
    MissingRequiredField {
        /// Name of the missing setting
        field: &'static str,
    },

    /// Reading file metadata failed
    #[error("unable to stat config file '{path}': {source}")]
    Stat {
        /// Path of the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Reading the file contents failed
    #[error("error reading config from '{path}': {source}")]
    Read {
        /// Path of the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The file contents could not be decoded
    #[error("error decoding config from '{path}': {source}")]
    Decode {
        /// Path of the config file
        path: PathBuf,
        /// Codec error details
        #[source]
        source: CodecError,
    },

    /// The configuration could not be encoded
    #[error("unable to encode config: {source}")]
    Encode {
        /// Codec error details
        #[source]
        source: CodecError,
    },

    /// Writing the file failed
    #[error("unable to write config to '{path}': {source}")]
    Write {
        /// Path of the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The version found on disk disagrees with the version in memory
    #[error("version of config on disk did not match expected: expected {expected}, found {found}")]
    VersionMismatch {
        /// Version held in memory
        expected: u64,
        /// Version read from disk
        found: u64,
    },

    /// A caller-supplied update function failed
    #[error("update rejected: {0}")]
    Delta(#[source] BoxError),

    /// The first configuration could not be persisted while starting
    #[error("unable to perform initial update of config on disk: {0}")]
    InitialSave(#[source] Box<ConfigError>),

    /// The update loop is no longer running
    #[error("config manager is not running")]
    ManagerStopped,

    /// Manager settings could not be parsed
    #[error("invalid manager settings: {details}")]
    Settings {
        /// Parse error details
        details: String,
    },
}

/// A specialized `Result` type for configuration manager operations.
pub type Result<T> = result::Result<T, ConfigError>;

impl ConfigError {
    /// Whether this error came from the file system or the codec, as opposed
    /// to a caller or a version conflict.
    pub fn is_disk_error(&self) -> bool {
        matches!(
            self,
            Self::Stat { .. }
                | Self::Read { .. }
                | Self::Decode { .. }
                | Self::Encode { .. }
                | Self::Write { .. }
        )
    }
}
