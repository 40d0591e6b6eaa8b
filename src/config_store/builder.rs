use std::{path::PathBuf, sync::Arc, time::Duration};

use tokio::sync::mpsc;
use tracing::{Instrument, Span, info, info_span};

use crate::{
    ConfigError, Result,
    codec::{Codec, TomlCodec},
    config::{Config, ManagerSettings},
};

use super::{
    ConfigManager,
    disk::{DiskState, EmptyConfigFn},
    publication::Publication,
    remote::RemotePoll,
    update_loop::UpdateLoop,
};

const DELTA_QUEUE_CAPACITY: usize = 100;

/// Collects the settings of a [`ConfigManager`] and starts it.
///
/// An empty-config factory and a file path are required; everything else has
/// a default.
///
/// # Example
///
/// ```rust,no_run
/// # use confsync::{config::Config, config_store::ManagerBuilder};
/// # use serde::{Deserialize, Serialize};
/// # #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
/// # struct AppConfig { version: u64 }
/// # impl Config for AppConfig {
/// #     fn version(&self) -> u64 { self.version }
/// #     fn set_version(&mut self, version: u64) { self.version = version; }
/// #     fn apply_defaults(&mut self) {}
/// # }
/// # async fn run() -> confsync::Result<()> {
/// let manager = ManagerBuilder::new()
///     .empty_config(AppConfig::default)
///     .file_path("/etc/myapp/config.toml")
///     .start()?;
///
/// let config: AppConfig = manager.next().await?;
/// # Ok(())
/// # }
/// ```
pub struct ManagerBuilder<C: Config> {
    settings: ManagerSettings,
    empty_config: Option<EmptyConfigFn<C>>,
    codec: Option<Arc<dyn Codec<C>>>,
    span: Option<Span>,
}

impl<C: Config> Default for ManagerBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Config> ManagerBuilder<C> {
    /// Creates a builder with no settings.
    pub fn new() -> Self {
        Self::with_settings(ManagerSettings::default())
    }

    /// Creates a builder from previously loaded settings.
    pub fn with_settings(settings: ManagerSettings) -> Self {
        Self {
            settings,
            empty_config: None,
            codec: None,
            span: None,
        }
    }

    /// Factory for new empty configs. Required.
    pub fn empty_config<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
    {
        self.empty_config = Some(Arc::new(factory));
        self
    }

    /// Path to the config file on disk. Required.
    pub fn file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings.file_path = Some(path.into());
        self
    }

    /// How frequently to poll the file for changes.
    pub fn file_poll_interval(mut self, interval: Duration) -> Self {
        self.settings.file_poll_interval_ms = Some(duration_millis(interval));
        self
    }

    /// Remote location configuration would be fetched from.
    pub fn http_url(mut self, url: impl Into<String>) -> Self {
        self.settings.http_url = Some(url.into());
        self
    }

    /// Certificate the remote connection would be verified against.
    pub fn http_cert(mut self, cert: impl Into<String>) -> Self {
        self.settings.http_cert = Some(cert.into());
        self
    }

    /// How frequently to poll the remote location.
    pub fn http_poll_interval(mut self, interval: Duration) -> Self {
        self.settings.http_poll_interval_ms = Some(duration_millis(interval));
        self
    }

    /// Randomize the remote poll interval from poll to poll.
    pub fn randomize_http_poll_interval(mut self, randomize: bool) -> Self {
        self.settings.randomize_http_poll_interval = randomize;
        self
    }

    /// Codec used for the file. Defaults to [`TomlCodec`].
    pub fn codec(mut self, codec: impl Codec<C> + 'static) -> Self {
        self.codec = Some(Arc::new(codec));
        self
    }

    /// Span the manager logs under for its whole life.
    ///
    /// Defaults to an `info` span named `config_manager` carrying the file path.
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Loads or creates the config file and starts the update loop.
    ///
    /// The first authoritative config is published before the loop starts,
    /// so the first [`ConfigManager::next`] returns it. Must be called from
    /// within a Tokio runtime.
    ///
    /// # Errors
    /// * `ConfigError::MissingRequiredField` - if the factory or file path is
    ///   missing
    /// * `ConfigError::InitialSave` - if the initial config cannot be
    ///   persisted; no loop is started in that case
    pub fn start(self) -> Result<ConfigManager<C>> {
        let empty_config = self
            .empty_config
            .ok_or(ConfigError::MissingRequiredField {
                field: "empty_config",
            })?;
        let path = self
            .settings
            .file_path
            .clone()
            .filter(|path| !path.as_os_str().is_empty())
            .ok_or(ConfigError::MissingRequiredField { field: "file_path" })?;

        let span = self
            .span
            .unwrap_or_else(|| info_span!("config_manager", path = %path.display()));
        let codec = self.codec.unwrap_or_else(|| Arc::new(TomlCodec));

        let mut state = DiskState::new(path, codec, empty_config);
        span.in_scope(|| state.initialize())?;

        let (deltas_tx, deltas_rx) = mpsc::channel(DELTA_QUEUE_CAPACITY);
        let publication = Arc::new(Publication::new());

        let update_loop = UpdateLoop {
            state,
            deltas: deltas_rx,
            publication: Arc::clone(&publication),
            file_poll_interval: self.settings.file_poll_interval(),
            remote: RemotePoll::from_settings(&self.settings),
        };

        span.in_scope(|| {
            info!(
                path = %update_loop.state.path().display(),
                poll_interval = ?update_loop.file_poll_interval,
                "Configuration manager started"
            );
        });
        update_loop.publish_current();

        let handle = tokio::spawn(update_loop.run().instrument(span));

        Ok(ConfigManager::new(deltas_tx, publication, handle))
    }
}

fn duration_millis(interval: Duration) -> u64 {
    let millis = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);

    // Zero means "use the default", so sub-millisecond intervals round up
    if millis == 0 && !interval.is_zero() {
        1
    } else {
        millis
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
    struct Empty {
        version: u64,
    }

    impl Config for Empty {
        fn version(&self) -> u64 {
            self.version
        }

        fn set_version(&mut self, version: u64) {
            self.version = version;
        }

        fn apply_defaults(&mut self) {}
    }

    #[test]
    fn sub_millisecond_intervals_round_up() {
        let builder = ManagerBuilder::<Empty>::new()
            .file_poll_interval(Duration::from_micros(500))
            .http_poll_interval(Duration::from_nanos(1));

        assert_eq!(
            builder.settings.file_poll_interval(),
            Duration::from_millis(1)
        );
        assert_eq!(
            builder.settings.http_poll_interval(),
            Duration::from_millis(1)
        );
    }

    #[test]
    fn whole_millisecond_intervals_are_kept() {
        let builder = ManagerBuilder::<Empty>::new()
            .file_poll_interval(Duration::from_millis(250))
            .http_poll_interval(Duration::from_secs(30));

        assert_eq!(builder.settings.file_poll_interval_ms, Some(250));
        assert_eq!(builder.settings.http_poll_interval_ms, Some(30_000));
    }

    #[test]
    fn zero_interval_falls_back_to_default() {
        let builder = ManagerBuilder::<Empty>::new().file_poll_interval(Duration::ZERO);

        assert_eq!(
            builder.settings.file_poll_interval(),
            crate::config::DEFAULT_FILE_POLL_INTERVAL
        );
    }
}
