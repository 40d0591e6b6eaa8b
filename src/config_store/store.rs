use std::sync::Arc;

use futures::Stream;
use tokio::{sync::oneshot, task::JoinHandle};
use tracing::{instrument, trace};

use crate::{BoxError, ConfigError, Result, config::Config};

use super::{
    publication::Publication,
    update_loop::{Delta, DeltaSender},
};

/// Handle to a running configuration manager.
///
/// A dedicated task owns the authoritative configuration and is the only
/// writer of the config file. This handle talks to it through message
/// passing: updates are queued to the task, and every accepted change is
/// handed back through a single-slot publication.
///
/// Clones share the same task. The task stops once every clone and every
/// [`ConfigManager::changes`] stream is dropped.
pub struct ConfigManager<C: Config> {
    deltas: DeltaSender<C>,
    publication: Arc<Publication<C>>,
    handle: Arc<JoinHandle<()>>,
}

impl<C: Config> Clone for ConfigManager<C> {
    fn clone(&self) -> Self {
        Self {
            deltas: self.deltas.clone(),
            publication: Arc::clone(&self.publication),
            handle: Arc::clone(&self.handle),
        }
    }
}

impl<C: Config> ConfigManager<C> {
    pub(crate) fn new(
        deltas: DeltaSender<C>,
        publication: Arc<Publication<C>>,
        handle: JoinHandle<()>,
    ) -> Self {
        Self {
            deltas,
            publication,
            handle: Arc::new(handle),
        }
    }

    /// Waits for the next published configuration.
    ///
    /// Each publication is handed to a single caller; concurrent callers
    /// receive distinct configurations. If several changes are accepted
    /// before anyone asks, only the newest is delivered. Waits as long as
    /// nothing changes, so callers needing a deadline must impose one.
    ///
    /// # Errors
    /// * `ConfigError::ManagerStopped` - if the update loop is gone and no
    ///   unconsumed configuration is left
    pub async fn next(&self) -> Result<C> {
        self.publication
            .take()
            .await
            .ok_or(ConfigError::ManagerStopped)
    }

    /// Stream of published configurations, with the same hand-off semantics
    /// as [`ConfigManager::next`].
    ///
    /// The stream keeps the update loop alive on its own, so it keeps
    /// yielding after every manager handle is dropped. It ends if the loop
    /// dies regardless, such as when a delta panics.
    pub fn changes(&self) -> impl Stream<Item = C> + use<C> {
        let state = (Arc::clone(&self.publication), self.deltas.clone());

        futures::stream::unfold(state, |(publication, deltas)| async move {
            let config = publication.take().await?;
            Some((config, (publication, deltas)))
        })
    }

    /// Applies `delta` to a copy of the current configuration and persists
    /// the result.
    ///
    /// Waits until the update loop has fully processed the request, including
    /// the disk write. Updates from concurrent callers are applied one at a
    /// time in the order the loop receives them. If the result matches the
    /// current configuration, nothing is written and no version is consumed.
    ///
    /// # Errors
    /// * `ConfigError::Delta` - if `delta` returned an error; nothing changed
    /// * `ConfigError::Encode`, `ConfigError::Write`, `ConfigError::Stat` -
    ///   if the updated config could not be persisted; nothing changed
    /// * `ConfigError::ManagerStopped` - if the update loop is gone
    #[instrument(level = "trace", skip_all)]
    pub async fn update<F>(&self, delta: F) -> Result<()>
    where
        F: FnOnce(&mut C) -> std::result::Result<(), BoxError> + Send + 'static,
    {
        let (respond, outcome) = oneshot::channel();
        let delta = Delta {
            apply: Box::new(delta),
            respond,
        };

        trace!("Submitting delta");
        self.deltas
            .send(delta)
            .await
            .map_err(|_| ConfigError::ManagerStopped)?;

        outcome.await.map_err(|_| ConfigError::ManagerStopped)?
    }

    /// Whether the update loop is still running.
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}
