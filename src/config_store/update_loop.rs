use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, oneshot},
    time::{self, MissedTickBehavior},
};
use tracing::{debug, error, trace, warn};

use crate::{BoxError, ConfigError, Result, config::Config};

use super::{
    disk::DiskState,
    publication::{CloseOnDrop, Publication},
    remote::RemotePoll,
};

/// Caller-supplied mutation applied to a copy of the current config.
pub type DeltaFn<C> = Box<dyn FnOnce(&mut C) -> std::result::Result<(), BoxError> + Send>;

/// A mutation request together with the channel its outcome is reported on.
pub(crate) struct Delta<C> {
    pub(crate) apply: DeltaFn<C>,
    pub(crate) respond: oneshot::Sender<Result<()>>,
}

pub(crate) type DeltaSender<C> = mpsc::Sender<Delta<C>>;
pub(crate) type DeltaReceiver<C> = mpsc::Receiver<Delta<C>>;

/// Sole owner and mutator of the authoritative configuration.
pub(crate) struct UpdateLoop<C: Config> {
    pub(crate) state: DiskState<C>,
    pub(crate) deltas: DeltaReceiver<C>,
    pub(crate) publication: Arc<Publication<C>>,
    pub(crate) file_poll_interval: Duration,
    pub(crate) remote: RemotePoll,
}

impl<C: Config> UpdateLoop<C> {
    /// Services one event per iteration until every manager handle is gone.
    ///
    /// The publication is closed when the loop ends, also if a delta panics.
    pub(crate) async fn run(mut self) {
        let _close = CloseOnDrop(Arc::clone(&self.publication));
        let mut next_remote = self.remote.next_deadline();

        // Deltas and remote ticks must not push the disk poll back
        let mut file_poll = time::interval(self.file_poll_interval);
        file_poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        file_poll.reset();

        loop {
            trace!("Waiting for next update");

            let changed = tokio::select! {
                delta = self.deltas.recv() => {
                    let Some(delta) = delta else {
                        debug!("All manager handles dropped, stopping update loop");
                        return;
                    };
                    self.apply_delta(delta)
                }

                _ = file_poll.tick() => {
                    trace!("Read update from disk");
                    match self.state.reload() {
                        Ok(changed) => changed,
                        Err(err) if err.is_disk_error() => {
                            error!(error = %err, "Unable to read updated config from disk");
                            false
                        }
                        Err(err) => {
                            warn!(error = %err, "Rejected config on disk");
                            false
                        }
                    }
                }

                _ = time::sleep_until(next_remote) => {
                    self.remote.poll();
                    next_remote = self.remote.next_deadline();
                    false
                }
            };

            if changed {
                self.publish_current();
            }
        }
    }

    /// Publishes the authoritative configuration.
    pub(crate) fn publish_current(&self) {
        if let Some(current) = self.state.current() {
            trace!(version = current.version(), "Publish changed config");
            self.publication.publish(current.clone());
        }
    }

    fn apply_delta(&mut self, delta: Delta<C>) -> bool {
        trace!("Apply delta");
        let Delta { apply, respond } = delta;

        let mut updated = self.state.working_copy();
        if let Err(err) = apply(&mut updated) {
            debug!(error = %err, "Update function failed, discarding change");
            let _ = respond.send(Err(ConfigError::Delta(err)));
            return false;
        }

        let (changed, outcome) = match self.state.save_and_update(updated) {
            Ok(changed) => (changed, Ok(())),
            Err(err) => {
                error!(error = %err, "Unable to save updated config");
                (false, Err(err))
            }
        };

        // The caller may have stopped waiting; the change still stands.
        let _ = respond.send(outcome);

        changed
    }
}
