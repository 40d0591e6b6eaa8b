use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;
use tracing::trace;

use crate::config::ManagerSettings;

/// Schedule for polling a remote configuration source.
///
/// Fetching itself is not implemented: a tick only records that the remote
/// would have been checked and moves the deadline forward. An implementation
/// must send the last entity tag so an unchanged remote answers "not
/// modified", and must retry through the proxy when a direct connection
/// fails.
#[derive(Debug, Clone)]
pub(crate) struct RemotePoll {
    url: Option<String>,
    cert: Option<String>,
    interval: Duration,
    randomize: bool,
}

impl RemotePoll {
    pub(crate) fn from_settings(settings: &ManagerSettings) -> Self {
        Self {
            url: settings.http_url.clone(),
            cert: settings.http_cert.clone(),
            interval: settings.http_poll_interval(),
            randomize: settings.randomize_http_poll_interval,
        }
    }

    /// Deadline of the next remote poll, counted from now.
    pub(crate) fn next_deadline(&self) -> Instant {
        Instant::now() + self.next_delay()
    }

    /// Delay until the next poll.
    ///
    /// With randomization the delay is half the interval plus a uniformly
    /// random amount below the full interval, so many instances started
    /// together drift apart.
    pub(crate) fn next_delay(&self) -> Duration {
        if !self.randomize {
            return self.interval;
        }

        let interval_nanos = u64::try_from(self.interval.as_nanos()).unwrap_or(u64::MAX);
        if interval_nanos == 0 {
            return self.interval;
        }

        let jitter = rand::thread_rng().gen_range(0..interval_nanos);
        Duration::from_nanos((interval_nanos / 2).saturating_add(jitter))
    }

    /// Handles an elapsed remote deadline.
    pub(crate) fn poll(&self) {
        if let Some(url) = &self.url {
            trace!(
                url = %url,
                pinned_cert = self.cert.is_some(),
                "Check for remote updates"
            );
        }
    }
}
