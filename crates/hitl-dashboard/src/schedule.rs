//! Fixed-interval polling tied to a view's lifetime.
//!
//! Each mounted view owns a [`PollTask`]. The task fetches immediately, then
//! on every interval tick and whenever its refresh trigger fires. Dropping the
//! task stops it; time is `tokio::time`, so tests can run on a paused clock.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub const APPROVALS_INTERVAL: Duration = Duration::from_secs(30);
pub const BATCH_INTERVAL: Duration = Duration::from_secs(5);
pub const STATS_INTERVAL: Duration = Duration::from_secs(60);

/// A running poll loop. Stops when dropped.
pub struct PollTask {
    cancel: CancellationToken,
    trigger: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl PollTask {
    /// Spawn a loop that awaits `fetch()` once per tick or forced refresh.
    ///
    /// Fetches never overlap: a tick or refresh that arrives mid-fetch is
    /// served once the current fetch finishes.
    pub fn spawn<F>(name: &'static str, period: Duration, mut fetch: F) -> Self
    where
        F: FnMut() -> BoxFuture<'static, ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let trigger = Arc::new(Notify::new());

        let token = cancel.clone();
        let forced = trigger.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = forced.notified() => debug!(task = name, "forced refresh"),
                    _ = ticker.tick() => debug!(task = name, "poll tick"),
                }
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = fetch() => {}
                }
            }
            debug!(task = name, "poll task stopped");
        });

        Self {
            cancel,
            trigger,
            handle,
        }
    }

    /// Force a fetch now, independent of the interval.
    pub fn refresh(&self) {
        self.trigger.notify_one();
    }

    /// The refresh trigger, for wiring into an invalidation bus.
    pub fn trigger(&self) -> &Arc<Notify> {
        &self.trigger
    }
}

impl Drop for PollTask {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}
