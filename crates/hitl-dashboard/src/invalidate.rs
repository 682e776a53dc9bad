//! Explicit cache invalidation between views.
//!
//! A mutation that makes some view's data stale publishes the affected
//! [`QueryKey`]; every view subscribed under that key re-fetches immediately.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::Notify;
use tracing::debug;

/// Data sets a view can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    PendingApprovals,
    TicketStats,
}

#[derive(Clone, Default)]
pub struct InvalidationBus {
    subscribers: Arc<Mutex<HashMap<QueryKey, Vec<Weak<Notify>>>>>,
}

impl InvalidationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `trigger` to be notified when `key` is invalidated.
    ///
    /// The bus holds only a weak reference; a torn-down view drops out on
    /// the next subscribe or publish under its key.
    pub fn subscribe(&self, key: QueryKey, trigger: &Arc<Notify>) {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        let triggers = subscribers.entry(key).or_default();
        triggers.retain(|weak| weak.strong_count() > 0);
        triggers.push(Arc::downgrade(trigger));
    }

    /// Mark `key` stale. Returns how many live subscribers were notified.
    pub fn invalidate(&self, key: QueryKey) -> usize {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(triggers) = subscribers.get_mut(&key) else {
            return 0;
        };
        triggers.retain(|weak| weak.strong_count() > 0);
        let mut notified = 0;
        for trigger in triggers.iter().filter_map(Weak::upgrade) {
            trigger.notify_one();
            notified += 1;
        }
        debug!(?key, notified, "invalidated");
        notified
    }
}
