//! Batch progress monitor.
//!
//! The monitor has a target: nothing selected, or one batch id. A selected
//! batch is polled every 5 s; nothing selected never touches the network.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use hitl_core::{BatchProgress, Gateway, GatewayError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::schedule::{BATCH_INTERVAL, PollTask};
use crate::state::{Epoch, ViewState};

/// Route segment that stands for "no batch selected".
pub const NEW_BATCH_SENTINEL: &str = "new";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchTarget {
    Unselected,
    Batch(String),
}

impl BatchTarget {
    /// Interpret a route segment. Blank and `new` mean nothing is selected.
    pub fn from_route(segment: &str) -> Self {
        match segment.trim() {
            "" | NEW_BATCH_SENTINEL => Self::Unselected,
            id => Self::Batch(id.to_string()),
        }
    }

    pub fn batch_id(&self) -> Option<&str> {
        match self {
            Self::Unselected => None,
            Self::Batch(id) => Some(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BatchState {
    /// Nothing selected; ask for a batch id.
    Prompt,
    Loading,
    NotFound { batch_id: String },
    Error(GatewayError),
    Ready(BatchProgress),
}

impl BatchState {
    pub fn from_outcome(batch_id: &str, outcome: Result<BatchProgress, GatewayError>) -> Self {
        match outcome {
            Ok(progress) => Self::Ready(progress),
            Err(err) if err.is_not_found() => Self::NotFound {
                batch_id: batch_id.to_string(),
            },
            Err(err) => Self::Error(err),
        }
    }
}

struct Selection {
    target: BatchTarget,
    poll: Option<PollTask>,
}

pub struct BatchMonitor {
    gateway: Arc<dyn Gateway>,
    state: Arc<ViewState<BatchState>>,
    interval: Duration,
    selection: Mutex<Selection>,
}

impl BatchMonitor {
    pub fn mount(gateway: Arc<dyn Gateway>, target: BatchTarget) -> Self {
        Self::mount_with_interval(gateway, target, BATCH_INTERVAL)
    }

    pub fn mount_with_interval(
        gateway: Arc<dyn Gateway>,
        target: BatchTarget,
        interval: Duration,
    ) -> Self {
        let (state, epoch) = ViewState::new(BatchState::Prompt);
        let monitor = Self {
            gateway,
            state: Arc::new(state),
            interval,
            selection: Mutex::new(Selection {
                target: BatchTarget::Unselected,
                poll: None,
            }),
        };
        let mut selection = monitor.lock();
        monitor.retarget(&mut selection, target, Some(epoch));
        drop(selection);
        monitor
    }

    pub fn target(&self) -> BatchTarget {
        self.lock().target.clone()
    }

    pub fn state(&self) -> BatchState {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<BatchState> {
        self.state.subscribe()
    }

    /// Select the batch typed into the lookup box.
    ///
    /// Blank input and the id already selected are ignored. Returns whether
    /// the target changed.
    pub fn search(&self, input: &str) -> bool {
        let id = input.trim();
        if id.is_empty() {
            return false;
        }
        let mut selection = self.lock();
        if selection.target.batch_id() == Some(id) {
            return false;
        }
        self.retarget(&mut selection, BatchTarget::Batch(id.to_string()), None);
        true
    }

    /// Switch to `target`, e.g. after navigation. Returns whether it changed.
    pub fn select(&self, target: BatchTarget) -> bool {
        let mut selection = self.lock();
        if selection.target == target {
            return false;
        }
        self.retarget(&mut selection, target, None);
        true
    }

    /// Fetch now. No-op while nothing is selected.
    pub fn refresh(&self) {
        if let Some(poll) = &self.lock().poll {
            poll.refresh();
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Selection> {
        self.selection.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the poll task for a new target. `initial` is the epoch handed
    /// out at mount; later switches begin a fresh one so the previous
    /// target's in-flight fetch cannot land.
    fn retarget(&self, selection: &mut Selection, target: BatchTarget, initial: Option<Epoch>) {
        selection.poll = None;
        let placeholder = match target {
            BatchTarget::Unselected => BatchState::Prompt,
            BatchTarget::Batch(_) => BatchState::Loading,
        };
        let epoch = match initial {
            Some(epoch) if self.state.publish(epoch, placeholder.clone()) => Some(epoch),
            Some(_) => None,
            None => self.state.begin(placeholder),
        };
        selection.target = target.clone();

        let (Some(epoch), BatchTarget::Batch(batch_id)) = (epoch, target) else {
            return;
        };
        info!(batch_id = %batch_id, "monitoring batch");
        let gateway = self.gateway.clone();
        let cell = self.state.clone();
        selection.poll = Some(PollTask::spawn("batch-progress", self.interval, move || {
            let gateway = gateway.clone();
            let cell = cell.clone();
            let batch_id = batch_id.clone();
            async move {
                let outcome = gateway.batch_progress(&batch_id).await;
                match &outcome {
                    Ok(progress) => debug!(
                        batch_id = %batch_id,
                        processed = progress.processed_tickets,
                        total = progress.total_tickets,
                        "batch progress refreshed"
                    ),
                    Err(err) if err.is_not_found() => debug!(batch_id = %batch_id, "batch not found"),
                    Err(err) => warn!(batch_id = %batch_id, error = %err, "failed to load batch progress"),
                }
                cell.publish(epoch, BatchState::from_outcome(&batch_id, outcome));
            }
            .boxed()
        }));
    }
}

impl Drop for BatchMonitor {
    fn drop(&mut self) {
        self.state.close();
    }
}
