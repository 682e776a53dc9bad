//! Pending-approvals list: polled every 30 s, re-fetched on invalidation.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use hitl_core::{ApprovalRequest, ApprovalView, Gateway, GatewayError};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::invalidate::{InvalidationBus, QueryKey};
use crate::schedule::{APPROVALS_INTERVAL, PollTask};
use crate::state::{Epoch, ViewState};

#[derive(Debug, Clone, PartialEq)]
pub enum ListState {
    Loading,
    Error(GatewayError),
    Empty,
    /// Non-empty, in server order.
    Populated(Vec<ApprovalRequest>),
}

impl ListState {
    pub fn from_outcome(outcome: Result<Vec<ApprovalRequest>, GatewayError>) -> Self {
        match outcome {
            Ok(approvals) if approvals.is_empty() => Self::Empty,
            Ok(approvals) => Self::Populated(approvals),
            Err(err) => Self::Error(err),
        }
    }

    pub fn approvals(&self) -> &[ApprovalRequest] {
        match self {
            Self::Populated(approvals) => approvals,
            _ => &[],
        }
    }

    /// Reconciled cards for the current list.
    pub fn views(&self) -> Vec<ApprovalView> {
        self.approvals().iter().map(ApprovalView::reconcile).collect()
    }

    /// Number of pending approvals, once known.
    pub fn pending_count(&self) -> Option<usize> {
        match self {
            Self::Empty => Some(0),
            Self::Populated(approvals) => Some(approvals.len()),
            Self::Loading | Self::Error(_) => None,
        }
    }
}

/// Keeps the pending-approvals list fresh while mounted.
pub struct ApprovalListController {
    state: Arc<ViewState<ListState>>,
    epoch: Epoch,
    poll: PollTask,
}

impl ApprovalListController {
    pub fn mount(gateway: Arc<dyn Gateway>, bus: &InvalidationBus) -> Self {
        Self::mount_with_interval(gateway, bus, APPROVALS_INTERVAL)
    }

    pub fn mount_with_interval(
        gateway: Arc<dyn Gateway>,
        bus: &InvalidationBus,
        interval: Duration,
    ) -> Self {
        let (state, epoch) = ViewState::new(ListState::Loading);
        let state = Arc::new(state);

        let cell = state.clone();
        let poll = PollTask::spawn("pending-approvals", interval, move || {
            let gateway = gateway.clone();
            let cell = cell.clone();
            async move {
                let outcome = gateway.list_pending_approvals().await;
                if let Err(err) = &outcome {
                    warn!(error = %err, "failed to load pending approvals");
                }
                let next = ListState::from_outcome(outcome);
                debug!(count = ?next.pending_count(), "pending approvals refreshed");
                cell.publish(epoch, next);
            }
            .boxed()
        });
        bus.subscribe(QueryKey::PendingApprovals, poll.trigger());

        Self { state, epoch, poll }
    }

    pub fn state(&self) -> ListState {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListState> {
        self.state.subscribe()
    }

    /// Re-enter `Loading` and fetch now (the error view's retry action).
    pub fn retry(&self) {
        self.state.publish(self.epoch, ListState::Loading);
        self.poll.refresh();
    }

    /// Fetch now, keeping the current state on screen until the result lands.
    pub fn refresh(&self) {
        self.poll.refresh();
    }
}

impl Drop for ApprovalListController {
    fn drop(&mut self) {
        self.state.close();
    }
}
