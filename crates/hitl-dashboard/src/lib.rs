//! View models and polling controllers behind the HITL console screens.

pub mod approvals;
pub mod batch;
pub mod decision;
pub mod invalidate;
pub mod notify;
pub mod schedule;
pub mod state;
pub mod stats;

pub use approvals::{ApprovalListController, ListState};
pub use batch::{BatchMonitor, BatchState, BatchTarget, NEW_BATCH_SENTINEL};
pub use decision::{
    ApprovalsPage, DecisionFlow, DecisionForm, FormError, PageAction, REASON_HINT, SubmitOutcome,
    Verdict,
};
pub use invalidate::{InvalidationBus, QueryKey};
pub use notify::{Level, Notification, NotificationLog, Notifier};
pub use schedule::PollTask;
pub use stats::{ChartRow, StatsState, StatsView, automated_share, chart_rows};
