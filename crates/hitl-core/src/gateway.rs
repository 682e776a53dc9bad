//! The four backend operations the console depends on.

use async_trait::async_trait;

use crate::dto::{ApprovalRequest, BatchProgress, DecisionInput, TicketStats, WindowDays};
use crate::error::GatewayError;

/// Typed access to the HITL backend.
///
/// Each call is a single request/response round trip. Implementations do not
/// retry; every failure is reported as a [`GatewayError`].
#[async_trait]
pub trait Gateway: Send + Sync {
    /// `GET /approvals/pending`, in server order.
    async fn list_pending_approvals(&self) -> Result<Vec<ApprovalRequest>, GatewayError>;

    /// `POST /approvals/decide`. The updated approval is not returned.
    async fn submit_decision(&self, decision: &DecisionInput) -> Result<(), GatewayError>;

    /// `GET /batches/{batch_id}/progress`. Unknown batches fail with a 404.
    async fn batch_progress(&self, batch_id: &str) -> Result<BatchProgress, GatewayError>;

    /// `GET /batches/stats?days=N`.
    async fn ticket_stats(&self, window: WindowDays) -> Result<TicketStats, GatewayError>;
}
