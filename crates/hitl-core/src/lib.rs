//! Domain types and the backend gateway contract for the HITL review console.

pub mod context;
pub mod dto;
pub mod error;
pub mod gateway;
pub mod status;
pub mod validate;

pub use context::{ApprovalView, Classification, ContextBlob, RecommendationBlob, TicketView, Urgency};
pub use dto::{
    ApprovalGate, ApprovalRequest, ApprovalStatus, BatchProgress, DailyStats, DecisionInput,
    Severity, StatsSummary, TicketStats, TicketStatus, WindowDays,
};
pub use error::{ErrorResponse, GatewayError};
pub use gateway::Gateway;
pub use validate::{EmailError, validate_email};
pub use status::{StatusTone, humanize_status};
