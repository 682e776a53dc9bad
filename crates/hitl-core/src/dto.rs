//! Wire types exchanged with the HITL backend.
//!
//! Field names follow the backend's camelCase JSON. Server-issued records are
//! read-only on this side; only [`DecisionInput`] is ever sent.

use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Workflow checkpoint an approval request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalGate {
    ClassificationReview,
    FinalApproval,
}

impl ApprovalGate {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ClassificationReview => "Classification Review",
            Self::FinalApproval => "Final Approval",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
    TimedOut,
    Escalated,
}

/// Severity levels assigned by the classifier.
///
/// Context blobs carry severity as free text, so this is only used to
/// interpret a label; unknown labels stay strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Trivial,
}

impl Severity {
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "CRITICAL" => Some(Self::Critical),
            "HIGH" => Some(Self::High),
            "MEDIUM" => Some(Self::Medium),
            "LOW" => Some(Self::Low),
            "TRIVIAL" => Some(Self::Trivial),
            _ => None,
        }
    }
}

/// Ticket lifecycle states known to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TicketStatus {
    New,
    Validated,
    Classified,
    PendingClassificationApproval,
    ClassificationApproved,
    ClassificationRejected,
    Assigned,
    InProgress,
    PendingFinalApproval,
    Resolved,
    Closed,
    Archived,
}

impl TicketStatus {
    pub fn parse(label: &str) -> Option<Self> {
        Some(match label {
            "NEW" => Self::New,
            "VALIDATED" => Self::Validated,
            "CLASSIFIED" => Self::Classified,
            "PENDING_CLASSIFICATION_APPROVAL" => Self::PendingClassificationApproval,
            "CLASSIFICATION_APPROVED" => Self::ClassificationApproved,
            "CLASSIFICATION_REJECTED" => Self::ClassificationRejected,
            "ASSIGNED" => Self::Assigned,
            "IN_PROGRESS" => Self::InProgress,
            "PENDING_FINAL_APPROVAL" => Self::PendingFinalApproval,
            "RESOLVED" => Self::Resolved,
            "CLOSED" => Self::Closed,
            "ARCHIVED" => Self::Archived,
            _ => return None,
        })
    }
}

/// A pending request for a human decision, as listed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    pub approval_id: String,
    pub ticket_id: String,
    pub gate: ApprovalGate,
    pub status: ApprovalStatus,
    /// Serialized ticket context snapshot. Opaque until reconciled.
    #[serde(default)]
    pub context: Option<String>,
    /// Serialized AI classification. Opaque until reconciled.
    #[serde(default)]
    pub ai_recommendation: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Reviewer decision posted to `/approvals/decide`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionInput {
    pub approval_id: String,
    pub approved: bool,
    pub reviewer_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgress {
    pub batch_id: String,
    pub total_tickets: u64,
    pub processed_tickets: u64,
    pub pending_tickets: u64,
    #[serde(default)]
    pub status_breakdown: BTreeMap<String, u64>,
    /// Server-rounded; not necessarily `processed / total * 100`.
    pub progress_percentage: f64,
}

impl BatchProgress {
    /// Breakdown entries ordered by count, largest first. Ties keep label order.
    pub fn breakdown_by_count(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<(&str, u64)> = self
            .status_breakdown
            .iter()
            .map(|(label, count)| (label.as_str(), *count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub date: NaiveDate,
    pub total_tickets: u64,
    pub auto_processed: u64,
    pub manual_review: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub total_tickets: u64,
    pub auto_processed: u64,
    pub manual_review: u64,
    pub auto_processed_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketStats {
    #[serde(default)]
    pub daily_stats: Vec<DailyStats>,
    pub summary: StatsSummary,
}

/// Size of the statistics window in days. Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowDays(NonZeroU32);

impl WindowDays {
    pub const DEFAULT: WindowDays = WindowDays(NonZeroU32::MIN.saturating_add(6));

    pub fn new(days: u32) -> Option<Self> {
        NonZeroU32::new(days).map(Self)
    }

    pub fn get(&self) -> u32 {
        self.0.get()
    }
}

impl Default for WindowDays {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for WindowDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WindowDays {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let days: u32 = s
            .trim()
            .parse()
            .map_err(|_| format!("`{s}` is not a whole number of days"))?;
        Self::new(days).ok_or_else(|| "window must be at least one day".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_request_from_backend_json() {
        let json = r#"{
            "approvalId": "a1",
            "ticketId": "T-100",
            "gate": "CLASSIFICATION_REVIEW",
            "status": "PENDING",
            "context": "{\"ticketId\":\"T-100\"}",
            "createdAt": "2026-10-01T08:00:00Z",
            "expiresAt": "2026-10-02T08:00:00Z",
            "aiRecommendation": null
        }"#;
        let parsed: ApprovalRequest = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.approval_id, "a1");
        assert_eq!(parsed.gate, ApprovalGate::ClassificationReview);
        assert_eq!(parsed.status, ApprovalStatus::Pending);
        assert!(parsed.ai_recommendation.is_none());
        assert_eq!(parsed.context.as_deref(), Some(r#"{"ticketId":"T-100"}"#));
    }

    #[test]
    fn decision_omits_absent_comments() {
        let decision = DecisionInput {
            approval_id: "a1".into(),
            approved: true,
            reviewer_email: "lee@example.com".into(),
            comments: None,
        };
        let value = serde_json::to_value(&decision).unwrap();
        assert_eq!(value["approvalId"], "a1");
        assert_eq!(value["reviewerEmail"], "lee@example.com");
        assert!(value.get("comments").is_none());
    }

    #[test]
    fn breakdown_sorted_by_count_descending() {
        let progress = BatchProgress {
            batch_id: "batch-001".into(),
            total_tickets: 10,
            processed_tickets: 6,
            pending_tickets: 4,
            status_breakdown: BTreeMap::from([
                ("CLOSED".to_string(), 2),
                ("IN_PROGRESS".to_string(), 4),
                ("NEW".to_string(), 4),
            ]),
            progress_percentage: 60.0,
        };
        let entries = progress.breakdown_by_count();
        assert_eq!(entries, vec![("IN_PROGRESS", 4), ("NEW", 4), ("CLOSED", 2)]);
    }

    #[test]
    fn ticket_stats_parse_dates() {
        let json = r#"{
            "dailyStats": [
                {"date": "2026-10-15", "totalTickets": 12, "autoProcessed": 9, "manualReview": 3}
            ],
            "summary": {"totalTickets": 12, "autoProcessed": 9, "manualReview": 3, "autoProcessedPercentage": 75.0}
        }"#;
        let stats: TicketStats = serde_json::from_str(json).unwrap();
        assert_eq!(
            stats.daily_stats[0].date,
            NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()
        );
        assert_eq!(stats.summary.auto_processed_percentage, 75.0);
    }

    #[test]
    fn window_days_rejects_zero() {
        assert!(WindowDays::new(0).is_none());
        assert_eq!(WindowDays::default().get(), 7);
        assert_eq!("30".parse::<WindowDays>().unwrap().get(), 30);
        assert!("0".parse::<WindowDays>().is_err());
        assert!("a week".parse::<WindowDays>().is_err());
    }

    #[test]
    fn gate_labels() {
        assert_eq!(ApprovalGate::ClassificationReview.label(), "Classification Review");
        assert_eq!(ApprovalGate::FinalApproval.label(), "Final Approval");
    }
}
