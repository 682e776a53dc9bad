//! Reconciles an approval's two JSON blobs into one display record.
//!
//! The context blob and the AI recommendation blob are produced by different
//! backend stages and are only loosely shaped. Parsing here is total: a blob
//! that is not JSON, not an object, or carries fields of the wrong type
//! degrades to a fallback instead of failing, so a card can always be drawn.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::dto::{ApprovalGate, ApprovalRequest, Severity};

/// Ticket id shown when the context blob cannot be read.
pub const UNKNOWN_TICKET_ID: &str = "unknown";

/// Visual urgency derived from a severity label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Urgency {
    High,
    Neutral,
    Low,
}

impl Urgency {
    /// Total over all labels: anything unrecognized, or no label, is `Low`.
    pub fn from_severity(severity: Option<&str>) -> Self {
        match severity.and_then(Severity::parse) {
            Some(Severity::Critical | Severity::High) => Self::High,
            Some(Severity::Medium) => Self::Neutral,
            Some(Severity::Low | Severity::Trivial) | None => Self::Low,
        }
    }
}

/// Classification record, whichever blob it came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    /// Raw label; see [`Urgency::from_severity`].
    pub severity: Option<String>,
    pub priority: Option<i64>,
    /// Expected in `[0, 1]`; not clamped.
    pub confidence_score: Option<f64>,
    pub reasoning: Option<String>,
    pub classification_source: Option<String>,
}

impl Classification {
    fn from_object(obj: &Map<String, Value>) -> Self {
        Self {
            category: text(obj, "category"),
            subcategory: text(obj, "subcategory"),
            severity: text(obj, "severity"),
            priority: integer(obj, "priority"),
            confidence_score: number(obj, "confidenceScore"),
            reasoning: text(obj, "reasoning"),
            classification_source: text(obj, "classificationSource"),
        }
    }

    pub fn urgency(&self) -> Urgency {
        Urgency::from_severity(self.severity.as_deref())
    }

    /// Confidence as a percentage, e.g. `0.873` → `87.3`.
    pub fn confidence_percent(&self) -> Option<f64> {
        self.confidence_score.map(|score| score * 100.0)
    }
}

/// Ticket fields as displayed on an approval card.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketView {
    pub ticket_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub reporter: Option<String>,
    /// Kept as sent; may not be a valid timestamp.
    pub created_at: Option<String>,
    pub status: Option<String>,
    pub source_reference: Option<String>,
}

impl TicketView {
    /// Read the ticket fields of an object. `ticket_id` is left as found.
    fn fields_of(obj: &Map<String, Value>) -> (Option<String>, Self) {
        let view = Self {
            ticket_id: String::new(),
            title: text(obj, "title"),
            description: text(obj, "description"),
            reporter: text(obj, "reporter"),
            created_at: text(obj, "createdAt"),
            status: text(obj, "status"),
            source_reference: text(obj, "sourceReference"),
        };
        (text(obj, "ticketId"), view)
    }
}

/// Recognized shape of a context blob.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketContext {
    pub ticket_id: Option<String>,
    /// Root-level ticket fields; `ticket_id` inside is unused.
    pub root: TicketView,
    /// Nested `defectTicket` record, with its own (optional) id.
    pub defect_ticket: Option<(Option<String>, TicketView)>,
    pub classification: Option<Classification>,
}

impl TicketContext {
    /// The record substituted for an unreadable blob.
    pub fn unknown() -> Self {
        Self {
            ticket_id: Some(UNKNOWN_TICKET_ID.to_string()),
            ..Self::default()
        }
    }

    fn from_object(obj: &Map<String, Value>) -> Self {
        let (ticket_id, root) = TicketView::fields_of(obj);
        Self {
            ticket_id,
            root,
            defect_ticket: obj
                .get("defectTicket")
                .and_then(Value::as_object)
                .map(TicketView::fields_of),
            classification: obj
                .get("classification")
                .and_then(Value::as_object)
                .map(Classification::from_object),
        }
    }

    /// Ticket record to display. `defectTicket` wins over root-level fields.
    pub fn ticket(&self, approval_ticket_id: &str) -> TicketView {
        match &self.defect_ticket {
            Some((nested_id, fields)) => TicketView {
                ticket_id: nested_id
                    .clone()
                    .unwrap_or_else(|| approval_ticket_id.to_string()),
                ..fields.clone()
            },
            None => TicketView {
                ticket_id: self
                    .ticket_id
                    .clone()
                    .unwrap_or_else(|| approval_ticket_id.to_string()),
                ..self.root.clone()
            },
        }
    }
}

/// Outcome of reading a context blob.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextBlob {
    Recognized(TicketContext),
    /// Missing, not JSON, or not a JSON object.
    Fallback,
}

impl ContextBlob {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.and_then(parse_object) {
            Some(obj) => Self::Recognized(TicketContext::from_object(&obj)),
            None => Self::Fallback,
        }
    }

    pub fn into_context(self) -> TicketContext {
        match self {
            Self::Recognized(context) => context,
            Self::Fallback => TicketContext::unknown(),
        }
    }
}

/// Outcome of reading an AI recommendation blob.
#[derive(Debug, Clone, PartialEq)]
pub enum RecommendationBlob {
    Recognized(Classification),
    /// Missing, empty, not JSON, or not a JSON object.
    Absent,
}

impl RecommendationBlob {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.and_then(parse_object) {
            Some(obj) => Self::Recognized(Classification::from_object(&obj)),
            None => Self::Absent,
        }
    }

    pub fn into_classification(self) -> Option<Classification> {
        match self {
            Self::Recognized(classification) => Some(classification),
            Self::Absent => None,
        }
    }
}

/// Display-ready approval card.
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovalView {
    pub approval_id: String,
    pub ticket_id: String,
    pub gate: ApprovalGate,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub ticket: TicketView,
    /// Context classification if present, else the AI recommendation.
    pub classification: Option<Classification>,
}

impl ApprovalView {
    /// Reconcile an approval into its card. Never fails.
    pub fn reconcile(approval: &ApprovalRequest) -> Self {
        let context = ContextBlob::parse(approval.context.as_deref()).into_context();
        let recommendation = RecommendationBlob::parse(approval.ai_recommendation.as_deref());

        let ticket = context.ticket(&approval.ticket_id);
        let classification = match context.classification {
            Some(classification) => Some(classification),
            None => recommendation.into_classification(),
        };

        Self {
            approval_id: approval.approval_id.clone(),
            ticket_id: approval.ticket_id.clone(),
            gate: approval.gate,
            created_at: approval.created_at,
            expires_at: approval.expires_at,
            ticket,
            classification,
        }
    }

    pub fn urgency(&self) -> Urgency {
        Urgency::from_severity(
            self.classification
                .as_ref()
                .and_then(|c| c.severity.as_deref()),
        )
    }
}

// ── Lenient field access ──

fn parse_object(raw: &str) -> Option<Map<String, Value>> {
    if raw.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(obj)) => Some(obj),
        _ => None,
    }
}

/// Non-empty string field. Numbers are accepted and rendered as text.
fn text(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numeric field; numeric strings are accepted.
fn number(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    match obj.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn integer(obj: &Map<String, Value>, key: &str) -> Option<i64> {
    match obj.get(key)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::ApprovalStatus;

    fn approval(context: Option<&str>, recommendation: Option<&str>) -> ApprovalRequest {
        ApprovalRequest {
            approval_id: "a1".into(),
            ticket_id: "T-100".into(),
            gate: ApprovalGate::ClassificationReview,
            status: ApprovalStatus::Pending,
            context: context.map(str::to_string),
            ai_recommendation: recommendation.map(str::to_string),
            created_at: "2026-10-16T08:00:00Z".parse().unwrap(),
            expires_at: "2026-10-17T08:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn malformed_context_falls_back_to_unknown() {
        for raw in ["", "{", "not json", "[1,2,3]", "42", "null", "\"text\""] {
            let view = ApprovalView::reconcile(&approval(Some(raw), None));
            assert_eq!(view.ticket.ticket_id, UNKNOWN_TICKET_ID, "input: {raw:?}");
            assert_eq!(view.ticket.title, None);
            assert_eq!(view.classification, None);
        }
    }

    #[test]
    fn missing_context_falls_back_to_unknown() {
        let view = ApprovalView::reconcile(&approval(None, None));
        assert_eq!(view.ticket.ticket_id, UNKNOWN_TICKET_ID);
        assert_eq!(ContextBlob::parse(None), ContextBlob::Fallback);
    }

    #[test]
    fn defect_ticket_takes_precedence_over_root_fields() {
        let context = r#"{
            "ticketId": "ROOT-1",
            "title": "root title",
            "reporter": "root@example.com",
            "defectTicket": {
                "ticketId": "DT-7",
                "title": "Login fails",
                "description": "500 on submit",
                "status": "CLASSIFIED",
                "sourceReference": "JIRA-42"
            }
        }"#;
        let view = ApprovalView::reconcile(&approval(Some(context), None));
        assert_eq!(
            view.ticket,
            TicketView {
                ticket_id: "DT-7".into(),
                title: Some("Login fails".into()),
                description: Some("500 on submit".into()),
                reporter: None,
                created_at: None,
                status: Some("CLASSIFIED".into()),
                source_reference: Some("JIRA-42".into()),
            }
        );
    }

    #[test]
    fn root_fields_used_without_defect_ticket() {
        let context = r#"{"title": "Crash on save", "reporter": "kim@example.com"}"#;
        let view = ApprovalView::reconcile(&approval(Some(context), None));
        assert_eq!(view.ticket.ticket_id, "T-100");
        assert_eq!(view.ticket.title.as_deref(), Some("Crash on save"));
        assert_eq!(view.ticket.reporter.as_deref(), Some("kim@example.com"));

        let context = r#"{"ticketId": "CTX-9"}"#;
        let view = ApprovalView::reconcile(&approval(Some(context), None));
        assert_eq!(view.ticket.ticket_id, "CTX-9");
    }

    #[test]
    fn context_classification_wins_without_merging() {
        let context = r#"{"classification": {"category": "UI", "severity": "LOW"}}"#;
        let recommendation = r#"{"category": "Backend", "subcategory": "DB", "severity": "CRITICAL", "confidenceScore": 0.9}"#;
        let view = ApprovalView::reconcile(&approval(Some(context), Some(recommendation)));
        let classification = view.classification.unwrap();
        assert_eq!(classification.category.as_deref(), Some("UI"));
        assert_eq!(classification.subcategory, None);
        assert_eq!(classification.confidence_score, None);
        assert_eq!(classification.urgency(), Urgency::Low);
    }

    #[test]
    fn recommendation_used_when_context_has_no_classification() {
        let recommendation = r#"{
            "category": "Backend",
            "severity": "HIGH",
            "priority": 1,
            "confidenceScore": 0.873,
            "reasoning": "stack trace points at the DAO layer",
            "classificationSource": "LLM"
        }"#;
        let view = ApprovalView::reconcile(&approval(Some("{}"), Some(recommendation)));
        let classification = view.classification.as_ref().unwrap();
        assert_eq!(classification.priority, Some(1));
        assert_eq!(classification.classification_source.as_deref(), Some("LLM"));
        assert!((classification.confidence_percent().unwrap() - 87.3).abs() < 1e-9);
        assert_eq!(view.urgency(), Urgency::High);
    }

    #[test]
    fn unreadable_recommendation_is_absent() {
        for raw in [None, Some(""), Some("   "), Some("{oops"), Some("\"just text\"")] {
            assert_eq!(RecommendationBlob::parse(raw), RecommendationBlob::Absent);
            let view = ApprovalView::reconcile(&approval(Some("{}"), raw));
            assert_eq!(view.classification, None);
        }
    }

    #[test]
    fn wrong_typed_fields_are_dropped() {
        let context = r#"{
            "ticketId": 123,
            "title": ["not", "a", "string"],
            "classification": {"priority": "2", "confidenceScore": "0.5", "severity": true}
        }"#;
        let view = ApprovalView::reconcile(&approval(Some(context), None));
        assert_eq!(view.ticket.ticket_id, "123");
        assert_eq!(view.ticket.title, None);
        let classification = view.classification.unwrap();
        assert_eq!(classification.priority, Some(2));
        assert_eq!(classification.confidence_score, Some(0.5));
        assert_eq!(classification.severity, None);
    }

    #[test]
    fn non_object_classification_defers_to_recommendation() {
        let context = r#"{"classification": null}"#;
        let recommendation = r#"{"category": "Infra"}"#;
        let view = ApprovalView::reconcile(&approval(Some(context), Some(recommendation)));
        assert_eq!(
            view.classification.and_then(|c| c.category).as_deref(),
            Some("Infra")
        );
    }

    #[test]
    fn severity_mapping_is_total() {
        assert_eq!(Urgency::from_severity(Some("CRITICAL")), Urgency::High);
        assert_eq!(Urgency::from_severity(Some("HIGH")), Urgency::High);
        assert_eq!(Urgency::from_severity(Some("MEDIUM")), Urgency::Neutral);
        assert_eq!(Urgency::from_severity(Some("LOW")), Urgency::Low);
        assert_eq!(Urgency::from_severity(Some("TRIVIAL")), Urgency::Low);
        assert_eq!(Urgency::from_severity(Some("high")), Urgency::Low);
        assert_eq!(Urgency::from_severity(Some("SEV1")), Urgency::Low);
        assert_eq!(Urgency::from_severity(None), Urgency::Low);
    }

    #[test]
    fn reconcile_is_idempotent() {
        let input = approval(
            Some(r#"{"ticketId": "T-1", "classification": {"severity": "MEDIUM", "confidenceScore": 0.42}}"#),
            Some(r#"{"category": "ignored"}"#),
        );
        assert_eq!(ApprovalView::reconcile(&input), ApprovalView::reconcile(&input));
    }
}
