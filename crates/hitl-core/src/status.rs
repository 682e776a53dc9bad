//! Presentation of batch status labels.

use crate::dto::TicketStatus;

/// How a status breakdown row is emphasized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusTone {
    Critical,
    Done,
    Waiting,
    Neutral,
}

impl StatusTone {
    pub fn of(label: &str) -> Self {
        match TicketStatus::parse(label) {
            Some(status) => Self::of_ticket(status),
            None => Self::of_unknown(label),
        }
    }

    fn of_ticket(status: TicketStatus) -> Self {
        use TicketStatus::*;
        match status {
            ClassificationRejected | Archived => Self::Critical,
            ClassificationApproved | Closed | Resolved => Self::Done,
            PendingClassificationApproval | PendingFinalApproval | InProgress => Self::Waiting,
            New | Validated | Classified | Assigned => Self::Neutral,
        }
    }

    /// Labels outside the ticket lifecycle (approval states, new backend
    /// states) are toned by keyword.
    fn of_unknown(label: &str) -> Self {
        if label.contains("REJECTED") || label.contains("ARCHIVED") {
            Self::Critical
        } else if ["APPROVED", "CLOSED", "RESOLVED"]
            .iter()
            .any(|k| label.contains(k))
        {
            Self::Done
        } else if label.contains("PENDING") || label.contains("IN_PROGRESS") {
            Self::Waiting
        } else {
            Self::Neutral
        }
    }
}

/// `PENDING_FINAL_APPROVAL` → `Pending Final Approval`.
pub fn humanize_status(label: &str) -> String {
    label
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
