//! Approve/reject dialog and the submission that follows it.
//!
//! Page state ([`ApprovalsPage`]) is a plain value updated by
//! [`ApprovalsPage::reduce`]. Submission is split into three steps so a UI
//! loop can render the in-flight state: [`ApprovalsPage::begin_submit`],
//! [`DecisionFlow::send`], and [`DecisionFlow::finish`].
//! [`DecisionFlow::submit`] runs all three.

use std::sync::Arc;

use hitl_core::validate::normalize_comment;
use hitl_core::{DecisionInput, EmailError, Gateway, GatewayError, validate_email};
use thiserror::Error;
use tracing::{info, warn};

use crate::invalidate::{InvalidationBus, QueryKey};
use crate::notify::{Notification, Notifier};

pub const SUBMITTED_MESSAGE: &str = "Decision submitted successfully";
pub const FAILED_MESSAGE: &str = "Failed to submit decision";
pub const REASON_HINT: &str = "Please provide a reason for the rejection";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Approve,
    Reject,
}

impl Verdict {
    pub fn approved(&self) -> bool {
        matches!(self, Self::Approve)
    }
}

/// Why a submission did not go out.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormError {
    #[error(transparent)]
    Email(#[from] EmailError),
    #[error("a decision is already being submitted")]
    InFlight,
    #[error("no decision dialog is open")]
    NoDialog,
}

/// Open decision dialog for one approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionForm {
    approval_id: String,
    verdict: Verdict,
    email: String,
    comments: String,
    email_error: Option<EmailError>,
    submitting: bool,
}

impl DecisionForm {
    pub fn open(approval_id: impl Into<String>, verdict: Verdict) -> Self {
        Self {
            approval_id: approval_id.into(),
            verdict,
            email: String::new(),
            comments: String::new(),
            email_error: None,
            submitting: false,
        }
    }

    pub fn approval_id(&self) -> &str {
        &self.approval_id
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn comments(&self) -> &str {
        &self.comments
    }

    pub fn email_error(&self) -> Option<EmailError> {
        self.email_error
    }

    /// Guidance shown under the comment field of a rejection left blank.
    /// Submission is not blocked by it.
    pub fn comment_hint(&self) -> Option<&'static str> {
        (self.verdict == Verdict::Reject && self.comments.trim().is_empty()).then_some(REASON_HINT)
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Whether the confirm control is enabled.
    pub fn can_submit(&self) -> bool {
        !self.submitting && !self.email.is_empty()
    }

    fn edit_email(&mut self, email: String) {
        self.email = email;
        self.email_error = None;
    }

    fn blur_email(&mut self) {
        self.email_error = validate_email(&self.email).err();
    }

    fn edit_comments(&mut self, comments: String) {
        self.comments = comments;
    }

    /// Validate and mark in flight, yielding the payload to send.
    fn begin_submit(&mut self) -> Result<DecisionInput, FormError> {
        if self.submitting {
            return Err(FormError::InFlight);
        }
        if let Err(err) = validate_email(&self.email) {
            self.email_error = Some(err);
            return Err(err.into());
        }
        self.submitting = true;
        Ok(DecisionInput {
            approval_id: self.approval_id.clone(),
            approved: self.verdict.approved(),
            reviewer_email: self.email.clone(),
            comments: normalize_comment(&self.comments),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAction {
    Approve(String),
    Reject(String),
    Close,
    EditEmail(String),
    BlurEmail,
    EditComments(String),
}

/// UI state of the approvals page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApprovalsPage {
    pub dialog: Option<DecisionForm>,
}

impl ApprovalsPage {
    pub fn reduce(mut self, action: PageAction) -> Self {
        let in_flight = self.dialog.as_ref().is_some_and(DecisionForm::is_submitting);
        match action {
            PageAction::Approve(_) | PageAction::Reject(_) | PageAction::Close if in_flight => {}
            PageAction::Approve(id) => self.dialog = Some(DecisionForm::open(id, Verdict::Approve)),
            PageAction::Reject(id) => self.dialog = Some(DecisionForm::open(id, Verdict::Reject)),
            PageAction::Close => self.dialog = None,
            PageAction::EditEmail(email) => {
                if let Some(form) = self.dialog.as_mut() {
                    form.edit_email(email);
                }
            }
            PageAction::BlurEmail => {
                if let Some(form) = self.dialog.as_mut() {
                    form.blur_email();
                }
            }
            PageAction::EditComments(comments) => {
                if let Some(form) = self.dialog.as_mut() {
                    form.edit_comments(comments);
                }
            }
        }
        self
    }

    /// Validate the open dialog and mark it in flight.
    pub fn begin_submit(&mut self) -> Result<DecisionInput, FormError> {
        self.dialog
            .as_mut()
            .ok_or(FormError::NoDialog)?
            .begin_submit()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted,
    /// Client-side validation stopped the request; nothing was sent.
    Blocked(FormError),
    Failed(GatewayError),
}

/// Sends decisions and applies their outcome to the page.
pub struct DecisionFlow {
    gateway: Arc<dyn Gateway>,
    bus: InvalidationBus,
    notifier: Arc<dyn Notifier>,
}

impl DecisionFlow {
    pub fn new(gateway: Arc<dyn Gateway>, bus: InvalidationBus, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            gateway,
            bus,
            notifier,
        }
    }

    /// Validate, send, and apply the result in one go.
    pub async fn submit(&self, page: &mut ApprovalsPage) -> SubmitOutcome {
        let decision = match page.begin_submit() {
            Ok(decision) => decision,
            Err(err) => return SubmitOutcome::Blocked(err),
        };
        let result = self.send(&decision).await;
        self.finish(page, result)
    }

    pub async fn send(&self, decision: &DecisionInput) -> Result<(), GatewayError> {
        self.gateway.submit_decision(decision).await
    }

    /// Apply a send result.
    ///
    /// On success the dialog is cleared and closed and the success
    /// notification raised before the pending list is invalidated. On
    /// failure the dialog stays open with its values.
    pub fn finish(&self, page: &mut ApprovalsPage, result: Result<(), GatewayError>) -> SubmitOutcome {
        match result {
            Ok(()) => {
                let approval_id = page.dialog.take().map(|form| form.approval_id);
                info!(approval_id = ?approval_id, "decision submitted");
                self.notifier.notify(Notification::success(SUBMITTED_MESSAGE));
                self.bus.invalidate(QueryKey::PendingApprovals);
                self.bus.invalidate(QueryKey::TicketStats);
                SubmitOutcome::Submitted
            }
            Err(err) => {
                if let Some(form) = page.dialog.as_mut() {
                    form.submitting = false;
                }
                warn!(error = %err, "decision submission failed");
                let message = match err.message() {
                    "" => FAILED_MESSAGE,
                    message => message,
                };
                self.notifier.notify(Notification::error(message));
                if let Some(fields) = err.validation_errors() {
                    for (field, message) in fields {
                        self.notifier
                            .notify(Notification::error(format!("{field}: {message}")));
                    }
                }
                SubmitOutcome::Failed(err)
            }
        }
    }
}
