//! Client-side checks run before a decision is submitted.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// One `@`, no whitespace, and at least one `.` after the `@`.
static EMAIL_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailError {
    #[error("Email is required")]
    Missing,
    #[error("Please enter a valid email address")]
    Malformed,
}

/// Validate a reviewer email address.
pub fn validate_email(email: &str) -> Result<(), EmailError> {
    if email.is_empty() {
        return Err(EmailError::Missing);
    }
    if !EMAIL_SHAPE.is_match(email) {
        return Err(EmailError::Malformed);
    }
    Ok(())
}

/// Comment text as sent: an empty field becomes absent, never `""`.
/// Anything else, whitespace included, goes out as typed.
pub fn normalize_comment(comment: &str) -> Option<String> {
    (!comment.is_empty()).then(|| comment.to_string())
}
