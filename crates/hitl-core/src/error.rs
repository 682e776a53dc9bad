use std::collections::BTreeMap;
use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status reported for failures where no response came back.
pub const NETWORK_ERROR_STATUS: u16 = 500;
pub const NETWORK_ERROR_LABEL: &str = "Network Error";

/// The backend's error body, and the single shape every failure is folded into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// ISO 8601 timestamp string.
    pub timestamp: String,
    pub status: u16,
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<BTreeMap<String, String>>,
}

impl ErrorResponse {
    /// Build an error stamped with the current time.
    pub fn now(status: u16, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            status,
            error: error.into(),
            message: message.into(),
            validation_errors: None,
        }
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.status, self.error, self.message)
    }
}

/// Failure of a gateway call.
///
/// `Network` means the request never produced a response; `Api` means the
/// server answered with a non-success status (or an unreadable body).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(ErrorResponse),
    #[error("server returned {0}")]
    Api(ErrorResponse),
}

impl GatewayError {
    /// Transport failure with no response.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(ErrorResponse::now(
            NETWORK_ERROR_STATUS,
            NETWORK_ERROR_LABEL,
            message,
        ))
    }

    pub fn response(&self) -> &ErrorResponse {
        match self {
            Self::Network(body) | Self::Api(body) => body,
        }
    }

    pub fn status(&self) -> u16 {
        self.response().status
    }

    pub fn message(&self) -> &str {
        &self.response().message
    }

    /// Field-level validation messages, if the server sent any.
    pub fn validation_errors(&self) -> Option<&BTreeMap<String, String>> {
        self.response().validation_errors.as_ref()
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// The server answered 404 for the requested resource.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api(body) if body.status == 404)
    }
}
