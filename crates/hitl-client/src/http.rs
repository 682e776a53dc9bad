//! reqwest-backed [`Gateway`] for the HITL backend's REST API.

use async_trait::async_trait;
use hitl_core::{
    ApprovalRequest, BatchProgress, DecisionInput, ErrorResponse, Gateway, GatewayError,
    TicketStats, WindowDays,
};
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::config::ClientConfig;

/// HTTP client for the approval and batch endpoints.
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpGateway {
    /// Create a gateway for the configured base URL.
    ///
    /// Every request is bounded by `config.timeout`; there are no retries.
    pub fn new(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url().clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL with `segments` appended, each percent-encoded as one segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // http(s) URLs always have a path to extend.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, GatewayError> {
        let resp = self.client.get(url).send().await.map_err(transport_error)?;
        let resp = check_status(resp).await?;
        decode_json(resp).await
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn list_pending_approvals(&self) -> Result<Vec<ApprovalRequest>, GatewayError> {
        let url = self.endpoint(&["approvals", "pending"]);
        info!(url = %url, "fetching pending approvals");
        let approvals: Vec<ApprovalRequest> = self.get_json(url).await?;
        info!(count = approvals.len(), "fetched pending approvals");
        Ok(approvals)
    }

    async fn submit_decision(&self, decision: &DecisionInput) -> Result<(), GatewayError> {
        let url = self.endpoint(&["approvals", "decide"]);
        info!(
            url = %url,
            approval_id = %decision.approval_id,
            approved = decision.approved,
            "submitting decision"
        );
        let resp = self
            .client
            .post(url)
            .json(decision)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(resp).await?;
        info!(approval_id = %decision.approval_id, "decision accepted");
        Ok(())
    }

    async fn batch_progress(&self, batch_id: &str) -> Result<BatchProgress, GatewayError> {
        let url = self.endpoint(&["batches", batch_id, "progress"]);
        info!(url = %url, "fetching batch progress");
        self.get_json(url).await
    }

    async fn ticket_stats(&self, window: WindowDays) -> Result<TicketStats, GatewayError> {
        let mut url = self.endpoint(&["batches", "stats"]);
        url.query_pairs_mut()
            .append_pair("days", &window.to_string());
        info!(url = %url, "fetching ticket statistics");
        self.get_json(url).await
    }
}

// ── Error normalization ──

/// No response reached us: refused, reset, timed out.
fn transport_error(err: reqwest::Error) -> GatewayError {
    let message = if err.is_timeout() {
        "request timed out".to_string()
    } else {
        err.to_string()
    };
    warn!(error = %err, "request failed without a response");
    GatewayError::network(message)
}

/// Pass 2xx through; fold anything else into an `Api` error.
async fn check_status(resp: Response) -> Result<Response, GatewayError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let error = error_from_body(status, &body);
    warn!(status = status.as_u16(), message = %error.message, "server returned an error");
    Err(GatewayError::Api(error))
}

/// The backend's structured error body if it sent one, else a synthesized one.
fn error_from_body(status: StatusCode, body: &str) -> ErrorResponse {
    if let Ok(parsed) = serde_json::from_str::<ErrorResponse>(body) {
        return parsed;
    }
    let reason = status.canonical_reason().unwrap_or("Http Error");
    let message = match body.trim() {
        "" => format!("Request failed with status code {}", status.as_u16()),
        text => text.to_string(),
    };
    ErrorResponse::now(status.as_u16(), reason, message)
}

async fn decode_json<T: DeserializeOwned>(resp: Response) -> Result<T, GatewayError> {
    let status = resp.status();
    let body = resp.text().await.map_err(transport_error)?;
    serde_json::from_str(&body).map_err(|err| {
        warn!(error = %err, "response body did not match the expected shape");
        GatewayError::Api(ErrorResponse::now(
            status.as_u16(),
            "Malformed Response",
            err.to_string(),
        ))
    })
}
