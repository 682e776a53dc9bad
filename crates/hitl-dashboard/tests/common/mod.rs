#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use hitl_core::{
    ApprovalGate, ApprovalRequest, ApprovalStatus, BatchProgress, DailyStats, DecisionInput,
    ErrorResponse, Gateway, GatewayError, StatsSummary, TicketStats, WindowDays,
};

/// Scripted responses for one operation. The last response repeats.
struct Script<T> {
    responses: VecDeque<Result<T, GatewayError>>,
}

impl<T: Clone> Script<T> {
    fn new(first: Result<T, GatewayError>) -> Self {
        Self {
            responses: VecDeque::from([first]),
        }
    }

    fn next(&mut self) -> Result<T, GatewayError> {
        if self.responses.len() > 1 {
            self.responses.pop_front().unwrap()
        } else {
            self.responses.front().cloned().unwrap()
        }
    }
}

pub struct FakeGateway {
    pending: Mutex<Script<Vec<ApprovalRequest>>>,
    decide: Mutex<Script<()>>,
    batches: Mutex<BTreeMap<String, Script<BatchProgress>>>,
    stats: Mutex<Script<TicketStats>>,
    latency: Mutex<Duration>,
    pub pending_calls: AtomicUsize,
    pub batch_calls: AtomicUsize,
    pub stats_calls: AtomicUsize,
    pub decisions: Mutex<Vec<DecisionInput>>,
    pub stats_windows: Mutex<Vec<u32>>,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            pending: Mutex::new(Script::new(Ok(vec![]))),
            decide: Mutex::new(Script::new(Ok(()))),
            batches: Mutex::new(BTreeMap::new()),
            stats: Mutex::new(Script::new(Ok(stats_fixture(0)))),
            latency: Mutex::new(Duration::ZERO),
            pending_calls: AtomicUsize::new(0),
            batch_calls: AtomicUsize::new(0),
            stats_calls: AtomicUsize::new(0),
            decisions: Mutex::new(vec![]),
            stats_windows: Mutex::new(vec![]),
        })
    }

    /// Replace the pending-approvals script with `responses`, served in order.
    pub fn script_pending(&self, responses: Vec<Result<Vec<ApprovalRequest>, GatewayError>>) {
        self.pending.lock().unwrap().responses = responses.into();
    }

    pub fn script_decide(&self, response: Result<(), GatewayError>) {
        self.decide.lock().unwrap().responses = VecDeque::from([response]);
    }

    pub fn script_batch(&self, batch_id: &str, response: Result<BatchProgress, GatewayError>) {
        self.batches
            .lock()
            .unwrap()
            .insert(batch_id.to_string(), Script::new(response));
    }

    pub fn script_stats(&self, responses: Vec<Result<TicketStats, GatewayError>>) {
        self.stats.lock().unwrap().responses = responses.into();
    }

    /// Delay every response by `latency` of (virtual) time.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn pending_calls(&self) -> usize {
        self.pending_calls.load(Ordering::SeqCst)
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn stats_calls(&self) -> usize {
        self.stats_calls.load(Ordering::SeqCst)
    }

    async fn wait(&self) {
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn list_pending_approvals(&self) -> Result<Vec<ApprovalRequest>, GatewayError> {
        self.pending_calls.fetch_add(1, Ordering::SeqCst);
        let response = self.pending.lock().unwrap().next();
        self.wait().await;
        response
    }

    async fn submit_decision(&self, decision: &DecisionInput) -> Result<(), GatewayError> {
        self.decisions.lock().unwrap().push(decision.clone());
        let response = self.decide.lock().unwrap().next();
        self.wait().await;
        response
    }

    async fn batch_progress(&self, batch_id: &str) -> Result<BatchProgress, GatewayError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        let response = match self.batches.lock().unwrap().get_mut(batch_id) {
            Some(script) => script.next(),
            None => Err(api_error(404, "Not Found", "Batch not found")),
        };
        self.wait().await;
        response
    }

    async fn ticket_stats(&self, days: WindowDays) -> Result<TicketStats, GatewayError> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        self.stats_windows.lock().unwrap().push(days.get());
        let response = self.stats.lock().unwrap().next();
        self.wait().await;
        response
    }
}

pub fn api_error(status: u16, error: &str, message: &str) -> GatewayError {
    GatewayError::Api(ErrorResponse::now(status, error, message))
}

pub fn approval(id: &str) -> ApprovalRequest {
    ApprovalRequest {
        approval_id: id.to_string(),
        ticket_id: format!("T-{id}"),
        gate: ApprovalGate::ClassificationReview,
        status: ApprovalStatus::Pending,
        context: Some(format!(r#"{{"ticketId":"T-{id}","title":"Login fails"}}"#)),
        ai_recommendation: None,
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        expires_at: Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap(),
    }
}

pub fn progress(batch_id: &str, processed: u64, total: u64) -> BatchProgress {
    BatchProgress {
        batch_id: batch_id.to_string(),
        total_tickets: total,
        processed_tickets: processed,
        pending_tickets: total - processed,
        status_breakdown: BTreeMap::from([("RESOLVED".to_string(), processed)]),
        progress_percentage: if total == 0 {
            0.0
        } else {
            (processed * 100 / total) as f64
        },
    }
}

pub fn stats_fixture(total: u64) -> TicketStats {
    TicketStats {
        daily_stats: vec![DailyStats {
            date: chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            total_tickets: total,
            auto_processed: total,
            manual_review: 0,
        }],
        summary: StatsSummary {
            total_tickets: total,
            auto_processed: total,
            manual_review: 0,
            auto_processed_percentage: if total == 0 { 0.0 } else { 100.0 },
        },
    }
}

/// Let spawned tasks run without moving past any poll deadline that matters.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}
