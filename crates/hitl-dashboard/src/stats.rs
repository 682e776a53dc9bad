//! Ticket statistics over a trailing window of days.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::NaiveDate;
use futures::FutureExt;
use hitl_core::{Gateway, GatewayError, TicketStats, WindowDays};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::invalidate::{InvalidationBus, QueryKey};
use crate::schedule::{PollTask, STATS_INTERVAL};
use crate::state::{Epoch, ViewState};

#[derive(Debug, Clone, PartialEq)]
pub enum StatsState {
    Loading,
    Error(GatewayError),
    Loaded(TicketStats),
}

impl StatsState {
    pub fn from_outcome(outcome: Result<TicketStats, GatewayError>) -> Self {
        match outcome {
            Ok(stats) => Self::Loaded(stats),
            Err(err) => Self::Error(err),
        }
    }
}

/// One bar group of the daily chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRow {
    pub date: NaiveDate,
    pub total: u64,
    pub automated: u64,
    pub manual: u64,
}

pub fn chart_rows(stats: &TicketStats) -> Vec<ChartRow> {
    stats
        .daily_stats
        .iter()
        .map(|day| ChartRow {
            date: day.date,
            total: day.total_tickets,
            automated: day.auto_processed,
            manual: day.manual_review,
        })
        .collect()
}

/// Automated share as shown in the summary, e.g. `83.3%`.
pub fn automated_share(stats: &TicketStats) -> String {
    format!("{:.1}%", stats.summary.auto_processed_percentage)
}

struct Window {
    days: WindowDays,
    poll: PollTask,
}

pub struct StatsView {
    gateway: Arc<dyn Gateway>,
    bus: InvalidationBus,
    state: Arc<ViewState<StatsState>>,
    interval: Duration,
    window: Mutex<Option<Window>>,
}

impl StatsView {
    pub fn mount(gateway: Arc<dyn Gateway>, bus: &InvalidationBus, days: WindowDays) -> Self {
        Self::mount_with_interval(gateway, bus, days, STATS_INTERVAL)
    }

    pub fn mount_with_interval(
        gateway: Arc<dyn Gateway>,
        bus: &InvalidationBus,
        days: WindowDays,
        interval: Duration,
    ) -> Self {
        let (state, epoch) = ViewState::new(StatsState::Loading);
        let view = Self {
            gateway,
            bus: bus.clone(),
            state: Arc::new(state),
            interval,
            window: Mutex::new(None),
        };
        let poll = view.spawn_poll(days, epoch);
        *view.lock() = Some(Window { days, poll });
        view
    }

    pub fn window(&self) -> WindowDays {
        self.lock()
            .as_ref()
            .map_or(WindowDays::DEFAULT, |window| window.days)
    }

    pub fn state(&self) -> StatsState {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<StatsState> {
        self.state.subscribe()
    }

    /// Change the window and fetch for it. Returns whether it changed.
    pub fn set_window(&self, days: WindowDays) -> bool {
        let mut window = self.lock();
        if window.as_ref().is_some_and(|current| current.days == days) {
            return false;
        }
        // Stop the old loop before its epoch is retired.
        *window = None;
        let Some(epoch) = self.state.begin(StatsState::Loading) else {
            return false;
        };
        let poll = self.spawn_poll(days, epoch);
        *window = Some(Window { days, poll });
        true
    }

    pub fn refresh(&self) {
        if let Some(window) = self.lock().as_ref() {
            window.poll.refresh();
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Window>> {
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn spawn_poll(&self, days: WindowDays, epoch: Epoch) -> PollTask {
        let gateway = self.gateway.clone();
        let cell = self.state.clone();
        let poll = PollTask::spawn("ticket-stats", self.interval, move || {
            let gateway = gateway.clone();
            let cell = cell.clone();
            async move {
                let outcome = gateway.ticket_stats(days).await;
                match &outcome {
                    Ok(stats) => debug!(
                        days = days.get(),
                        total = stats.summary.total_tickets,
                        "ticket stats refreshed"
                    ),
                    Err(err) => warn!(days = days.get(), error = %err, "failed to load ticket stats"),
                }
                let next = StatsState::from_outcome(outcome);
                cell.publish(epoch, next);
            }
            .boxed()
        });
        self.bus.subscribe(QueryKey::TicketStats, poll.trigger());
        poll
    }
}

impl Drop for StatsView {
    fn drop(&mut self) {
        self.state.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hitl_core::{DailyStats, StatsSummary};

    #[test]
    fn chart_rows_follow_daily_stats() {
        let stats = TicketStats {
            daily_stats: vec![DailyStats {
                date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                total_tickets: 12,
                auto_processed: 10,
                manual_review: 2,
            }],
            summary: StatsSummary {
                total_tickets: 12,
                auto_processed: 10,
                manual_review: 2,
                auto_processed_percentage: 83.333,
            },
        };
        let rows = chart_rows(&stats);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].automated, 10);
        assert_eq!(rows[0].manual, 2);
        assert_eq!(automated_share(&stats), "83.3%");
    }
}
