//! Text rendering for the console views.
//!
//! Each view state renders as a card of labelled rows, grouped into sections
//! the way the web dashboard groups its panels.

use chrono::{DateTime, Utc};
use hitl_core::{ApprovalView, BatchProgress, StatusTone, Urgency, WindowDays, humanize_status};
use hitl_dashboard::{
    BatchState, Level, ListState, Notification, Notifier, StatsState, automated_share, chart_rows,
};

const BAR_WIDTH: usize = 30;
const CHART_WIDTH: usize = 40;

// ── Notifications ──

/// Prints notifications as they are raised.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            Level::Success => println!("✔ {}", notification.text),
            Level::Error => eprintln!("✘ {}", notification.text),
        }
    }
}

pub fn clear_screen() {
    print!("\x1B[2J\x1B[H");
}

// ── Views ──

pub fn print_dashboard(pending: &ListState, stats: &StatsState, days: WindowDays) {
    println!("=== HITL Dashboard ===");
    println!("Human-in-the-Loop Defect Ticket Processing");
    println!();

    println!("Pending Approvals");
    match pending {
        ListState::Loading => row("count", "loading..."),
        ListState::Error(err) => row("count", format!("unavailable ({})", err.message())),
        state => {
            let count = state.pending_count().unwrap_or_default();
            row("count", count);
            if count > 0 {
                row("", "Action required: run `hitl approvals`");
            }
        }
    }
    println!();

    println!("Ticket Statistics (last {days} days)");
    match stats {
        StatsState::Loading => row("status", "loading..."),
        StatsState::Error(err) => row("status", format!("unavailable ({})", err.message())),
        StatsState::Loaded(stats) => {
            row("total tickets", stats.summary.total_tickets);
            row("automated", stats.summary.auto_processed);
            row("manual review", stats.summary.manual_review);
            row("automation rate", automated_share(stats));
        }
    }
}

pub fn print_approvals(state: &ListState, now: DateTime<Utc>) {
    match state {
        ListState::Loading => println!("Loading pending approvals..."),
        ListState::Error(err) => {
            println!("Failed to load approvals");
            println!("  {}", err.message());
            println!("  Retrying on the next refresh.");
        }
        ListState::Empty => {
            println!("No pending approvals");
            println!("All approval requests have been processed.");
        }
        ListState::Populated(_) => {
            let views = state.views();
            println!("Pending Approvals ({})", views.len());
            println!();
            for view in &views {
                print_approval_card(view, now);
                println!();
            }
        }
    }
}

pub fn print_approval_card(view: &ApprovalView, now: DateTime<Utc>) {
    println!(
        "=== Ticket: {} [{}]{} ===",
        view.ticket_id,
        view.gate.label(),
        urgency_marker(view.urgency())
    );
    println!("expires {}", relative_time(view.expires_at, now));
    println!();

    let ticket = &view.ticket;
    println!("Original Ticket");
    row("Ticket ID", &ticket.ticket_id);
    optional_row("Source Reference", ticket.source_reference.as_deref());
    optional_row("Title", ticket.title.as_deref());
    optional_row("Description", ticket.description.as_deref());
    optional_row("Reporter", ticket.reporter.as_deref());
    optional_row("Status", ticket.status.as_deref());
    if let Some(created) = ticket.created_at.as_deref() {
        let shown = DateTime::parse_from_rfc3339(created)
            .map(|at| relative_time(at.with_timezone(&Utc), now))
            .unwrap_or_else(|_| created.to_string());
        row("Created", shown);
    }
    println!();

    println!("AI Classification");
    match &view.classification {
        None => println!("  No AI classification available"),
        Some(classification) => {
            row("Category", classification.category.as_deref().unwrap_or("N/A"));
            optional_row("Subcategory", classification.subcategory.as_deref());
            row("Severity", classification.severity.as_deref().unwrap_or("N/A"));
            if let Some(priority) = classification.priority {
                row("Priority", format!("P{priority}"));
            }
            if let Some(percent) = classification.confidence_percent() {
                row(
                    "Confidence",
                    format!("{} {percent:.1}%", bar(percent, 100.0, BAR_WIDTH)),
                );
            }
            optional_row("Source", classification.classification_source.as_deref());
            if let Some(reasoning) = classification.reasoning.as_deref() {
                println!("  AI Reasoning");
                println!("    \"{reasoning}\"");
            }
        }
    }
    println!();
    println!("Approval created {}", relative_time(view.created_at, now));
    println!(
        "  hitl approve {id} --email <you>   |   hitl reject {id} --email <you> --comment <reason>",
        id = view.approval_id
    );
}

pub fn print_batch(state: &BatchState) {
    match state {
        BatchState::Prompt => {
            println!("Batch Progress");
            println!("Enter a batch id to view its progress: hitl batch <batch-id>");
        }
        BatchState::Loading => println!("Loading batch progress..."),
        BatchState::NotFound { batch_id } => {
            println!("Batch not found");
            println!("No batch with id `{batch_id}` exists.");
        }
        BatchState::Error(err) => {
            println!("Failed to load batch progress");
            println!("  {}", err.message());
        }
        BatchState::Ready(progress) => print_progress(progress),
    }
}

fn print_progress(progress: &BatchProgress) {
    println!("=== Batch: {} ===", progress.batch_id);
    println!();
    println!("Batch Progress");
    row(
        "Progress",
        format!(
            "{} {:.1}%",
            bar(progress.progress_percentage, 100.0, BAR_WIDTH),
            progress.progress_percentage
        ),
    );
    row("Total Tickets", progress.total_tickets);
    row("Processed", progress.processed_tickets);
    row("Pending", progress.pending_tickets);

    let breakdown = progress.breakdown_by_count();
    if breakdown.is_empty() {
        return;
    }
    println!();
    println!("Status Breakdown");
    for (label, count) in breakdown {
        row(
            format!("{} {}", tone_marker(StatusTone::of(label)), humanize_status(label)),
            count,
        );
    }
}

pub fn print_stats(state: &StatsState, days: WindowDays) {
    let stats = match state {
        StatsState::Loading => {
            println!("Loading ticket statistics...");
            return;
        }
        StatsState::Error(err) => {
            println!("Failed to load ticket statistics");
            println!("  {}", err.message());
            return;
        }
        StatsState::Loaded(stats) => stats,
    };

    println!("=== Ticket Statistics (last {days} days) ===");
    println!();
    let rows = chart_rows(stats);
    let peak = rows.iter().map(|r| r.total).max().unwrap_or_default();
    println!("  {:<12} {:>6} {:>6} {:>6}", "date", "total", "auto", "manual");
    for r in &rows {
        println!(
            "  {:<12} {:>6} {:>6} {:>6}  {}",
            r.date.format("%b %d").to_string(),
            r.total,
            r.automated,
            r.manual,
            stacked_bar(r.automated, r.manual, peak, CHART_WIDTH)
        );
    }
    println!();
    println!("Summary");
    row("Total Tickets", stats.summary.total_tickets);
    row("Automated", stats.summary.auto_processed);
    row("Manual Review", stats.summary.manual_review);
    row("Automation Rate", automated_share(stats));
}

// ── Formatting ──

fn row(label: impl std::fmt::Display, value: impl std::fmt::Display) {
    println!("  {:<26} {}", label.to_string(), value);
}

fn optional_row(label: &str, value: Option<&str>) {
    if let Some(value) = value {
        row(label, value);
    }
}

fn urgency_marker(urgency: Urgency) -> &'static str {
    match urgency {
        Urgency::High => " !!",
        Urgency::Neutral => " !",
        Urgency::Low => "",
    }
}

fn tone_marker(tone: StatusTone) -> char {
    match tone {
        StatusTone::Critical => '✘',
        StatusTone::Done => '✔',
        StatusTone::Waiting => '…',
        StatusTone::Neutral => '·',
    }
}

/// Fixed-width bar filled in proportion to `value / max`.
fn bar(value: f64, max: f64, width: usize) -> String {
    let ratio = if max > 0.0 {
        (value / max).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (ratio * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// Automated (`#`) then manual (`+`) segments, scaled against `peak`.
fn stacked_bar(automated: u64, manual: u64, peak: u64, width: usize) -> String {
    if peak == 0 {
        return String::new();
    }
    let scale = |n: u64| ((n as f64 / peak as f64) * width as f64).round() as usize;
    let auto = scale(automated).min(width);
    let manual = scale(manual).min(width - auto);
    format!("{}{}", "#".repeat(auto), "+".repeat(manual))
}

/// "in 3 hours", "5 minutes ago", "just now".
fn relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = at.signed_duration_since(now);
    let secs = delta.num_seconds().unsigned_abs();
    let amount = match secs {
        0..45 => return "just now".to_string(),
        45..3_600 => plural(secs.div_ceil(60).max(1), "minute"),
        3_600..86_400 => plural(secs / 3_600, "hour"),
        86_400..2_592_000 => plural(secs / 86_400, "day"),
        _ => plural(secs / 2_592_000, "month"),
    };
    if delta.num_seconds() > 0 {
        format!("in {amount}")
    } else {
        format!("{amount} ago")
    }
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit}")
    } else {
        format!("{n} {unit}s")
    }
}
