//! `hitl` -- terminal console for the human-in-the-loop review gates.
//!
//! Lists pending approval requests, records approve/reject decisions, and
//! shows batch progress and ticket statistics from the HITL backend.
//!
//! # Environment variables
//!
//! | Variable                | Required | Default                        | Description                  |
//! |-------------------------|----------|--------------------------------|------------------------------|
//! | `HITL_API_URL`          | no       | `http://localhost:8060/api/v1` | Backend REST base URL        |
//! | `HITL_API_TIMEOUT_SECS` | no       | `30`                           | Per-request timeout          |
//! | `RUST_LOG`              | no       | `warn,hitl_cli=info`           | Log filter (logs go to stderr) |
//!
//! A `.env` file in the working directory is loaded first.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use hitl_client::{ClientConfig, DEFAULT_API_URL, HttpGateway};
use hitl_core::{Gateway, WindowDays};
use hitl_dashboard::{
    ApprovalListController, ApprovalsPage, BatchMonitor, BatchState, BatchTarget, DecisionFlow,
    InvalidationBus, ListState, PageAction, StatsState, StatsView, SubmitOutcome, Verdict,
};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod display;

#[derive(Parser)]
#[command(name = "hitl", version, about = "Human-in-the-loop review console")]
struct Cli {
    /// Backend REST base URL
    #[arg(long, global = true, env = "HITL_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Per-request timeout in seconds
    #[arg(
        long,
        global = true,
        env = "HITL_API_TIMEOUT_SECS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pending approvals at a glance plus recent ticket statistics
    Dashboard {
        #[arg(long, default_value_t = WindowDays::DEFAULT)]
        days: WindowDays,
    },
    /// List approval requests waiting for a reviewer
    Approvals {
        /// Keep the list on screen, refreshing every 30 s
        #[arg(long)]
        watch: bool,
    },
    /// Approve a pending request
    Approve {
        approval_id: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Reject a pending request (a reason is strongly encouraged)
    Reject {
        approval_id: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Show processing progress for a batch (`new` prompts for an id)
    Batch {
        batch_id: String,
        /// Keep polling every 5 s
        #[arg(long)]
        watch: bool,
    },
    /// Daily ticket statistics
    Stats {
        #[arg(long, default_value_t = WindowDays::DEFAULT)]
        days: WindowDays,
        /// Keep polling every 60 s
        #[arg(long)]
        watch: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,hitl_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::new(&cli.api_url)?
        .with_timeout(Duration::from_secs(cli.timeout_secs));
    tracing::debug!(
        api_url = %config.base_url(),
        timeout_secs = cli.timeout_secs,
        "hitl v{}",
        env!("CARGO_PKG_VERSION")
    );
    let gateway: Arc<dyn Gateway> =
        Arc::new(HttpGateway::new(&config).context("failed to build HTTP client")?);

    match cli.command {
        Command::Dashboard { days } => dashboard(gateway, days).await,
        Command::Approvals { watch } => approvals(gateway, watch).await,
        Command::Approve {
            approval_id,
            email,
            comment,
        } => decide(gateway, Verdict::Approve, approval_id, email, comment).await,
        Command::Reject {
            approval_id,
            email,
            comment,
        } => decide(gateway, Verdict::Reject, approval_id, email, comment).await,
        Command::Batch { batch_id, watch } => batch(gateway, &batch_id, watch).await,
        Command::Stats { days, watch } => stats(gateway, days, watch).await,
    }
}

async fn dashboard(gateway: Arc<dyn Gateway>, days: WindowDays) -> anyhow::Result<()> {
    let (pending, stats) = tokio::join!(
        gateway.list_pending_approvals(),
        gateway.ticket_stats(days)
    );
    display::print_dashboard(
        &ListState::from_outcome(pending),
        &StatsState::from_outcome(stats),
        days,
    );
    Ok(())
}

async fn approvals(gateway: Arc<dyn Gateway>, watch: bool) -> anyhow::Result<()> {
    if watch {
        let bus = InvalidationBus::new();
        let list = ApprovalListController::mount(gateway, &bus);
        watch_view(list.subscribe(), |state| {
            display::print_approvals(state, Utc::now())
        })
        .await;
        return Ok(());
    }

    let pending = gateway
        .list_pending_approvals()
        .await
        .context("failed to load pending approvals")?;
    display::print_approvals(&ListState::from_outcome(Ok(pending)), Utc::now());
    Ok(())
}

async fn decide(
    gateway: Arc<dyn Gateway>,
    verdict: Verdict,
    approval_id: String,
    email: String,
    comment: Option<String>,
) -> anyhow::Result<()> {
    let open = match verdict {
        Verdict::Approve => PageAction::Approve(approval_id),
        Verdict::Reject => PageAction::Reject(approval_id),
    };
    let mut page = [
        open,
        PageAction::EditEmail(email),
        PageAction::EditComments(comment.unwrap_or_default()),
    ]
    .into_iter()
    .fold(ApprovalsPage::default(), ApprovalsPage::reduce);
    if let Some(hint) = page.dialog.as_ref().and_then(|form| form.comment_hint()) {
        eprintln!("note: {hint}");
    }

    let flow = DecisionFlow::new(
        gateway,
        InvalidationBus::new(),
        Arc::new(display::ConsoleNotifier),
    );
    match flow.submit(&mut page).await {
        SubmitOutcome::Submitted => Ok(()),
        SubmitOutcome::Blocked(err) => bail!("{err}"),
        SubmitOutcome::Failed(err) => {
            Err(anyhow::Error::new(err).context("decision was not recorded"))
        }
    }
}

async fn batch(gateway: Arc<dyn Gateway>, route: &str, watch: bool) -> anyhow::Result<()> {
    let batch_id = match BatchTarget::from_route(route) {
        BatchTarget::Unselected => {
            display::print_batch(&BatchState::Prompt);
            return Ok(());
        }
        BatchTarget::Batch(batch_id) => batch_id,
    };

    if watch {
        let monitor = BatchMonitor::mount(gateway, BatchTarget::Batch(batch_id));
        watch_view(monitor.subscribe(), display::print_batch).await;
        return Ok(());
    }

    match BatchState::from_outcome(&batch_id, gateway.batch_progress(&batch_id).await) {
        BatchState::Error(err) => {
            Err(anyhow::Error::new(err).context(format!("failed to load batch {batch_id}")))
        }
        state => {
            display::print_batch(&state);
            Ok(())
        }
    }
}

async fn stats(gateway: Arc<dyn Gateway>, days: WindowDays, watch: bool) -> anyhow::Result<()> {
    if watch {
        let bus = InvalidationBus::new();
        let view = StatsView::mount(gateway, &bus, days);
        watch_view(view.subscribe(), |state| display::print_stats(state, days)).await;
        return Ok(());
    }

    let stats = gateway
        .ticket_stats(days)
        .await
        .context("failed to load ticket statistics")?;
    display::print_stats(&StatsState::Loaded(stats), days);
    Ok(())
}

/// Redraw on every state change until Ctrl-C or the view goes away.
async fn watch_view<T>(mut rx: watch::Receiver<T>, render: impl Fn(&T)) {
    loop {
        display::clear_screen();
        render(&*rx.borrow_and_update());
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
}
