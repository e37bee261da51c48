//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! This module provides the periodic KBO sweep that self-heals drift between
//! the internal registry and the organisation registry.
//!
//! ```text
//! Scheduler (SYNC_CRON_PATTERN)
//!     │
//!     └─► run_sweep()
//!             ├─► skipped if a sweep is already running
//!             └─► for each organization with a KBO number → reconcile
//! ```
//!
//! Failures are logged and swallowed here; the next tick is the retry.

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::domains::organization::activities::{run_sweep, SweepOutcome};
use crate::kernel::ServerDeps;

/// Start all scheduled tasks
pub async fn start_scheduler(deps: ServerDeps, cron_pattern: &str) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let sweep_job = Job::new_async(cron_pattern, move |_uuid, _lock| {
        let deps = deps.clone();
        Box::pin(async move {
            run_scheduled_sweep(&deps).await;
        })
    })?;

    scheduler.add(sweep_job).await?;
    scheduler.start().await?;

    tracing::info!(cron = %cron_pattern, "Scheduled tasks started (KBO sweep)");
    Ok(scheduler)
}

/// Run one sweep and log the outcome. Never returns an error.
pub async fn run_scheduled_sweep(deps: &ServerDeps) {
    tracing::info!("Running scheduled KBO sweep");

    match run_sweep(deps).await {
        Ok(SweepOutcome::Completed(summary)) => {
            tracing::info!(
                total = summary.total,
                created = summary.created,
                updated = summary.updated,
                "Scheduled KBO sweep succeeded"
            );
        }
        Ok(SweepOutcome::AlreadyRunning) => {
            tracing::warn!("Scheduled KBO sweep skipped, previous sweep still running");
        }
        Err(e) => {
            tracing::error!(kind = e.kind(), error = %e, "Scheduled KBO sweep failed");
        }
    }
}
