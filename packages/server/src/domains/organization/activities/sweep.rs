//! Full-population sweep: reconcile every organization that carries a KBO
//! number against the complete registry snapshot.
//!
//! The sweep is sequential and stops at the first error. Writes made before
//! the failure stay; the next scheduled run picks up the rest.

use tracing::{debug, error, info};

use crate::common::SyncError;
use crate::domains::organization::activities::reconcile::{reconcile_organization, OvoAction};
use crate::domains::organization::utils::RecordAction;
use crate::kernel::{ServerDeps, SweepPermit};

/// Counters reported at the end of a sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub total: usize,
    /// Organizations the registry has no entry for
    pub unmatched: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub ovo_updated: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepOutcome {
    Completed(SweepSummary),
    /// Another sweep held the guard; nothing was done
    AlreadyRunning,
}

/// Run a sweep unless one is already in progress.
pub async fn run_sweep(deps: &ServerDeps) -> Result<SweepOutcome, SyncError> {
    let Some(permit) = deps.sweep_guard.try_start() else {
        info!("KBO sweep already running, skipping");
        return Ok(SweepOutcome::AlreadyRunning);
    };
    sweep_with_permit(deps, permit).await.map(SweepOutcome::Completed)
}

/// Run a sweep with a guard the caller already claimed.
pub async fn sweep_with_permit(
    deps: &ServerDeps,
    _permit: SweepPermit,
) -> Result<SweepSummary, SyncError> {
    info!("Starting KBO sweep");

    let records = deps
        .store
        .get_all_internal_records_with_business_id()
        .await
        .map_err(SyncError::Persistence)?;
    let snapshots = deps.registry.fetch_all().await?;
    info!(
        organizations = records.len(),
        registry_entries = snapshots.len(),
        "Loaded organizations and registry snapshot"
    );

    let mut summary = SweepSummary {
        total: records.len(),
        ..Default::default()
    };

    for record in &records {
        let Some((_, kbo_number)) = record.business_id() else {
            continue;
        };
        let Some(snapshot) = snapshots.get(kbo_number) else {
            debug!(organization = %record.uri, kbo = %kbo_number, "No registry entry, skipping");
            summary.unmatched += 1;
            continue;
        };

        let decision = match reconcile_organization(deps, record, snapshot).await {
            Ok(decision) => decision,
            // KBO number changed after the listing; the next run sees the new one
            Err(SyncError::NoExternalMatch(_)) => {
                debug!(organization = %record.uri, kbo = %kbo_number, "KBO number changed, skipping");
                summary.unmatched += 1;
                continue;
            }
            Err(e) => {
                error!(
                    organization = %record.uri,
                    kbo = %kbo_number,
                    kind = e.kind(),
                    error = %e,
                    "Reconciliation failed, aborting sweep"
                );
                return Err(e);
            }
        };

        match decision.record {
            RecordAction::Create => summary.created += 1,
            RecordAction::Update => summary.updated += 1,
            RecordAction::NoOp => summary.unchanged += 1,
        }
        if let OvoAction::OvoUpdated { .. } = decision.ovo {
            summary.ovo_updated += 1;
        }
    }

    info!(
        total = summary.total,
        unmatched = summary.unmatched,
        created = summary.created,
        updated = summary.updated,
        unchanged = summary.unchanged,
        ovo_updated = summary.ovo_updated,
        "KBO sweep complete"
    );
    Ok(summary)
}
