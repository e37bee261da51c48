//! On-demand reconciliation of a single organization.

use tracing::{error, info};

use crate::common::SyncError;
use crate::domains::organization::activities::reconcile::{
    reconcile_organization, ReconciliationDecision,
};
use crate::kernel::ServerDeps;

/// Terminal state of a single-record sync
#[derive(Debug)]
pub enum SyncResult {
    RecordNotFound,
    NoInternalIdentifier,
    NoExternalMatch,
    Reconciled(ReconciliationDecision),
    Failed(SyncError),
}

/// Reconcile the organization with the given internal record id. Never fails:
/// every error ends up in [`SyncResult::Failed`].
pub async fn sync_one(deps: &ServerDeps, internal_record_id: &str) -> SyncResult {
    match try_sync_one(deps, internal_record_id).await {
        Ok(decision) => {
            info!(record_id = %internal_record_id, ?decision, "KBO sync complete");
            SyncResult::Reconciled(decision)
        }
        Err(SyncError::RecordNotFound(_)) => SyncResult::RecordNotFound,
        Err(SyncError::NoInternalIdentifier) => SyncResult::NoInternalIdentifier,
        Err(SyncError::NoExternalMatch(kbo)) => {
            info!(record_id = %internal_record_id, kbo = %kbo, "No registry entry for KBO number");
            SyncResult::NoExternalMatch
        }
        Err(e) => {
            error!(
                record_id = %internal_record_id,
                kind = e.kind(),
                error = %e,
                "KBO sync failed"
            );
            SyncResult::Failed(e)
        }
    }
}

async fn try_sync_one(
    deps: &ServerDeps,
    internal_record_id: &str,
) -> Result<ReconciliationDecision, SyncError> {
    let record = deps
        .store
        .get_internal_record(internal_record_id)
        .await
        .map_err(SyncError::Persistence)?
        .ok_or_else(|| SyncError::RecordNotFound(internal_record_id.to_string()))?;

    let (_, kbo_number) = record
        .business_id()
        .ok_or(SyncError::NoInternalIdentifier)?;

    let matches = deps.registry.fetch_by_kbo(kbo_number).await?;
    // the registry can return several hits; the last one wins, as in the sweep
    let snapshot = matches
        .into_iter()
        .filter(|s| s.kbo_number.as_deref() == Some(kbo_number))
        .last()
        .ok_or_else(|| SyncError::NoExternalMatch(kbo_number.to_string()))?;

    reconcile_organization(deps, &record, &snapshot).await
}
