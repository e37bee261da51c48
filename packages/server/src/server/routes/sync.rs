use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, info};

use crate::common::SyncError;
use crate::domains::organization::activities::{sweep_with_permit, sync_one, SyncResult};
use crate::kernel::ServerDeps;

/// Status and body for each single-record outcome. Error details stay in
/// the server log.
pub fn sync_response_parts(result: &SyncResult) -> (StatusCode, &'static str) {
    match result {
        SyncResult::Reconciled(_) => (StatusCode::OK, "KBO data synced"),
        SyncResult::RecordNotFound => (StatusCode::NOT_FOUND, "Organization not found"),
        SyncResult::NoInternalIdentifier => (
            StatusCode::NOT_FOUND,
            "No KBO number found for this organization",
        ),
        SyncResult::NoExternalMatch => (
            StatusCode::NOT_FOUND,
            "No matching organization found in the registry",
        ),
        SyncResult::Failed(SyncError::UpstreamFetch(_)) => {
            (StatusCode::BAD_GATEWAY, "Could not reach the registry")
        }
        SyncResult::Failed(SyncError::UpstreamShape(_)) => (
            StatusCode::BAD_GATEWAY,
            "Unexpected response from the registry",
        ),
        SyncResult::Failed(SyncError::Persistence(_)) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Could not store KBO data")
        }
        SyncResult::Failed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
    }
}

impl IntoResponse for SyncResult {
    fn into_response(self) -> Response {
        sync_response_parts(&self).into_response()
    }
}

/// POST /sync-kbo-data/:id
///
/// Reconcile one organization against the registry.
pub async fn sync_kbo_data_handler(
    Extension(deps): Extension<ServerDeps>,
    Path(record_id): Path<String>,
) -> SyncResult {
    sync_one(&deps, &record_id).await
}

/// POST /sync-all-kbo-data
///
/// Start a full sweep in the background. Returns 409 when one is running.
pub async fn sync_all_kbo_data_handler(
    Extension(deps): Extension<ServerDeps>,
) -> (StatusCode, &'static str) {
    let Some(permit) = deps.sweep_guard.try_start() else {
        return (StatusCode::CONFLICT, "Sweep already running");
    };

    tokio::spawn(async move {
        match sweep_with_permit(&deps, permit).await {
            Ok(summary) => info!(?summary, "Manual KBO sweep finished"),
            Err(e) => error!(kind = e.kind(), error = %e, "Manual KBO sweep failed"),
        }
    });

    (StatusCode::ACCEPTED, "Sweep started")
}
