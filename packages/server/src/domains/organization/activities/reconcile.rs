//! Reconciliation of one organization against its registry snapshot.
//!
//! Canonical order on every path: the business-identifier record first, then
//! the OVO number.

use registry_client::OrganisationSnapshot;
use tracing::{debug, info, warn};

use crate::common::SyncError;
use crate::domains::organization::models::{BusinessIdLink, InternalOrgRecord};
use crate::domains::organization::utils::{decide_ovo, decide_record_action, OvoDecision, RecordAction};
use crate::kernel::{BaseOrganizationStore, ServerDeps};

/// What happened to the OVO number
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OvoAction {
    OvoUnchanged,
    OvoUpdated {
        uri: String,
        value: String,
        /// True when the structure was constructed for this write
        created_structure: bool,
    },
}

/// Outcome of reconciling one organization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationDecision {
    pub record: RecordAction,
    pub ovo: OvoAction,
}

impl ReconciliationDecision {
    pub fn is_noop(&self) -> bool {
        self.record == RecordAction::NoOp && self.ovo == OvoAction::OvoUnchanged
    }
}

/// Create, update or leave the business-identifier record.
pub async fn reconcile_record(
    store: &dyn BaseOrganizationStore,
    link: Option<&BusinessIdLink>,
    snapshot: Option<&OrganisationSnapshot>,
    organization_uri: &str,
    identifier_uri: &str,
) -> Result<RecordAction, SyncError> {
    let action = decide_record_action(link, snapshot);

    match (action, link, snapshot) {
        (RecordAction::Create, _, Some(snapshot)) => {
            store
                .create_business_id_record(snapshot, identifier_uri, organization_uri)
                .await
                .map_err(SyncError::Persistence)?;
            info!(organization = %organization_uri, "Created KBO record");
        }
        (RecordAction::Update, Some(link), Some(snapshot)) => {
            store
                .update_business_id_record(snapshot, link)
                .await
                .map_err(SyncError::Persistence)?;
            info!(
                organization = %organization_uri,
                record = %link.uri,
                change_time = ?snapshot.change_time(),
                "Updated KBO record"
            );
        }
        _ => debug!(organization = %organization_uri, "KBO record up to date"),
    }

    Ok(action)
}

/// Bring the OVO number in line with the registry when the registry has one.
pub async fn resolve_ovo(
    store: &dyn BaseOrganizationStore,
    external_ovo: Option<&str>,
    internal_ovo: Option<&str>,
    structured_id_uri: Option<&str>,
    existing_structure_uri: Option<&str>,
) -> Result<OvoAction, SyncError> {
    let (uri, value, created_structure) =
        match decide_ovo(external_ovo, internal_ovo, existing_structure_uri) {
            OvoDecision::Keep => return Ok(OvoAction::OvoUnchanged),
            OvoDecision::WriteExisting { uri, value } => (uri, value, false),
            OvoDecision::CreateThenWrite { value } => {
                let Some(anchor) = structured_id_uri else {
                    warn!(
                        ovo = %value,
                        "No structured identifier to anchor an OVO structure, leaving OVO untouched"
                    );
                    return Ok(OvoAction::OvoUnchanged);
                };
                let uri = store
                    .construct_ovo_structure(anchor)
                    .await
                    .map_err(SyncError::Persistence)?;
                (uri, value, true)
            }
        };

    store
        .update_ovo_value(&uri, &value)
        .await
        .map_err(SyncError::Persistence)?;
    info!(
        ovo_structure = %uri,
        previous = ?internal_ovo,
        ovo = %value,
        "Updated OVO number"
    );

    Ok(OvoAction::OvoUpdated {
        uri,
        value,
        created_structure,
    })
}

/// Reconcile one organization under its lock.
///
/// The record is re-read once the lock is held so the decision sees writes
/// made by the other trigger path. A snapshot for a KBO number the record no
/// longer carries is a [`SyncError::NoExternalMatch`].
pub async fn reconcile_organization(
    deps: &ServerDeps,
    record: &InternalOrgRecord,
    snapshot: &OrganisationSnapshot,
) -> Result<ReconciliationDecision, SyncError> {
    let _guard = deps.org_locks.lock(&record.uri).await;
    let store = deps.store.as_ref();

    let current = store
        .get_internal_record(&record.id)
        .await
        .map_err(SyncError::Persistence)?
        .unwrap_or_else(|| record.clone());
    let (identifier_uri, kbo_number) = current
        .business_id()
        .ok_or(SyncError::NoInternalIdentifier)?;
    if snapshot.kbo_number.as_deref() != Some(kbo_number) {
        return Err(SyncError::NoExternalMatch(kbo_number.to_string()));
    }

    let link = store
        .get_business_id_link(&current.uri)
        .await
        .map_err(SyncError::Persistence)?;

    let record_action = reconcile_record(
        store,
        link.as_ref(),
        Some(snapshot),
        &current.uri,
        identifier_uri,
    )
    .await?;

    let ovo_action = resolve_ovo(
        store,
        snapshot.ovo(),
        current.ovo_number.as_deref(),
        current.structured_id_uri.as_deref(),
        current.ovo_structure_uri.as_deref(),
    )
    .await?;

    Ok(ReconciliationDecision {
        record: record_action,
        ovo: ovo_action,
    })
}
