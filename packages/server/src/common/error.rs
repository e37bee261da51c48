//! Error taxonomy for KBO reconciliation.

use registry_client::RegistryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("organization not found: {0}")]
    RecordNotFound(String),

    #[error("organization has no KBO number")]
    NoInternalIdentifier,

    #[error("no registry entry for KBO number {0}")]
    NoExternalMatch(String),

    /// Transport or HTTP failure talking to the registry
    #[error("registry request failed: {0}")]
    UpstreamFetch(#[source] RegistryError),

    /// Registry answered with something we could not decode
    #[error("unexpected registry response: {0}")]
    UpstreamShape(#[source] RegistryError),

    /// Store read or write failed
    #[error("store operation failed: {0:#}")]
    Persistence(anyhow::Error),

    #[error(transparent)]
    Unhandled(#[from] anyhow::Error),
}

impl From<RegistryError> for SyncError {
    fn from(err: RegistryError) -> Self {
        if err.is_transport() {
            Self::UpstreamFetch(err)
        } else {
            Self::UpstreamShape(err)
        }
    }
}

impl SyncError {
    /// Short machine-readable kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RecordNotFound(_) => "record_not_found",
            Self::NoInternalIdentifier => "no_internal_identifier",
            Self::NoExternalMatch(_) => "no_external_match",
            Self::UpstreamFetch(_) => "upstream_fetch",
            Self::UpstreamShape(_) => "upstream_shape",
            Self::Persistence(_) => "persistence",
            Self::Unhandled(_) => "unhandled",
        }
    }
}
