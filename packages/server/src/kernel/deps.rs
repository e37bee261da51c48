//! Server dependencies for activities (using traits for testability)
//!
//! This module provides the central dependency container used by the
//! reconciliation activities, the HTTP routes and the scheduler.
//! All external services use trait abstractions to enable testing.

use std::sync::Arc;

use crate::kernel::{BaseOrganizationStore, BaseRegistryClient, OrgLocks, SweepGuard};

/// Server dependencies accessible to activities (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub store: Arc<dyn BaseOrganizationStore>,
    pub registry: Arc<dyn BaseRegistryClient>,
    /// Per-organization serialization shared by both trigger paths
    pub org_locks: OrgLocks,
    /// Keeps sweeps from overlapping with themselves
    pub sweep_guard: SweepGuard,
}

impl ServerDeps {
    pub fn new(
        store: Arc<dyn BaseOrganizationStore>,
        registry: Arc<dyn BaseRegistryClient>,
    ) -> Self {
        Self {
            store,
            registry,
            org_locks: OrgLocks::new(),
            sweep_guard: SweepGuard::new(),
        }
    }
}
