// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Reconciliation decisions live in domains/organization and only call these.
//
// Naming convention: Base* for trait names (e.g., BaseRegistryClient)

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use registry_client::OrganisationSnapshot;

use crate::domains::organization::models::{BusinessIdLink, InternalOrgRecord};

// =============================================================================
// Registry Trait (Infrastructure - external organisation registry)
// =============================================================================

#[async_trait]
pub trait BaseRegistryClient: Send + Sync {
    /// Full snapshot keyed by KBO number (paged internally)
    async fn fetch_all(&self) -> registry_client::Result<HashMap<String, OrganisationSnapshot>>;

    /// Targeted lookup by KBO number (not paged)
    async fn fetch_by_kbo(&self, kbo_number: &str)
        -> registry_client::Result<Vec<OrganisationSnapshot>>;
}

#[async_trait]
impl BaseRegistryClient for registry_client::RegistryClient {
    async fn fetch_all(&self) -> registry_client::Result<HashMap<String, OrganisationSnapshot>> {
        registry_client::RegistryClient::fetch_all(self).await
    }

    async fn fetch_by_kbo(
        &self,
        kbo_number: &str,
    ) -> registry_client::Result<Vec<OrganisationSnapshot>> {
        registry_client::RegistryClient::fetch_by_kbo(self, kbo_number).await
    }
}

// =============================================================================
// Organization Store Trait (Infrastructure - internal registry)
// =============================================================================

#[async_trait]
pub trait BaseOrganizationStore: Send + Sync {
    async fn get_internal_record(&self, id: &str) -> Result<Option<InternalOrgRecord>>;

    async fn get_all_internal_records_with_business_id(&self) -> Result<Vec<InternalOrgRecord>>;

    async fn get_business_id_link(&self, organization_uri: &str) -> Result<Option<BusinessIdLink>>;

    async fn create_business_id_record(
        &self,
        snapshot: &OrganisationSnapshot,
        identifier_uri: &str,
        organization_uri: &str,
    ) -> Result<()>;

    async fn update_business_id_record(
        &self,
        snapshot: &OrganisationSnapshot,
        link: &BusinessIdLink,
    ) -> Result<()>;

    /// Construct an empty OVO structure under a structured identifier, returning its URI
    async fn construct_ovo_structure(&self, structured_id_uri: &str) -> Result<String>;

    async fn update_ovo_value(&self, uri: &str, ovo_number: &str) -> Result<()>;

    /// Liveness check used by the health endpoint
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
