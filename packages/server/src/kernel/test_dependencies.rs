// TestDependencies - mock implementations for testing
//
// Provides an in-memory organization store and a scripted registry client
// that can be injected into ServerDeps for tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use registry_client::{OrganisationSnapshot, RegistryError};
use serde_json::json;

use super::{BaseOrganizationStore, BaseRegistryClient, ServerDeps};
use crate::domains::organization::models::{BusinessIdLink, BusinessIdRecord, InternalOrgRecord};

// =============================================================================
// Fixtures
// =============================================================================

/// Organization with a structured identifier and, optionally, a KBO number.
pub fn test_org(id: &str, kbo_number: Option<&str>) -> InternalOrgRecord {
    InternalOrgRecord {
        id: id.to_string(),
        uri: format!("http://data.lblod.info/id/bestuurseenheden/{}", id),
        kbo_identifier_uri: kbo_number
            .map(|_| format!("http://data.lblod.info/id/identificatoren/kbo-{}", id)),
        kbo_number: kbo_number.map(String::from),
        ovo_number: None,
        ovo_structure_uri: None,
        structured_id_uri: Some(format!(
            "http://data.lblod.info/id/gestructureerdeIdentificatoren/{}",
            id
        )),
    }
}

/// Registry entry with every field filled in.
pub fn test_snapshot(kbo_number: &str, change_time: &str) -> OrganisationSnapshot {
    OrganisationSnapshot {
        kbo_number: Some(kbo_number.to_string()),
        name: Some(Some(format!("Organisatie {}", kbo_number))),
        short_name: Some(Some(format!("Org {}", kbo_number))),
        ovo_number: None,
        labels: Some(Some(json!([{ "labelTypeName": "Formele naam", "value": "Organisatie" }]))),
        contacts: Some(Some(json!([{ "contactTypeName": "E-mail", "value": "info@example.org" }]))),
        organisation_classifications: Some(Some(json!([{ "organisationClassificationName": "Gemeente" }]))),
        locations: Some(Some(json!([{ "formattedAddress": "Grote Markt 1, 9300 Aalst" }]))),
        change_time: Some(Some(change_time.to_string())),
    }
}

// =============================================================================
// In-memory Organization Store
// =============================================================================

/// A write the store received, in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreWrite {
    CreateBusinessId {
        organization_uri: String,
        identifier_uri: String,
    },
    UpdateBusinessId {
        uri: String,
    },
    ConstructOvoStructure {
        structured_id_uri: String,
        uri: String,
    },
    UpdateOvoValue {
        uri: String,
        ovo_number: String,
    },
}

#[derive(Default)]
struct StoreState {
    records: Vec<InternalOrgRecord>,
    /// Keyed by organization URI
    business_ids: HashMap<String, BusinessIdRecord>,
    writes: Vec<StoreWrite>,
    minted: usize,
    fail_writes: bool,
    /// Organization URIs whose writes are rejected
    failing_organizations: HashSet<String>,
    /// Organization URIs passed to `get_business_id_link`, in call order
    link_reads: Vec<String>,
    yield_after_link_read: bool,
    unreachable: bool,
}

#[derive(Default)]
pub struct InMemoryOrganizationStore {
    state: Mutex<StoreState>,
}

impl InMemoryOrganizationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(self, record: InternalOrgRecord) -> Self {
        self.state.lock().unwrap().records.push(record);
        self
    }

    pub fn with_business_id_record(self, record: BusinessIdRecord) -> Self {
        self.state
            .lock()
            .unwrap()
            .business_ids
            .insert(record.organization_uri.clone(), record);
        self
    }

    /// Make every write fail
    pub fn failing_writes(self) -> Self {
        self.state.lock().unwrap().fail_writes = true;
        self
    }

    /// Reject writes for one organization only
    pub fn failing_writes_for(self, organization_uri: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_organizations
            .insert(organization_uri.to_string());
        self
    }

    /// Yield to the scheduler after every link read, so concurrent
    /// reconciliations interleave between the read and the write.
    pub fn yielding_after_link_read(self) -> Self {
        self.state.lock().unwrap().yield_after_link_read = true;
        self
    }

    /// Organization URIs whose link was read, in call order
    pub fn link_reads(&self) -> Vec<String> {
        self.state.lock().unwrap().link_reads.clone()
    }

    /// Make health checks fail
    pub fn unreachable(self) -> Self {
        self.state.lock().unwrap().unreachable = true;
        self
    }

    /// Get all writes in call order
    pub fn writes(&self) -> Vec<StoreWrite> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn record(&self, id: &str) -> Option<InternalOrgRecord> {
        self.state
            .lock()
            .unwrap()
            .records
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    pub fn business_id_record(&self, organization_uri: &str) -> Option<BusinessIdRecord> {
        self.state
            .lock()
            .unwrap()
            .business_ids
            .get(organization_uri)
            .cloned()
    }

    fn check_writable(state: &StoreState) -> Result<()> {
        if state.fail_writes {
            bail!("store rejected write");
        }
        Ok(())
    }

    fn check_writable_for(state: &StoreState, organization_uri: &str) -> Result<()> {
        Self::check_writable(state)?;
        if state.failing_organizations.contains(organization_uri) {
            bail!("store rejected write for {}", organization_uri);
        }
        Ok(())
    }
}

#[async_trait]
impl BaseOrganizationStore for InMemoryOrganizationStore {
    async fn get_internal_record(&self, id: &str) -> Result<Option<InternalOrgRecord>> {
        Ok(self.record(id))
    }

    async fn get_all_internal_records_with_business_id(&self) -> Result<Vec<InternalOrgRecord>> {
        let mut records: Vec<_> = self
            .state
            .lock()
            .unwrap()
            .records
            .iter()
            .filter(|r| r.business_id().is_some())
            .cloned()
            .collect();
        records.sort_by(|a, b| a.uri.cmp(&b.uri));
        Ok(records)
    }

    async fn get_business_id_link(&self, organization_uri: &str) -> Result<Option<BusinessIdLink>> {
        let (link, yield_now) = {
            let mut state = self.state.lock().unwrap();
            state.link_reads.push(organization_uri.to_string());
            let link = state
                .business_ids
                .get(organization_uri)
                .map(|record| record.link());
            (link, state.yield_after_link_read)
        };
        if yield_now {
            tokio::task::yield_now().await;
        }
        Ok(link)
    }

    async fn create_business_id_record(
        &self,
        snapshot: &OrganisationSnapshot,
        identifier_uri: &str,
        organization_uri: &str,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        Self::check_writable_for(&state, organization_uri)?;
        if state.business_ids.contains_key(organization_uri) {
            bail!("duplicate KBO record for {}", organization_uri);
        }

        state.minted += 1;
        let uri = format!("urn:test:kbo-organisatie:{}", state.minted);
        let record =
            BusinessIdRecord::from_snapshot(uri, organization_uri, identifier_uri, snapshot);
        state
            .business_ids
            .insert(organization_uri.to_string(), record);
        state.writes.push(StoreWrite::CreateBusinessId {
            organization_uri: organization_uri.to_string(),
            identifier_uri: identifier_uri.to_string(),
        });
        Ok(())
    }

    async fn update_business_id_record(
        &self,
        snapshot: &OrganisationSnapshot,
        link: &BusinessIdLink,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        Self::check_writable_for(&state, &link.organization_uri)?;
        let record = state
            .business_ids
            .get_mut(&link.organization_uri)
            .filter(|r| r.uri == link.uri)
            .ok_or_else(|| anyhow!("no KBO record at {}", link.uri))?;
        record.apply_snapshot(snapshot);
        state
            .writes
            .push(StoreWrite::UpdateBusinessId { uri: link.uri.clone() });
        Ok(())
    }

    async fn construct_ovo_structure(&self, structured_id_uri: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        Self::check_writable(&state)?;

        state.minted += 1;
        let uri = format!("urn:test:ovo:{}", state.minted);
        let record = state
            .records
            .iter_mut()
            .find(|r| r.structured_id_uri.as_deref() == Some(structured_id_uri))
            .ok_or_else(|| anyhow!("no structured identifier {}", structured_id_uri))?;
        record.ovo_structure_uri = Some(uri.clone());
        state.writes.push(StoreWrite::ConstructOvoStructure {
            structured_id_uri: structured_id_uri.to_string(),
            uri: uri.clone(),
        });
        Ok(uri)
    }

    async fn update_ovo_value(&self, uri: &str, ovo_number: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        Self::check_writable(&state)?;
        let record = state
            .records
            .iter_mut()
            .find(|r| r.ovo_structure_uri.as_deref() == Some(uri))
            .ok_or_else(|| anyhow!("no OVO structure at {}", uri))?;
        record.ovo_number = Some(ovo_number.to_string());
        state.writes.push(StoreWrite::UpdateOvoValue {
            uri: uri.to_string(),
            ovo_number: ovo_number.to_string(),
        });
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        if self.state.lock().unwrap().unreachable {
            bail!("connection refused");
        }
        Ok(())
    }
}

// =============================================================================
// Mock Registry Client
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockRegistryFailure {
    /// Behaves like a 503 from the registry
    Unavailable,
    /// Behaves like an undecodable response body
    Malformed,
}

impl MockRegistryFailure {
    fn to_error(self) -> RegistryError {
        match self {
            Self::Unavailable => RegistryError::Api {
                status: 503,
                message: "Service Unavailable".to_string(),
            },
            Self::Malformed => RegistryError::Parse("expected a JSON array".to_string()),
        }
    }
}

#[derive(Default)]
pub struct MockRegistryClient {
    /// Entries in page order; later duplicates win in `fetch_all`
    snapshots: Mutex<Vec<OrganisationSnapshot>>,
    failure: Mutex<Option<MockRegistryFailure>>,
    fetch_all_calls: AtomicUsize,
    lookups: Mutex<Vec<String>>,
}

impl MockRegistryClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(self, snapshot: OrganisationSnapshot) -> Self {
        self.snapshots.lock().unwrap().push(snapshot);
        self
    }

    pub fn failing_with(self, failure: MockRegistryFailure) -> Self {
        *self.failure.lock().unwrap() = Some(failure);
        self
    }

    /// Replace the published data between runs
    pub fn set_snapshots(&self, snapshots: Vec<OrganisationSnapshot>) {
        *self.snapshots.lock().unwrap() = snapshots;
    }

    pub fn fetch_all_calls(&self) -> usize {
        self.fetch_all_calls.load(Ordering::SeqCst)
    }

    /// KBO numbers passed to `fetch_by_kbo`, in call order
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }

    fn check_failure(&self) -> registry_client::Result<()> {
        match *self.failure.lock().unwrap() {
            Some(failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BaseRegistryClient for MockRegistryClient {
    async fn fetch_all(&self) -> registry_client::Result<HashMap<String, OrganisationSnapshot>> {
        self.fetch_all_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        let mut all = HashMap::new();
        for snapshot in self.snapshots.lock().unwrap().iter() {
            if let Some(kbo) = &snapshot.kbo_number {
                all.insert(kbo.clone(), snapshot.clone());
            }
        }
        Ok(all)
    }

    async fn fetch_by_kbo(
        &self,
        kbo_number: &str,
    ) -> registry_client::Result<Vec<OrganisationSnapshot>> {
        self.lookups.lock().unwrap().push(kbo_number.to_string());
        self.check_failure()?;

        Ok(self
            .snapshots
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.kbo_number.as_deref() == Some(kbo_number))
            .cloned()
            .collect())
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Mock collaborators plus the ServerDeps wired to them.
pub struct TestDependencies {
    pub store: Arc<InMemoryOrganizationStore>,
    pub registry: Arc<MockRegistryClient>,
    pub deps: ServerDeps,
}

impl TestDependencies {
    pub fn new(store: InMemoryOrganizationStore, registry: MockRegistryClient) -> Self {
        let store = Arc::new(store);
        let registry = Arc::new(registry);
        let deps = ServerDeps::new(store.clone(), registry.clone());
        Self {
            store,
            registry,
            deps,
        }
    }
}
