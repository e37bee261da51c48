//! Postgres implementation of [`BaseOrganizationStore`].

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use registry_client::OrganisationSnapshot;
use sqlx::postgres::PgConnectOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domains::organization::models::{
    BusinessIdLink, BusinessIdRecord, InternalOrgRecord, OvoStructure,
};
use crate::kernel::BaseOrganizationStore;

/// Connection options with a server-side `statement_timeout`, so a query
/// that stalls after a connection is acquired still fails.
pub fn connect_options(database_url: &str, statement_timeout: Duration) -> Result<PgConnectOptions> {
    let options: PgConnectOptions = database_url
        .parse()
        .context("DATABASE_URL is not a valid Postgres URL")?;
    Ok(options.options([(
        "statement_timeout",
        statement_timeout.as_millis().to_string(),
    )]))
}

pub struct PgOrganizationStore {
    pool: PgPool,
    /// Prefix for URIs minted by this service
    uri_base: String,
}

impl PgOrganizationStore {
    pub fn new(pool: PgPool, uri_base: impl Into<String>) -> Self {
        Self {
            pool,
            uri_base: uri_base.into(),
        }
    }

    fn mint_uri(&self, kind: &str) -> String {
        format!("{}{}/{}", self.uri_base, kind, Uuid::new_v4())
    }
}

#[async_trait]
impl BaseOrganizationStore for PgOrganizationStore {
    async fn get_internal_record(&self, id: &str) -> Result<Option<InternalOrgRecord>> {
        InternalOrgRecord::find_by_id(id, &self.pool).await
    }

    async fn get_all_internal_records_with_business_id(&self) -> Result<Vec<InternalOrgRecord>> {
        InternalOrgRecord::find_all_with_kbo(&self.pool).await
    }

    async fn get_business_id_link(&self, organization_uri: &str) -> Result<Option<BusinessIdLink>> {
        BusinessIdLink::find_by_organization(organization_uri, &self.pool).await
    }

    async fn create_business_id_record(
        &self,
        snapshot: &OrganisationSnapshot,
        identifier_uri: &str,
        organization_uri: &str,
    ) -> Result<()> {
        let record = BusinessIdRecord::from_snapshot(
            self.mint_uri("kbo-organisaties"),
            organization_uri,
            identifier_uri,
            snapshot,
        );
        record
            .insert(&self.pool)
            .await
            .with_context(|| format!("inserting KBO record for {}", organization_uri))?;
        InternalOrgRecord::touch(organization_uri, &self.pool).await
    }

    async fn update_business_id_record(
        &self,
        snapshot: &OrganisationSnapshot,
        link: &BusinessIdLink,
    ) -> Result<()> {
        let mut record = BusinessIdRecord::find_by_uri(&link.uri, &self.pool)
            .await?
            .with_context(|| format!("KBO record {} disappeared", link.uri))?;
        record.apply_snapshot(snapshot);
        record
            .update(&self.pool)
            .await
            .with_context(|| format!("updating KBO record {}", link.uri))?;
        InternalOrgRecord::touch(&link.organization_uri, &self.pool).await
    }

    async fn construct_ovo_structure(&self, structured_id_uri: &str) -> Result<String> {
        let structure =
            OvoStructure::create(&self.mint_uri("identificatoren"), structured_id_uri, &self.pool)
                .await
                .with_context(|| format!("creating OVO structure under {}", structured_id_uri))?;
        Ok(structure.uri)
    }

    async fn update_ovo_value(&self, uri: &str, ovo_number: &str) -> Result<()> {
        OvoStructure::set_ovo_number(uri, ovo_number, &self.pool).await
    }

    async fn ping(&self) -> Result<()> {
        tokio::time::timeout(
            Duration::from_secs(5),
            sqlx::query("SELECT 1").execute(&self.pool),
        )
        .await
        .context("Query timeout (>5s)")??;
        Ok(())
    }
}
