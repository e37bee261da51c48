//! Test fixtures for creating internal organizations.
//!
//! Rows are written with plain SQL; the service itself never creates
//! organizations or their identifiers.

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

/// Ids and URIs of an inserted organization
pub struct TestOrganization {
    pub id: String,
    pub uri: String,
    pub kbo_identifier_uri: Option<String>,
    pub structured_id_uri: String,
}

/// Insert an organization with a structured identifier, an optional KBO
/// number and an optional OVO structure.
pub async fn create_test_organization(
    pool: &PgPool,
    kbo_number: Option<&str>,
    ovo_number: Option<&str>,
) -> Result<TestOrganization> {
    let id = Uuid::new_v4().to_string();
    let uri = format!("http://data.lblod.info/id/bestuurseenheden/{}", id);
    let structured_id_uri = format!(
        "http://data.lblod.info/id/gestructureerdeIdentificatoren/{}",
        id
    );

    sqlx::query("INSERT INTO organizations (id, uri, name) VALUES ($1, $2, $3)")
        .bind(&id)
        .bind(&uri)
        .bind("Test bestuur")
        .execute(pool)
        .await?;

    sqlx::query("INSERT INTO structured_identifiers (uri, organization_uri) VALUES ($1, $2)")
        .bind(&structured_id_uri)
        .bind(&uri)
        .execute(pool)
        .await?;

    let kbo_identifier_uri = match kbo_number {
        Some(number) => {
            let kbo_uri = format!("http://data.lblod.info/id/identificatoren/kbo-{}", id);
            sqlx::query(
                "INSERT INTO kbo_identifiers (uri, organization_uri, kbo_number) VALUES ($1, $2, $3)",
            )
            .bind(&kbo_uri)
            .bind(&uri)
            .bind(number)
            .execute(pool)
            .await?;
            Some(kbo_uri)
        }
        None => None,
    };

    if let Some(ovo) = ovo_number {
        sqlx::query(
            "INSERT INTO ovo_structures (uri, structured_id_uri, ovo_number) VALUES ($1, $2, $3)",
        )
        .bind(format!("http://data.lblod.info/id/ovo/{}", id))
        .bind(&structured_id_uri)
        .bind(ovo)
        .execute(pool)
        .await?;
    }

    Ok(TestOrganization {
        id,
        uri,
        kbo_identifier_uri,
        structured_id_uri,
    })
}

/// A KBO number nobody else in the shared database uses
pub fn unique_kbo_number() -> String {
    format!("{:010}", Uuid::new_v4().as_u128() % 10_000_000_000)
}
