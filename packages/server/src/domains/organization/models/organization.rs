use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// An organization in the internal registry, joined with its identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct InternalOrgRecord {
    /// Internal record id, used by the on-demand trigger
    pub id: String,
    pub uri: String,
    pub kbo_identifier_uri: Option<String>,
    pub kbo_number: Option<String>,
    pub ovo_number: Option<String>,
    pub ovo_structure_uri: Option<String>,
    /// Anchor for a newly constructed OVO structure
    pub structured_id_uri: Option<String>,
}

impl InternalOrgRecord {
    /// `(identifier uri, kbo number)` when the organization carries a KBO number.
    pub fn business_id(&self) -> Option<(&str, &str)> {
        match (&self.kbo_identifier_uri, &self.kbo_number) {
            (Some(uri), Some(number)) if !number.trim().is_empty() => {
                Some((uri.as_str(), number.as_str()))
            }
            _ => None,
        }
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

const SELECT_RECORD: &str = r#"
    SELECT o.id, o.uri,
           k.uri AS kbo_identifier_uri, k.kbo_number,
           s.uri AS structured_id_uri,
           v.uri AS ovo_structure_uri, v.ovo_number
    FROM organizations o
    LEFT JOIN kbo_identifiers k ON k.organization_uri = o.uri
    LEFT JOIN structured_identifiers s ON s.organization_uri = o.uri
    LEFT JOIN ovo_structures v ON v.structured_id_uri = s.uri
"#;

impl InternalOrgRecord {
    /// Find organization by internal record id
    pub async fn find_by_id(id: &str, pool: &PgPool) -> Result<Option<Self>> {
        let record = sqlx::query_as::<_, InternalOrgRecord>(&format!(
            "{} WHERE o.id = $1",
            SELECT_RECORD
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(record)
    }

    /// All organizations carrying a KBO number, in URI order
    pub async fn find_all_with_kbo(pool: &PgPool) -> Result<Vec<Self>> {
        let records = sqlx::query_as::<_, InternalOrgRecord>(&format!(
            "{} WHERE k.kbo_number IS NOT NULL AND k.kbo_number <> '' ORDER BY o.uri",
            SELECT_RECORD
        ))
        .fetch_all(pool)
        .await?;
        Ok(records)
    }

    /// Bump the modified timestamp after a write
    pub async fn touch(uri: &str, pool: &PgPool) -> Result<()> {
        sqlx::query("UPDATE organizations SET modified = NOW() WHERE uri = $1")
            .bind(uri)
            .execute(pool)
            .await?;
        Ok(())
    }
}
