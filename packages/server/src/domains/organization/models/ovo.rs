use anyhow::{bail, Result};
use sqlx::PgPool;

/// OVO identifier structure, hanging off an organization's structured identifier.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct OvoStructure {
    pub uri: String,
    pub structured_id_uri: String,
    pub ovo_number: Option<String>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl OvoStructure {
    pub async fn find_by_uri(uri: &str, pool: &PgPool) -> Result<Option<Self>> {
        let structure =
            sqlx::query_as::<_, OvoStructure>("SELECT * FROM ovo_structures WHERE uri = $1")
                .bind(uri)
                .fetch_optional(pool)
                .await?;
        Ok(structure)
    }

    /// Create an empty structure under the given structured identifier
    pub async fn create(uri: &str, structured_id_uri: &str, pool: &PgPool) -> Result<Self> {
        let structure = sqlx::query_as::<_, OvoStructure>(
            r#"
            INSERT INTO ovo_structures (uri, structured_id_uri, ovo_number)
            VALUES ($1, $2, NULL)
            RETURNING *
            "#,
        )
        .bind(uri)
        .bind(structured_id_uri)
        .fetch_one(pool)
        .await?;
        Ok(structure)
    }

    pub async fn set_ovo_number(uri: &str, ovo_number: &str, pool: &PgPool) -> Result<()> {
        let result = sqlx::query("UPDATE ovo_structures SET ovo_number = $2 WHERE uri = $1")
            .bind(uri)
            .bind(ovo_number)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            bail!("no OVO structure at {}", uri);
        }
        Ok(())
    }
}
