use anyhow::Result;
use chrono::{DateTime, Utc};
use registry_client::{Field, OrganisationSnapshot};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;

/// The parts of an existing business-identifier record reconciliation needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BusinessIdLink {
    pub uri: String,
    pub organization_uri: String,
    /// Change timestamp of the snapshot this record was last written from
    pub change_time: Option<String>,
}

/// Business-identifier record: the registry's view of an organization,
/// stored next to the internal organization it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BusinessIdRecord {
    pub uri: String,
    pub organization_uri: String,
    pub identifier_uri: String,
    pub kbo_number: Option<String>,
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub labels: Option<JsonValue>,
    pub contacts: Option<JsonValue>,
    pub classifications: Option<JsonValue>,
    pub locations: Option<JsonValue>,
    pub change_time: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BusinessIdRecord {
    /// New record populated from the full snapshot field set.
    pub fn from_snapshot(
        uri: String,
        organization_uri: &str,
        identifier_uri: &str,
        snapshot: &OrganisationSnapshot,
    ) -> Self {
        let now = Utc::now();
        Self {
            uri,
            organization_uri: organization_uri.to_string(),
            identifier_uri: identifier_uri.to_string(),
            kbo_number: snapshot.kbo_number.clone(),
            name: snapshot.name.clone().flatten(),
            short_name: snapshot.short_name.clone().flatten(),
            labels: snapshot.labels.clone().flatten(),
            contacts: snapshot.contacts.clone().flatten(),
            classifications: snapshot.organisation_classifications.clone().flatten(),
            locations: snapshot.locations.clone().flatten(),
            change_time: snapshot.change_time.clone().flatten(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite every field the snapshot carries, explicit nulls included.
    /// Fields the registry omitted keep their stored value.
    pub fn apply_snapshot(&mut self, snapshot: &OrganisationSnapshot) {
        if let Some(kbo) = &snapshot.kbo_number {
            self.kbo_number = Some(kbo.clone());
        }
        overwrite(&mut self.name, &snapshot.name);
        overwrite(&mut self.short_name, &snapshot.short_name);
        overwrite(&mut self.labels, &snapshot.labels);
        overwrite(&mut self.contacts, &snapshot.contacts);
        overwrite(&mut self.classifications, &snapshot.organisation_classifications);
        overwrite(&mut self.locations, &snapshot.locations);
        overwrite(&mut self.change_time, &snapshot.change_time);
        self.updated_at = Utc::now();
    }

    pub fn link(&self) -> BusinessIdLink {
        BusinessIdLink {
            uri: self.uri.clone(),
            organization_uri: self.organization_uri.clone(),
            change_time: self.change_time.clone(),
        }
    }
}

fn overwrite<T: Clone>(target: &mut Option<T>, field: &Field<T>) {
    if let Some(value) = field {
        *target = value.clone();
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl BusinessIdLink {
    pub async fn find_by_organization(organization_uri: &str, pool: &PgPool) -> Result<Option<Self>> {
        let link = sqlx::query_as::<_, BusinessIdLink>(
            "SELECT uri, organization_uri, change_time FROM business_id_records WHERE organization_uri = $1",
        )
        .bind(organization_uri)
        .fetch_optional(pool)
        .await?;
        Ok(link)
    }
}

impl BusinessIdRecord {
    pub async fn find_by_uri(uri: &str, pool: &PgPool) -> Result<Option<Self>> {
        let record =
            sqlx::query_as::<_, BusinessIdRecord>("SELECT * FROM business_id_records WHERE uri = $1")
                .bind(uri)
                .fetch_optional(pool)
                .await?;
        Ok(record)
    }

    pub async fn find_by_organization(organization_uri: &str, pool: &PgPool) -> Result<Option<Self>> {
        let record = sqlx::query_as::<_, BusinessIdRecord>(
            "SELECT * FROM business_id_records WHERE organization_uri = $1",
        )
        .bind(organization_uri)
        .fetch_optional(pool)
        .await?;
        Ok(record)
    }

    pub async fn insert(&self, pool: &PgPool) -> Result<Self> {
        let record = sqlx::query_as::<_, BusinessIdRecord>(
            r#"
            INSERT INTO business_id_records (
                uri, organization_uri, identifier_uri, kbo_number, name, short_name,
                labels, contacts, classifications, locations, change_time, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(&self.uri)
        .bind(&self.organization_uri)
        .bind(&self.identifier_uri)
        .bind(&self.kbo_number)
        .bind(&self.name)
        .bind(&self.short_name)
        .bind(&self.labels)
        .bind(&self.contacts)
        .bind(&self.classifications)
        .bind(&self.locations)
        .bind(&self.change_time)
        .bind(self.created_at)
        .bind(self.updated_at)
        .fetch_one(pool)
        .await?;
        Ok(record)
    }

    /// Write every mutable column back
    pub async fn update(&self, pool: &PgPool) -> Result<Self> {
        let record = sqlx::query_as::<_, BusinessIdRecord>(
            r#"
            UPDATE business_id_records
            SET kbo_number = $2,
                name = $3,
                short_name = $4,
                labels = $5,
                contacts = $6,
                classifications = $7,
                locations = $8,
                change_time = $9,
                updated_at = $10
            WHERE uri = $1
            RETURNING *
            "#,
        )
        .bind(&self.uri)
        .bind(&self.kbo_number)
        .bind(&self.name)
        .bind(&self.short_name)
        .bind(&self.labels)
        .bind(&self.contacts)
        .bind(&self.classifications)
        .bind(&self.locations)
        .bind(&self.change_time)
        .bind(self.updated_at)
        .fetch_one(pool)
        .await?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(value: JsonValue) -> OrganisationSnapshot {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn from_snapshot_copies_every_field() {
        let snap = snapshot(json!({
            "kboNumber": "0123456789",
            "name": "Gemeente Aalst",
            "shortName": "Aalst",
            "labels": [{ "value": "Aalst" }],
            "contacts": [],
            "organisationClassifications": [{ "organisationClassificationName": "Gemeente" }],
            "locations": [{ "formattedAddress": "Grote Markt 3, 9300 Aalst" }],
            "changeTime": "2024-01-01T00:00:00Z"
        }));

        let record = BusinessIdRecord::from_snapshot(
            "urn:record".into(),
            "urn:org",
            "urn:kbo-identifier",
            &snap,
        );

        assert_eq!(record.kbo_number.as_deref(), Some("0123456789"));
        assert_eq!(record.name.as_deref(), Some("Gemeente Aalst"));
        assert_eq!(record.short_name.as_deref(), Some("Aalst"));
        assert_eq!(record.contacts, Some(json!([])));
        assert_eq!(
            record.classifications,
            Some(json!([{ "organisationClassificationName": "Gemeente" }]))
        );
        assert_eq!(record.change_time.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(record.link().organization_uri, "urn:org");
    }

    #[test]
    fn apply_snapshot_overwrites_nulls_and_keeps_omitted_fields() {
        let original = snapshot(json!({
            "kboNumber": "0123456789",
            "name": "Oude naam",
            "shortName": "Oud",
            "locations": [{ "formattedAddress": "Oude straat 1" }],
            "changeTime": "2024-01-01"
        }));
        let mut record =
            BusinessIdRecord::from_snapshot("urn:record".into(), "urn:org", "urn:id", &original);

        let update = snapshot(json!({
            "kboNumber": "0123456789",
            "name": "Nieuwe naam",
            "shortName": null,
            "changeTime": "2024-06-01"
        }));
        record.apply_snapshot(&update);

        assert_eq!(record.name.as_deref(), Some("Nieuwe naam"));
        assert_eq!(record.short_name, None);
        assert_eq!(record.locations, Some(json!([{ "formattedAddress": "Oude straat 1" }])));
        assert_eq!(record.change_time.as_deref(), Some("2024-06-01"));
    }
}
