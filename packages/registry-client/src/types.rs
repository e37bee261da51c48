use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A field that may be omitted by the registry or explicitly set to null.
///
/// `None` means the field was not part of the response, `Some(None)` means the
/// registry sent `null`.
pub type Field<T> = Option<Option<T>>;

/// Name of the response header carrying pagination metadata.
pub const SEARCH_METADATA_HEADER: &str = "x-search-metadata";

/// Fields requested from the search endpoint unless configured otherwise.
pub const DEFAULT_FIELDS: &str =
    "changeTime,kboNumber,name,shortName,ovoNumber,labels,contacts,organisationClassifications,locations";

/// A single organisation as published by the registry search API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganisationSnapshot {
    #[serde(default)]
    pub kbo_number: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub name: Field<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub short_name: Field<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub ovo_number: Field<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub labels: Field<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub contacts: Field<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub organisation_classifications: Field<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub locations: Field<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub change_time: Field<String>,
}

impl OrganisationSnapshot {
    /// OVO number when the registry has one. Null and omitted both read as none.
    pub fn ovo(&self) -> Option<&str> {
        self.ovo_number.as_ref().and_then(|v| v.as_deref())
    }

    /// Change timestamp when the registry has one.
    pub fn change_time(&self) -> Option<&str> {
        self.change_time.as_ref().and_then(|v| v.as_deref())
    }
}

/// Decoded `x-search-metadata` header.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMetadata {
    pub scroll_id: Option<String>,
    #[serde(default)]
    pub total_items: Option<u64>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
