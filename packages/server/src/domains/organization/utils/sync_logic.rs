//! Pure decision functions for KBO reconciliation
//!
//! These functions contain NO side effects - they decide, from change timestamps
//! and identifier presence, what the activities should write.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use registry_client::OrganisationSnapshot;

use crate::domains::organization::models::BusinessIdLink;

/// What to do with the business-identifier record of one organization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordAction {
    Create,
    Update,
    NoOp,
}

/// What to do with the OVO number of one organization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OvoDecision {
    /// Registry has no opinion, or already agrees
    Keep,
    /// Write the registry value into the existing structure
    WriteExisting { uri: String, value: String },
    /// No structure yet: construct one, then write the value
    CreateThenWrite { value: String },
}

/// Parse an ISO-8601 change timestamp. Accepts RFC 3339, a naive date-time
/// (read as UTC) or a plain date (midnight UTC).
pub fn parse_change_time(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Decide whether the stored record is stale.
///
/// - no external timestamp: never update
/// - no internal timestamp: update
/// - otherwise: update iff external is strictly later. Unparseable values fall
///   back to lexical comparison.
pub fn is_update_needed(external: Option<&str>, internal: Option<&str>) -> bool {
    let Some(external) = external else {
        return false;
    };
    let Some(internal) = internal else {
        return true;
    };

    match (parse_change_time(external), parse_change_time(internal)) {
        (Some(ext), Some(int)) => ext > int,
        _ => external > internal,
    }
}

/// Decision table for the business-identifier record.
///
/// | link    | snapshot | update needed | action |
/// |---------|----------|---------------|--------|
/// | absent  | present  | -             | Create |
/// | present | present  | true          | Update |
/// | present | present  | false         | NoOp   |
/// | any     | absent   | -             | NoOp   |
pub fn decide_record_action(
    link: Option<&BusinessIdLink>,
    snapshot: Option<&OrganisationSnapshot>,
) -> RecordAction {
    match (link, snapshot) {
        (_, None) => RecordAction::NoOp,
        (None, Some(_)) => RecordAction::Create,
        (Some(link), Some(snapshot)) => {
            if is_update_needed(snapshot.change_time(), link.change_time.as_deref()) {
                RecordAction::Update
            } else {
                RecordAction::NoOp
            }
        }
    }
}

/// Decide what to do with the OVO number.
///
/// The registry only wins when it has a value. A missing OVO number there
/// never clears ours.
pub fn decide_ovo(
    external_ovo: Option<&str>,
    internal_ovo: Option<&str>,
    existing_structure_uri: Option<&str>,
) -> OvoDecision {
    let Some(external) = external_ovo else {
        return OvoDecision::Keep;
    };
    if internal_ovo == Some(external) {
        return OvoDecision::Keep;
    }

    match existing_structure_uri {
        Some(uri) => OvoDecision::WriteExisting {
            uri: uri.to_string(),
            value: external.to_string(),
        },
        None => OvoDecision::CreateThenWrite {
            value: external.to_string(),
        },
    }
}
