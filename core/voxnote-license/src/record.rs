//! License document access.
//!
//! Verification works on the raw JSON object so the canonical hash and
//! signature cover the document exactly as issued, unknown fields
//! included. `LicenseRecord` is the typed view the resolver uses once
//! verification has succeeded.

use crate::error::{LicenseError, LicenseResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// Typed view of a verified license document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseRecord {
    /// Schema version of the license document.
    pub license_version: i64,
    /// Fingerprint of the machine the license is bound to.
    pub machine_id: String,
    /// When the license was issued (ISO-8601).
    pub issued_at: String,
    /// Start of the validity window (ISO-8601).
    pub not_before: String,
    /// End of the validity window (ISO-8601).
    pub expires_at: String,
    /// Enabled capabilities, open-ended mapping.
    #[serde(default)]
    pub features: BTreeMap<String, Value>,
    /// Base64 SHA-256 of the canonical payload without this field.
    pub license_hash: String,
    /// Base64 Ed25519 signature over the canonical payload.
    pub signature: String,
}

/// Reads a license file as a raw JSON object.
pub(crate) fn read_license_file(path: &Path) -> LicenseResult<Map<String, Value>> {
    let text = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&text)?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(LicenseError::NotAnObject),
    }
}

/// Reads a license file as a typed record.
pub(crate) fn read_record(path: &Path) -> LicenseResult<LicenseRecord> {
    let doc = read_license_file(path)?;
    Ok(serde_json::from_value(Value::Object(doc))?)
}

/// Parses a license timestamp: RFC 3339, naive date-time, or bare date
/// (midnight). Returns `None` for anything else.
pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    None
}
