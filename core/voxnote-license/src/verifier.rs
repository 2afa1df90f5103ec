//! License verification coordinator and individual checks.
//!
//! Checks run in a fixed, non-reorderable order with first-failure
//! wins: version → structure → integrity hash → signature → machine
//! binding → time window → clock rollback. Reason strings are for
//! internal logs only and must never reach end users; the resolver
//! masks them behind one opaque message.

use crate::canonical::to_canonical_json;
use crate::error::{LicenseError, LicenseResult};
use crate::fingerprint::generate_machine_id;
use crate::marker;
use crate::paths::LicensePaths;
use crate::record::{parse_timestamp, read_license_file};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{debug, warn};

/// Highest license schema version this build understands. Newer
/// versions are refused outright rather than degraded.
pub const SUPPORTED_LICENSE_VERSION: i64 = 1;

/// Fields every license document must carry.
const REQUIRED_FIELDS: [&str; 7] = [
    "machine_id",
    "issued_at",
    "not_before",
    "expires_at",
    "features",
    "license_hash",
    "signature",
];

/// Technical outcome of license verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechnicalStatus {
    /// All checks passed.
    Valid,
    /// Wrong context: machine mismatch or not yet active.
    Invalid,
    /// Correctly signed but past its validity window.
    Expired,
    /// Forged or corrupted: structure, version, hash or signature.
    Manipulated,
    /// Host clock is behind the last successful check.
    ClockRollback,
}

impl TechnicalStatus {
    /// Returns true if verification fully succeeded.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Stable lowercase name, for logs and diagnostics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::Expired => "expired",
            Self::Manipulated => "manipulated",
            Self::ClockRollback => "clock_rollback",
        }
    }
}

/// Result of a verification run: status plus an internal-only reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    /// Technical status.
    pub status: TechnicalStatus,
    /// Human-readable cause, for logs only.
    pub reason: String,
}

impl Verification {
    fn valid() -> Self {
        Self {
            status: TechnicalStatus::Valid,
            reason: "license valid".to_string(),
        }
    }

    fn manipulated(reason: impl Into<String>) -> Self {
        Self {
            status: TechnicalStatus::Manipulated,
            reason: reason.into(),
        }
    }
}

/// Failure raised by an individual check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckFailure {
    /// Status the failing check maps to.
    pub status: TechnicalStatus,
    /// Internal-only cause.
    pub reason: String,
}

impl CheckFailure {
    pub(crate) fn new(status: TechnicalStatus, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
        }
    }

    fn manipulated(reason: impl Into<String>) -> Self {
        Self::new(TechnicalStatus::Manipulated, reason)
    }
}

/// Outcome of an individual check.
pub type CheckResult = Result<(), CheckFailure>;

/// Verifies the license version is present, an integer, and supported.
pub fn verify_version(doc: &Map<String, Value>) -> CheckResult {
    let version = doc
        .get("license_version")
        .ok_or_else(|| CheckFailure::manipulated("missing field: license_version"))?;
    let version = version
        .as_i64()
        .ok_or_else(|| CheckFailure::manipulated("license_version is not an integer"))?;
    if version > SUPPORTED_LICENSE_VERSION {
        return Err(CheckFailure::manipulated(format!(
            "unsupported license version: {version}"
        )));
    }
    Ok(())
}

/// Verifies every required field is present.
pub fn verify_structure(doc: &Map<String, Value>) -> CheckResult {
    for field in REQUIRED_FIELDS {
        if !doc.contains_key(field) {
            return Err(CheckFailure::manipulated(format!("missing field: {field}")));
        }
    }
    Ok(())
}

/// Verifies the self-referential integrity hash.
///
/// Recomputes `base64(SHA256(canonical(payload minus license_hash)))`
/// and requires byte-exact equality with the stored value.
pub fn verify_integrity(payload: &Map<String, Value>) -> CheckResult {
    let stored = payload
        .get("license_hash")
        .and_then(Value::as_str)
        .ok_or_else(|| CheckFailure::manipulated("license_hash missing or not a string"))?;

    let mut payload_no_hash = payload.clone();
    payload_no_hash.remove("license_hash");
    let canonical = to_canonical_json(&Value::Object(payload_no_hash));

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let computed = BASE64.encode(hasher.finalize());

    if stored != computed {
        return Err(CheckFailure::manipulated("license_hash mismatch"));
    }
    Ok(())
}

/// Verifies the Ed25519 signature over the canonical payload (the
/// payload here still includes `license_hash`).
///
/// Every decode error or library rejection reports the same
/// `manipulated` status; causes are deliberately not distinguished.
pub fn verify_signature(
    payload: &Map<String, Value>,
    signature_b64: &str,
    public_key: &VerifyingKey,
) -> CheckResult {
    let sig_bytes = BASE64
        .decode(signature_b64)
        .map_err(|_| CheckFailure::manipulated("signature is not valid base64"))?;
    let signature = Signature::from_slice(&sig_bytes)
        .map_err(|_| CheckFailure::manipulated("signature has wrong length"))?;

    let canonical = to_canonical_json(&Value::Object(payload.clone()));
    public_key
        .verify(canonical.as_bytes(), &signature)
        .map_err(|_| CheckFailure::manipulated("signature verification failed"))?;
    Ok(())
}

/// Verifies the license is bound to this machine.
pub fn verify_machine_binding(payload: &Map<String, Value>, local_id: &str) -> CheckResult {
    let bound = payload.get("machine_id").and_then(Value::as_str);
    if bound != Some(local_id) {
        return Err(CheckFailure::new(
            TechnicalStatus::Invalid,
            "machine_id does not match this machine",
        ));
    }
    Ok(())
}

/// Verifies `not_before <= now`, `issued_at <= now` and
/// `now <= expires_at`. Unparsable timestamps count as manipulation.
pub fn verify_time_window(payload: &Map<String, Value>, now: DateTime<Utc>) -> CheckResult {
    let parse = |field: &str| -> Result<DateTime<Utc>, CheckFailure> {
        payload
            .get(field)
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
            .ok_or_else(|| CheckFailure::manipulated("invalid dates in license"))
    };

    let issued_at = parse("issued_at")?;
    let not_before = parse("not_before")?;
    let expires_at = parse("expires_at")?;

    if now < not_before {
        return Err(CheckFailure::new(
            TechnicalStatus::Invalid,
            "license not yet valid (not_before in the future)",
        ));
    }
    if now < issued_at {
        return Err(CheckFailure::new(
            TechnicalStatus::Invalid,
            "license not yet valid (issued_at in the future)",
        ));
    }
    if now > expires_at {
        return Err(CheckFailure::new(TechnicalStatus::Expired, "license expired"));
    }
    Ok(())
}

/// Loads raw Ed25519 public key bytes from a bundled resource file.
fn load_public_key(path: &Path) -> LicenseResult<VerifyingKey> {
    let bytes = std::fs::read(path)?;
    let bytes: [u8; 32] = bytes
        .try_into()
        .map_err(|_| LicenseError::InvalidPublicKey("key must be 32 bytes".to_string()))?;
    VerifyingKey::from_bytes(&bytes)
        .map_err(|e| LicenseError::InvalidPublicKey(e.to_string()))
}

/// Runs the full verification chain against a set of paths.
#[derive(Debug, Clone)]
pub struct LicenseVerifier {
    paths: LicensePaths,
}

impl LicenseVerifier {
    /// Creates a verifier over the given paths.
    pub fn new(paths: LicensePaths) -> Self {
        Self { paths }
    }

    /// Verifies the license against the current wall clock.
    ///
    /// Side effects are limited to reading the license and public key
    /// files and reading/rewriting the last-run marker. The marker is
    /// advanced only after the whole chain succeeds; a marker write
    /// failure is logged and swallowed, never escalated.
    #[must_use]
    pub fn verify(&self) -> Verification {
        self.verify_at(Utc::now())
    }

    /// Verifies the license at an explicit point in time.
    #[must_use]
    pub fn verify_at(&self, now: DateTime<Utc>) -> Verification {
        let doc = match read_license_file(&self.paths.license) {
            Ok(doc) => doc,
            Err(e) => {
                // Fail closed: an unreadable license is treated as forged.
                return Verification::manipulated(format!("error reading license: {e}"));
            }
        };

        let local_id = generate_machine_id();
        match self.run_checks(&doc, &local_id, now) {
            Ok(()) => {
                if let Err(e) = marker::commit(&self.paths.marker, &local_id, now) {
                    warn!("failed to update last-run marker: {e}");
                }
                Verification::valid()
            }
            Err(failure) => {
                debug!(
                    status = failure.status.as_str(),
                    reason = %failure.reason,
                    "license verification failed"
                );
                Verification {
                    status: failure.status,
                    reason: failure.reason,
                }
            }
        }
    }

    // Check order is fixed and first-failure-wins; do not reorder.
    fn run_checks(
        &self,
        doc: &Map<String, Value>,
        local_id: &str,
        now: DateTime<Utc>,
    ) -> CheckResult {
        verify_version(doc)?;
        verify_structure(doc)?;

        let mut payload = doc.clone();
        payload.remove("signature");
        // Structure check guarantees the field exists; a non-string
        // signature is manipulation.
        let signature_b64 = doc
            .get("signature")
            .and_then(Value::as_str)
            .ok_or_else(|| CheckFailure::manipulated("signature is not a string"))?;

        verify_integrity(&payload)?;

        let public_key = load_public_key(&self.paths.public_key)
            .map_err(|e| CheckFailure::manipulated(format!("error loading public key: {e}")))?;
        verify_signature(&payload, signature_b64, &public_key)?;

        verify_machine_binding(&payload, local_id)?;
        verify_time_window(&payload, now)?;
        marker::check_rollback(&self.paths.marker, local_id, now)?;
        Ok(())
    }
}

/// Convenience wrapper: verifies the license at the given paths.
#[must_use]
pub fn verify_license(paths: &LicensePaths) -> Verification {
    LicenseVerifier::new(paths.clone()).verify()
}
