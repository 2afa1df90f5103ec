//! Last-run marker: tamper-evident record of the last successful check.
//!
//! The marker file holds one line, `timestamp|hex_sha256`, where the
//! hash covers the timestamp string concatenated with the local
//! fingerprint. A missing marker passes (first run); a marker that
//! fails to parse or whose hash does not recompute counts as a
//! rollback, since the marker itself was tampered with.

use crate::record::parse_timestamp;
use crate::verifier::{CheckFailure, CheckResult, TechnicalStatus};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::Path;

fn marker_hash(timestamp: &str, local_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(timestamp.as_bytes());
    hasher.update(local_id.as_bytes());
    hex::encode(hasher.finalize())
}

fn rollback(reason: &str) -> CheckFailure {
    CheckFailure::new(TechnicalStatus::ClockRollback, reason)
}

/// Checks the persisted marker against `now`.
pub(crate) fn check_rollback(path: &Path, local_id: &str, now: DateTime<Utc>) -> CheckResult {
    if !path.exists() {
        // First run, nothing to compare against.
        return Ok(());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|_| rollback("last-run marker unreadable"))?;
    let content = content.trim();

    let parts: Vec<&str> = content.split('|').collect();
    if parts.len() != 2 {
        return Err(rollback("last-run marker malformed"));
    }
    let (last_run_str, stored_hash) = (parts[0], parts[1]);

    let last_run = parse_timestamp(last_run_str)
        .ok_or_else(|| rollback("last-run marker timestamp unparsable"))?;

    if stored_hash != marker_hash(last_run_str, local_id) {
        return Err(rollback("last-run marker hash mismatch"));
    }

    if now < last_run {
        return Err(rollback("system clock is behind the last successful check"));
    }
    Ok(())
}

/// Rewrites the marker with `now`. Called only after the full
/// verification chain has succeeded; a failed or blocked attempt must
/// never advance the marker.
pub(crate) fn commit(path: &Path, local_id: &str, now: DateTime<Utc>) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let timestamp = now.to_rfc3339();
    let hash = marker_hash(&timestamp, local_id);
    let mut file = std::fs::File::create(path)?;
    write!(file, "{timestamp}|{hash}")?;
    Ok(())
}
