//! Offline license verification for Voxnote.
//!
//! This crate handles:
//! - Hardware fingerprinting for machine binding
//! - License integrity (self-referential SHA-256 hash) and Ed25519
//!   signature verification
//! - Validity-window and clock-rollback checks
//! - Mapping the technical verification outcome to a user-facing
//!   application state
//!
//! # Design Principles
//!
//! - **Fully offline**: no license server, no network calls, ever
//! - **Fail closed**: any unexpected error while reading or parsing
//!   the license or marker file blocks the app
//! - **No hints**: every hostile outcome (forged, rebound, rolled-back
//!   clock) surfaces the same opaque user message
//! - **Machine binding**: the license names a fingerprint derived from
//!   hardware/OS signals and is only valid on that machine
//!
//! # License File Format
//!
//! A JSON document with `license_version`, `machine_id`, `issued_at`,
//! `not_before`, `expires_at`, `features`, `license_hash` and
//! `signature`. Hashing and signing use the canonical serialization
//! (sorted keys, no whitespace) so independent implementations agree
//! byte for byte.

mod canonical;
mod error;
mod fingerprint;
mod marker;
mod monitor;
mod paths;
mod record;
mod resolver;
mod verifier;

pub use canonical::to_canonical_json;
pub use error::{LicenseError, LicenseResult};
pub use fingerprint::generate_machine_id;
pub use monitor::{
    cached_app_state, publish_app_state, run_license_monitor, CachedAppState,
    DEFAULT_CHECK_INTERVAL,
};
pub use paths::LicensePaths;
pub use record::LicenseRecord;
pub use resolver::{
    app_state, app_state_at, resolve, AppState, AppStateRecord, EXPIRING_THRESHOLD_DAYS,
};
pub use verifier::{
    verify_license, CheckFailure, CheckResult, LicenseVerifier, TechnicalStatus, Verification,
    SUPPORTED_LICENSE_VERSION,
};
