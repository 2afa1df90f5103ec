//! App state resolution: from technical status to user experience.
//!
//! This layer is product security, not cryptography. It guides a
//! legitimate user toward renewal while giving an attacker no hint of
//! which defense fired: every hostile or suspicious outcome collapses
//! into one BLOCKED state with one shared opaque message. The masking
//! lives in a single function so it cannot drift per call site.

use crate::paths::LicensePaths;
use crate::record::{parse_timestamp, read_record, LicenseRecord};
use crate::verifier::{LicenseVerifier, TechnicalStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Days before expiry at which warnings start.
pub const EXPIRING_THRESHOLD_DAYS: i64 = 3;

/// Shared message for every blocked path. Never name the failing
/// check here: no "invalid signature", no "clock moved back".
const BLOCKED_MESSAGE: &str =
    "The application state could not be validated. Contact your provider.";

const EXPIRED_MESSAGE: &str =
    "Your membership has expired. Contact your provider to renew and keep using the application.";

const READY_MESSAGE: &str = "Application ready";

/// User-facing application state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppState {
    /// Membership active, full app.
    Active,
    /// About to expire, full app plus warnings.
    ExpiringSoon,
    /// Past the validity window, blocked with renewal guidance.
    Expired,
    /// Hostile or suspicious, blocked with the opaque message.
    Blocked,
}

/// Complete resolved state consumed by the UI and the HTTP layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppStateRecord {
    /// User-facing state.
    pub state: AppState,
    /// Whether the app may be used at all.
    pub allow_usage: bool,
    /// Whether to surface a renewal warning.
    pub show_warning: bool,
    /// Message safe to show to the user.
    pub user_message: String,
    /// Days until expiry, only populated on the valid path.
    pub days_remaining: Option<i64>,
    /// Enabled features, only populated on the valid path.
    pub features: Option<BTreeMap<String, Value>>,
    /// Technical status, for internal logs and diagnostics only.
    pub technical_status: TechnicalStatus,
}

impl AppStateRecord {
    /// Returns true if the app must refuse to operate.
    #[must_use]
    pub fn should_block(&self) -> bool {
        !self.allow_usage
    }
}

/// Resolves the app state for the license at the given paths.
#[must_use]
pub fn app_state(paths: &LicensePaths) -> AppStateRecord {
    app_state_at(paths, Utc::now())
}

/// Resolves the app state at an explicit point in time.
#[must_use]
pub fn app_state_at(paths: &LicensePaths, now: DateTime<Utc>) -> AppStateRecord {
    let verification = LicenseVerifier::new(paths.clone()).verify_at(now);
    let record = if verification.status.is_valid() {
        read_record(&paths.license).ok()
    } else {
        None
    };
    resolve(verification.status, record.as_ref(), now)
}

/// Pure resolution of technical status plus license data into an
/// `AppStateRecord`. Total: every input combination produces a
/// complete record.
#[must_use]
pub fn resolve(
    status: TechnicalStatus,
    record: Option<&LicenseRecord>,
    now: DateTime<Utc>,
) -> AppStateRecord {
    match status {
        TechnicalStatus::Valid => match record {
            Some(record) => resolve_valid(record, now, status),
            // Verified fine but unreadable on resolve: block.
            None => blocked(status),
        },
        TechnicalStatus::Expired => AppStateRecord {
            state: AppState::Expired,
            allow_usage: false,
            show_warning: false,
            user_message: EXPIRED_MESSAGE.to_string(),
            days_remaining: None,
            features: None,
            technical_status: status,
        },
        TechnicalStatus::Invalid
        | TechnicalStatus::Manipulated
        | TechnicalStatus::ClockRollback => blocked(status),
    }
}

fn resolve_valid(record: &LicenseRecord, now: DateTime<Utc>, status: TechnicalStatus) -> AppStateRecord {
    let Some(expires_at) = parse_timestamp(&record.expires_at) else {
        return blocked(status);
    };
    let days_remaining = floor_days(expires_at - now);

    if (0..=EXPIRING_THRESHOLD_DAYS).contains(&days_remaining) {
        AppStateRecord {
            state: AppState::ExpiringSoon,
            allow_usage: true,
            show_warning: true,
            user_message: expiring_message(days_remaining),
            days_remaining: Some(days_remaining),
            features: Some(record.features.clone()),
            technical_status: status,
        }
    } else {
        AppStateRecord {
            state: AppState::Active,
            allow_usage: true,
            show_warning: false,
            user_message: READY_MESSAGE.to_string(),
            days_remaining: Some(days_remaining),
            features: Some(record.features.clone()),
            technical_status: status,
        }
    }
}

fn expiring_message(days_remaining: i64) -> String {
    match days_remaining {
        0 => "Your membership expires today. Contact your provider to renew.".to_string(),
        1 => "Your membership expires tomorrow. Contact your provider to renew.".to_string(),
        n => format!("Your membership expires in {n} days. Contact your provider to renew."),
    }
}

/// The one place the anti-leak masking happens.
fn blocked(status: TechnicalStatus) -> AppStateRecord {
    AppStateRecord {
        state: AppState::Blocked,
        allow_usage: false,
        show_warning: false,
        user_message: BLOCKED_MESSAGE.to_string(),
        days_remaining: None,
        features: None,
        technical_status: status,
    }
}

/// Whole days between now and expiry, floored (negative once past).
fn floor_days(delta: chrono::Duration) -> i64 {
    delta.num_seconds().div_euclid(24 * 60 * 60)
}
