//! Periodic background verification and the process-wide state cache.
//!
//! Other components (HTTP handlers, feature gates) read the cached
//! snapshot instead of re-running the full verification on every
//! request. The cache is replaced whole, never mutated field by field,
//! so readers always observe a complete, self-consistent record.

use crate::paths::LicensePaths;
use crate::resolver::{app_state, AppStateRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, OnceLock, RwLock};
use std::time::Duration;
use tracing::{info, warn};

/// How often the background monitor re-verifies the license.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);

/// Snapshot of the last background verification.
///
/// `record` is `None` until the first check completes; callers should
/// treat that as "not yet verified", not as a failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachedAppState {
    /// When the snapshot was taken.
    pub last_check: Option<DateTime<Utc>>,
    /// The resolved state, absent before the first check.
    pub record: Option<AppStateRecord>,
}

impl CachedAppState {
    /// Returns true if no verification has been published yet.
    #[must_use]
    pub fn is_unchecked(&self) -> bool {
        self.record.is_none()
    }
}

fn cache() -> &'static RwLock<Arc<CachedAppState>> {
    static CACHE: OnceLock<RwLock<Arc<CachedAppState>>> = OnceLock::new();
    CACHE.get_or_init(|| {
        RwLock::new(Arc::new(CachedAppState {
            last_check: None,
            record: None,
        }))
    })
}

/// Returns the current cached snapshot.
#[must_use]
pub fn cached_app_state() -> Arc<CachedAppState> {
    match cache().read() {
        Ok(guard) => Arc::clone(&guard),
        Err(poisoned) => Arc::clone(&poisoned.into_inner()),
    }
}

/// Publishes a freshly resolved state into the cache, replacing the
/// previous snapshot atomically.
pub fn publish_app_state(record: AppStateRecord) {
    let snapshot = Arc::new(CachedAppState {
        last_check: Some(Utc::now()),
        record: Some(record),
    });
    match cache().write() {
        Ok(mut guard) => *guard = snapshot,
        Err(poisoned) => *poisoned.into_inner() = snapshot,
    }
}

/// Background task: re-verifies the license on a fixed interval and
/// republishes the result. Spawn this once at startup.
pub async fn run_license_monitor(paths: LicensePaths, interval: Duration) {
    info!(
        "license monitor started (checking every {}h)",
        interval.as_secs() / 3600
    );
    loop {
        let record = app_state(&paths);
        if !record.allow_usage {
            warn!("license blocked: {}", record.user_message);
        } else if record.show_warning {
            warn!("{}", record.user_message);
        }
        publish_app_state(record);
        tokio::time::sleep(interval).await;
    }
}
