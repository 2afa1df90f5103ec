//! Filesystem locations for the license, public key and marker.

use std::path::{Path, PathBuf};

/// Name of the last-run marker file inside the data directory.
const MARKER_FILE_NAME: &str = ".last_run";

/// The three files the verifier touches.
///
/// The license and public key are read-only inputs; the marker file is
/// owned exclusively by the verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicensePaths {
    /// License document (`license.lic`).
    pub license: PathBuf,
    /// Raw Ed25519 public key bytes (bundled resource).
    pub public_key: PathBuf,
    /// Last-run marker, in a process-local data directory.
    pub marker: PathBuf,
}

impl LicensePaths {
    /// Builds a fully explicit path set. Used by tests and the CLI.
    pub fn new(
        license: impl Into<PathBuf>,
        public_key: impl Into<PathBuf>,
        marker: impl Into<PathBuf>,
    ) -> Self {
        Self {
            license: license.into(),
            public_key: public_key.into(),
            marker: marker.into(),
        }
    }

    /// Resolves default locations for a given license file: the public
    /// key bundled next to the executable under `keys/public.key`, and
    /// the marker in the per-user local data directory.
    pub fn resolve(license: impl Into<PathBuf>) -> Self {
        let base = exe_dir();
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| base.clone())
            .join("voxnote");

        Self {
            license: license.into(),
            public_key: base.join("keys").join("public.key"),
            marker: data_dir.join(MARKER_FILE_NAME),
        }
    }
}

/// Directory of the running executable, falling back to the current
/// directory when it cannot be determined.
fn exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}
