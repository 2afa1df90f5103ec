//! Error types for the licensing crate.
//!
//! These errors are internal plumbing: the verification coordinator
//! maps every one of them to a `manipulated` technical status so the
//! system fails closed. They exist so logs can name the real cause.

use thiserror::Error;

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Filesystem error reading the license, key or marker file.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// License file is not well-formed JSON.
    #[error("invalid license document: {0}")]
    Json(#[from] serde_json::Error),

    /// License file parsed but the top level is not a JSON object.
    #[error("license document is not a JSON object")]
    NotAnObject,

    /// Public key file does not hold 32 raw Ed25519 bytes.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
