//! Shared test helpers for license verification tests.

#![allow(dead_code)]

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Duration, Utc};
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use tempfile::TempDir;
use voxnote_license::{generate_machine_id, to_canonical_json, LicensePaths};

/// Returns a deterministic Ed25519 key pair from a fixed seed.
pub fn test_keypair() -> (SigningKey, VerifyingKey) {
    let seed: [u8; 32] = [
        1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24,
        25, 26, 27, 28, 29, 30, 31, 32,
    ];
    let signing_key = SigningKey::from_bytes(&seed);
    let verifying_key = signing_key.verifying_key();
    (signing_key, verifying_key)
}

/// Derives `license_hash` and `signature` for a payload, producing a
/// complete, correctly sealed license document.
pub fn seal(mut payload_no_hash: Map<String, Value>, signing_key: &SigningKey) -> Map<String, Value> {
    let canonical = to_canonical_json(&Value::Object(payload_no_hash.clone()));
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let hash = BASE64.encode(hasher.finalize());
    payload_no_hash.insert("license_hash".to_string(), Value::String(hash));

    let payload = payload_no_hash;
    let canonical = to_canonical_json(&Value::Object(payload.clone()));
    let signature = signing_key.sign(canonical.as_bytes());

    let mut doc = payload;
    doc.insert(
        "signature".to_string(),
        Value::String(BASE64.encode(signature.to_bytes())),
    );
    doc
}

/// Unsealed payload with the standard fields, bound to `machine_id`.
pub fn base_payload(
    machine_id: &str,
    issued_at: DateTime<Utc>,
    not_before: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> Map<String, Value> {
    json!({
        "license_version": 1,
        "machine_id": machine_id,
        "issued_at": issued_at.to_rfc3339(),
        "not_before": not_before.to_rfc3339(),
        "expires_at": expires_at.to_rfc3339(),
        "features": {
            "transcription": true,
            "diarization": false,
            "export": "all"
        }
    })
    .as_object()
    .expect("payload is an object")
    .clone()
}

/// A temp directory holding a license file, public key and marker.
pub struct TestEnv {
    pub dir: TempDir,
    pub paths: LicensePaths,
    pub signing_key: SigningKey,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let (signing_key, verifying_key) = test_keypair();
        let paths = LicensePaths::new(
            dir.path().join("license.lic"),
            dir.path().join("public.key"),
            dir.path().join("data").join(".last_run"),
        );
        std::fs::write(&paths.public_key, verifying_key.to_bytes()).expect("write public key");
        Self {
            dir,
            paths,
            signing_key,
        }
    }

    pub fn write_license(&self, doc: &Map<String, Value>) {
        let text = serde_json::to_string_pretty(&Value::Object(doc.clone()))
            .expect("serialize license");
        std::fs::write(&self.paths.license, text).expect("write license");
    }

    /// Writes a correctly sealed license bound to this machine, issued
    /// a day ago and expiring at `now + expires_in`.
    pub fn write_valid_license(&self, now: DateTime<Utc>, expires_in: Duration) -> Map<String, Value> {
        let payload = base_payload(
            &generate_machine_id(),
            now - Duration::days(1),
            now - Duration::days(1),
            now + expires_in,
        );
        let doc = seal(payload, &self.signing_key);
        self.write_license(&doc);
        doc
    }
}
