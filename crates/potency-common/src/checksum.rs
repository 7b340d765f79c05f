//! SHA-256 helpers for artifact provenance

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of an in-memory buffer
pub fn sha256_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
