//! Content fingerprints used as chunk keys.

use sha2::{Digest, Sha256};

/// SHA-256 hex digest of the text followed by the decimal timestamp.
pub fn fingerprint(text: &str, timestamp_ms: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update(timestamp_ms.to_string().as_bytes());
    hex::encode(hasher.finalize())
}
