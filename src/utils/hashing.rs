//! Stable hashing for configuration fingerprints

use sha2::{Digest, Sha256};

/// Short stable digest of canonical content. Two renders agree on the
/// fingerprint exactly when they agree byte-for-byte.
pub fn fingerprint(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    format!("{:x}", result)[..16].to_string()
}
