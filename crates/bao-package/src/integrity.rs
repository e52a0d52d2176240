//! Content digests for built archives.
//!
//! Archives are reproducible, so a digest identifies a build exactly: two
//! builds of unchanged inputs share the same [`ContentHash`].

use sha2::{Digest, Sha256};

/// A content hash (SHA-256 hex digest).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(pub String);

impl ContentHash {
    /// Compute the SHA-256 hash of the given data.
    pub fn compute(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        ContentHash(digest.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Get the hex string representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check that `data` hashes to this digest.
    pub fn verify(&self, data: &[u8]) -> bool {
        ContentHash::compute(data) == *self
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
