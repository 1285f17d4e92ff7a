//! Stable hashing for cache fingerprints

use crate::domain::FileRecord;
use sha2::{Digest, Sha256};

/// Digest a normalized source locator and content version into a fixed-length
/// hex key. The locator is trimmed and lower-cased, so `https://GitHub.com/U/R`
/// and `https://github.com/u/r` collapse to the same identity.
pub fn fingerprint(locator: &str, version: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(locator.trim().to_lowercase());
    hasher.update("\n");
    hasher.update(version);
    format!("{:x}", hasher.finalize())
}

/// Content version for a file set that has no upstream revision id (local
/// directories, uploads). Order-sensitive: callers pass files in a stable order.
pub fn content_version(files: &[FileRecord]) -> String {
    let mut hasher = Sha256::new();
    for file in files {
        hasher.update(file.path.as_bytes());
        hasher.update([0u8]);
        hasher.update(file.content.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())[..16].to_string()
}
