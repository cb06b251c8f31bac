//! SHA-256 fingerprints for lockfile change detection.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 fingerprint of a migration source or compiled output
pub fn compute_checksum(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_is_stable_and_content_sensitive() {
        let a = compute_checksum("up: []");
        assert_eq!(a, compute_checksum("up: []"));
        assert_ne!(a, compute_checksum("up: [] "));
        assert_eq!(a.len(), 64);
    }
}
