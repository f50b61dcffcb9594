//! Replica authentication.
//!
//! Replicas are not logged-in users; they authenticate with a shared
//! secret carried in a request header and must opt in with the
//! replication marker header. The secret comparison is constant time:
//! both sides are reduced to SHA-256 digests and compared byte-for-byte
//! without early exit, so the comparison leaks neither length nor prefix.

use sha2::{Digest, Sha256};

/// Header a replica sets to mark a replicated write.
pub const REPLICATION_HEADER: &str = "X-EA-Replicated";

/// Header carrying the shared sync secret.
pub const SYNC_KEY_HEADER: &str = "X-EA-Sync-Key";

/// A configured shared secret, stored as a digest.
#[derive(Clone)]
pub struct SharedSecret {
    digest: [u8; 32],
}

impl SharedSecret {
    /// Creates a secret from its cleartext value.
    pub fn new(secret: &str) -> Self {
        Self {
            digest: digest_of(secret),
        }
    }

    /// Verifies a candidate in constant time.
    pub fn verify(&self, candidate: &str) -> bool {
        let candidate = digest_of(candidate);
        let mut diff = 0u8;
        for (a, b) in self.digest.iter().zip(candidate.iter()) {
            diff |= a ^ b;
        }
        diff == 0
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the digest either.
        f.write_str("SharedSecret(..)")
    }
}

fn digest_of(value: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_matching_secret() {
        let secret = SharedSecret::new("a-long-shared-secret-value");
        assert!(secret.verify("a-long-shared-secret-value"));
    }

    #[test]
    fn rejects_wrong_secret_and_prefixes() {
        let secret = SharedSecret::new("a-long-shared-secret-value");
        assert!(!secret.verify("wrong"));
        assert!(!secret.verify("a-long-shared-secret-valu"));
        assert!(!secret.verify("a-long-shared-secret-value "));
        assert!(!secret.verify(""));
    }

    #[test]
    fn debug_never_leaks() {
        let secret = SharedSecret::new("topsecret");
        assert_eq!(format!("{secret:?}"), "SharedSecret(..)");
    }
}
