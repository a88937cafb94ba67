//! Cache key derivation
//!
//! A cache key is the SHA-256 digest of `org/repo/sha`. Same commit of the
//! same repository = same cache entry, and the key is safe to use as a
//! directory name.

use crate::error::{ShowcaseError, ShowcaseResult};
use sha2::{Digest, Sha256};
use std::fmt;

/// Hex-encoded digest identifying a build's cache entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a resolved (org, repo, sha) triple
    ///
    /// Callers pass the immutable commit hash, never a branch or tag name.
    pub fn derive(org: &str, repo: &str, sha: &str) -> ShowcaseResult<Self> {
        Self::check_names(org, repo)?;
        if sha.is_empty() {
            return Err(ShowcaseError::InvalidKeyInput("sha is empty".to_string()));
        }

        let mut hasher = Sha256::new();
        hasher.update(org.as_bytes());
        hasher.update(b"/");
        hasher.update(repo.as_bytes());
        hasher.update(b"/");
        hasher.update(sha.as_bytes());

        Ok(Self(hex::encode(hasher.finalize())))
    }

    /// Reject org and repo names that cannot be part of a key
    pub fn check_names(org: &str, repo: &str) -> ShowcaseResult<()> {
        for (field, value) in [("org", org), ("repo", repo)] {
            if value.is_empty() {
                return Err(ShowcaseError::InvalidKeyInput(format!("{} is empty", field)));
            }
            // A slash inside org or repo would make `a/b/c` ambiguous
            if value.contains('/') || value.contains('\\') || value == ".." {
                return Err(ShowcaseError::InvalidKeyInput(format!(
                    "{} '{}' must not contain path separators",
                    field, value
                )));
            }
        }
        Ok(())
    }

    /// Key named by an existing entry directory
    pub fn from_digest(digest: &str) -> ShowcaseResult<Self> {
        if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ShowcaseError::InvalidKeyInput(format!(
                "'{}' is not a cache key",
                digest
            )));
        }
        Ok(Self(digest.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHA: &str = "deadbeefdeadbeefdeadbeefdeadbeefdeadbeef";

    #[test]
    fn key_deterministic() {
        let a = CacheKey::derive("acme", "theme", SHA).unwrap();
        let b = CacheKey::derive("acme", "theme", SHA).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn key_is_digest_of_joined_triple() {
        let key = CacheKey::derive("acme", "theme", SHA).unwrap();
        let expected = hex::encode(Sha256::digest(format!("acme/theme/{}", SHA)));
        assert_eq!(key.to_string(), expected);
    }

    #[test]
    fn key_differs_per_sha() {
        let a = CacheKey::derive("acme", "theme", SHA).unwrap();
        let b = CacheKey::derive("acme", "theme", "abc123abc123abc123abc123abc123abc123abc1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn key_differs_per_repo() {
        let a = CacheKey::derive("acme", "theme", SHA).unwrap();
        let b = CacheKey::derive("acme", "theme-dark", SHA).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn separators_in_names_rejected() {
        let err = CacheKey::derive("acme/theme", "dark", SHA).unwrap_err();
        assert!(matches!(err, ShowcaseError::InvalidKeyInput(_)));
        assert!(CacheKey::derive("acme", "..", SHA).is_err());
    }

    #[test]
    fn key_from_entry_name() {
        let key = CacheKey::derive("acme", "theme", SHA).unwrap();
        assert_eq!(CacheKey::from_digest(key.as_str()).unwrap(), key);
        assert!(CacheKey::from_digest("journal.log").is_err());
        assert!(CacheKey::from_digest(&format!("{}.retire", key)).is_err());
    }

    #[test]
    fn empty_parts_rejected() {
        for (org, repo, sha) in [("", "theme", SHA), ("acme", "", SHA), ("acme", "theme", "")] {
            let err = CacheKey::derive(org, repo, sha).unwrap_err();
            assert!(matches!(err, ShowcaseError::InvalidKeyInput(_)));
        }
    }
}
