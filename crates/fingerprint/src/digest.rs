//! SHA-256 digests in their hex form

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a hex-encoded SHA-256 digest
pub const DIGEST_HEX_LEN: usize = 64;

/// A SHA-256 digest as a lowercase hex string
///
/// Digests are used as content-addressed store keys, so the string form is
/// the canonical one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest(String);

impl Digest {
    /// Wrap raw hash output
    pub(crate) fn from_bytes(bytes: impl AsRef<[u8]>) -> Self {
        Self(hex::encode(bytes))
    }

    /// Create from hex string (validation)
    ///
    /// # Errors
    ///
    /// Returns error if the hex string is invalid or wrong length
    pub fn from_hex(hex: impl Into<String>) -> Result<Self> {
        let s = hex.into();
        if s.len() != DIGEST_HEX_LEN {
            return Err(Error::invalid_digest(format!(
                "expected {DIGEST_HEX_LEN} hex characters, got {}",
                s.len()
            )));
        }
        if !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::invalid_digest("must contain only hex digits"));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// Get the hex representation
    #[must_use]
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Digest {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(value)
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_from_hex_valid() {
        let hex = "a".repeat(64);
        let digest = Digest::from_hex(hex.clone()).unwrap();
        assert_eq!(digest.as_hex(), hex);
        assert_eq!(digest.to_string(), hex);
    }

    #[test]
    fn test_digest_from_hex_normalizes_case() {
        let digest = Digest::from_hex("AB".repeat(32)).unwrap();
        assert_eq!(digest.as_hex(), "ab".repeat(32));
    }

    #[test]
    fn test_digest_validation() {
        assert!(Digest::from_hex("abc").is_err());
        assert!(Digest::from_hex("g".repeat(64)).is_err());
    }

    #[test]
    fn test_digest_serde() {
        let digest = Digest::from_hex("0f".repeat(32)).unwrap();
        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(json, format!("\"{}\"", "0f".repeat(32)));

        let parsed: Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, digest);

        let bad: std::result::Result<Digest, _> = serde_json::from_str("\"nothex\"");
        assert!(bad.is_err());
    }
}
