use std::fmt;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::error::TypeError;

/// Content-addressed identity of a blob.
///
/// A `Hash` is the SHA-1 of a blob's bytes, rendered as 40 lowercase hex
/// characters. Identical content always produces the same `Hash`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hash([u8; 20]);

impl Hash {
    /// Compute the hash of raw bytes.
    pub fn compute(data: &[u8]) -> Self {
        let digest = Sha1::digest(data);
        let mut raw = [0u8; 20];
        raw.copy_from_slice(digest.as_slice());
        Self(raw)
    }

    /// Create a `Hash` from a pre-computed digest.
    pub fn from_raw(raw: [u8; 20]) -> Self {
        Self(raw)
    }

    /// The raw 20-byte digest.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Full 40-character lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex rendering (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a 40-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 20 {
            return Err(TypeError::InvalidLength {
                expected: 20,
                actual: bytes.len(),
            });
        }
        let mut raw = [0u8; 20];
        raw.copy_from_slice(&bytes);
        Ok(Self(raw))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.short_hex())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 20]> for Hash {
    fn from(raw: [u8; 20]) -> Self {
        Self(raw)
    }
}

impl From<Hash> for [u8; 20] {
    fn from(hash: Hash) -> Self {
        hash.0
    }
}
