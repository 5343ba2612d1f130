use serde::{Deserialize, Serialize};

/// One key-value pair at one version (the creation timestamp).
///
/// Keys are raw bytes; the engine never interprets them beyond their byte
/// order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    /// The user key; empty when stripped from a per-key history listing.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key: Vec<u8>,
    /// Opaque value bytes; an empty value marks a deletion.
    pub value: Vec<u8>,
    /// Version timestamp, UTC nanoseconds by convention.
    pub version: u64,
}

impl KeyValue {
    /// Create a new key-value triple.
    pub fn new(key: impl Into<Vec<u8>>, value: Vec<u8>, version: u64) -> Self {
        Self {
            key: key.into(),
            value,
            version,
        }
    }

    /// Returns `true` if this version is a deletion marker.
    pub fn is_tombstone(&self) -> bool {
        self.value.is_empty()
    }
}

/// The (partial) version history of one key, ascending by version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValueVersions {
    /// The user key.
    pub key: Vec<u8>,
    /// Versions in ascending order; entries carry an empty key.
    pub versions: Vec<KeyValue>,
}
