//! Binary key codec for the shared byte-ordered namespace.
//!
//! Every key in the backing database starts with a namespace tag:
//!
//! ```text
//! 0x02 ‖ submeta-tag ‖ user-key                        meta (per-key counters)
//! 0x03 ‖ user-key                                      key-existence index
//! 0x04 ‖ u32-LE(len(user-key)) ‖ user-key ‖ u64-BE(v)  versioned item
//! ```
//!
//! The version suffix is big-endian so a lexicographic scan over one key's
//! items yields ascending version order. The embedded length prefix is
//! little-endian; it never affects ordering because all items of one key
//! share it.

use crate::error::{VkvError, VkvResult};

/// Namespace tag for per-key metadata.
pub const META: u8 = 0x02;
/// Namespace tag for the key-existence index.
pub const KEY_INDEX: u8 = 0x03;
/// Namespace tag for versioned items.
pub const ITEM: u8 = 0x04;
/// Submeta tag for the per-key version count.
pub const VERSION_COUNT: u8 = 0x05;
/// Submeta tag for the per-key minimum version.
pub const VERSION_MIN: u8 = 0x06;
/// Submeta tag for the per-key maximum version.
pub const VERSION_MAX: u8 = 0x07;

/// Encode the raw key of one `(user key, version)` item.
pub fn encode_item(key: &[u8], version: u64) -> Vec<u8> {
    let mut raw = Vec::with_capacity(13 + key.len());
    raw.push(ITEM);
    raw.extend_from_slice(&(key.len() as u32).to_le_bytes());
    raw.extend_from_slice(key);
    raw.extend_from_slice(&version.to_be_bytes());
    raw
}

/// Decode a raw item key back into `(user key, version)`.
pub fn decode_item(raw: &[u8]) -> VkvResult<(Vec<u8>, u64)> {
    if raw.len() < 13 || raw[0] != ITEM {
        return Err(VkvError::InvalidArgument(format!(
            "malformed item key of {} bytes",
            raw.len()
        )));
    }
    let key_len = u32::from_le_bytes(raw[1..5].try_into().expect("sized slice")) as usize;
    if raw.len() != 13 + key_len {
        return Err(VkvError::InvalidArgument(format!(
            "item key length prefix {key_len} does not match {} raw bytes",
            raw.len()
        )));
    }
    let key = raw[5..5 + key_len].to_vec();
    let version = u64::from_be_bytes(raw[5 + key_len..].try_into().expect("sized slice"));
    Ok((key, version))
}

/// Encode a per-key metadata key under the given submeta tag.
pub fn encode_meta(sub_tag: u8, key: &[u8]) -> Vec<u8> {
    let mut raw = Vec::with_capacity(2 + key.len());
    raw.push(META);
    raw.push(sub_tag);
    raw.extend_from_slice(key);
    raw
}

/// Encode a key-existence index key.
pub fn encode_index(key: &[u8]) -> Vec<u8> {
    let mut raw = Vec::with_capacity(1 + key.len());
    raw.push(KEY_INDEX);
    raw.extend_from_slice(key);
    raw
}
