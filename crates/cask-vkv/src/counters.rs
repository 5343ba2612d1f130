//! Per-key counters stored as little-endian u64 values.
//!
//! Versions are nanosecond timestamps, so the counters are 64-bit from the
//! start. Callers serialize read-modify-write cycles under the engine write
//! mutex; nothing here locks.

use crate::error::{VkvError, VkvResult};

/// Read a stored u64. A missing key reads as 0.
pub fn get_u64(tree: &sled::Tree, key: &[u8]) -> VkvResult<u64> {
    match tree.get(key)? {
        None => Ok(0),
        Some(raw) => {
            let bytes: [u8; 8] = raw.as_ref().try_into().map_err(|_| {
                VkvError::Corrupt(format!("counter value of {} bytes, expected 8", raw.len()))
            })?;
            Ok(u64::from_le_bytes(bytes))
        }
    }
}

/// Store a u64.
pub fn put_u64(tree: &sled::Tree, key: &[u8], value: u64) -> VkvResult<()> {
    tree.insert(key, &value.to_le_bytes()[..])?;
    Ok(())
}

/// Increment a stored u64 by `step`, returning the new value.
pub fn incr_u64(tree: &sled::Tree, key: &[u8], step: u64) -> VkvResult<u64> {
    let next = get_u64(tree, key)? + step;
    put_u64(tree, key, next)?;
    Ok(next)
}
