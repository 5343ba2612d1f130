//! Persistent blob index: content hash to record location.
//!
//! The index is a derived cache over the data files; the data files stay
//! authoritative. Losing the index is never fatal, the recovery scan rebuilds
//! it from the records themselves.

use std::path::Path;

use cask_types::Hash;

use crate::error::{BlobError, BlobResult};

/// Reserved key for the recovery head marker. Hash keys are 20 bytes, so a
/// 5-byte key cannot collide.
const HEAD_KEY: &[u8] = b"!head";

/// Location of one blob record: `(file_number, offset, size, flags)`.
///
/// `size` is the full on-disk record length including the header; `flags`
/// mirrors the record's flag byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexEntry {
    pub file_number: u32,
    pub offset: u64,
    pub size: u32,
    pub flags: u8,
}

impl IndexEntry {
    /// Encode to the fixed 17-byte on-disk form.
    pub fn encode(&self) -> [u8; 17] {
        let mut buf = [0u8; 17];
        buf[0..4].copy_from_slice(&self.file_number.to_le_bytes());
        buf[4..12].copy_from_slice(&self.offset.to_le_bytes());
        buf[12..16].copy_from_slice(&self.size.to_le_bytes());
        buf[16] = self.flags;
        buf
    }

    /// Decode from the 17-byte on-disk form.
    pub fn decode(data: &[u8]) -> BlobResult<Self> {
        if data.len() != 17 {
            return Err(BlobError::InvalidArgument(format!(
                "index entry must be 17 bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            file_number: u32::from_le_bytes(data[0..4].try_into().expect("sized slice")),
            offset: u64::from_le_bytes(data[4..12].try_into().expect("sized slice")),
            size: u32::from_le_bytes(data[12..16].try_into().expect("sized slice")),
            flags: data[16],
        })
    }
}

/// Ordered on-disk map from [`Hash`] to [`IndexEntry`].
pub struct BlobIndex {
    db: sled::Db,
}

impl BlobIndex {
    /// Open (or create) the index database at `path`.
    pub fn open(path: &Path) -> BlobResult<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Record the location of a blob.
    ///
    /// Idempotent: an existing entry for `hash` wins, since blobs are
    /// immutable by hash.
    pub fn put(&self, hash: &Hash, entry: &IndexEntry) -> BlobResult<()> {
        if self.db.get(hash.as_bytes())?.is_some() {
            return Ok(());
        }
        self.db.insert(hash.as_bytes(), &entry.encode()[..])?;
        Ok(())
    }

    /// Look up the location of a blob.
    pub fn get(&self, hash: &Hash) -> BlobResult<Option<IndexEntry>> {
        match self.db.get(hash.as_bytes())? {
            Some(raw) => Ok(Some(IndexEntry::decode(&raw)?)),
            None => Ok(None),
        }
    }

    /// Check whether a blob is indexed.
    pub fn has(&self, hash: &Hash) -> BlobResult<bool> {
        Ok(self.db.get(hash.as_bytes())?.is_some())
    }

    /// All indexed hashes, in hash order.
    pub fn hashes(&self) -> BlobResult<Vec<Hash>> {
        let mut hashes = Vec::new();
        for item in self.db.iter() {
            let (key, _) = item?;
            if key.len() != 20 {
                continue;
            }
            let mut raw = [0u8; 20];
            raw.copy_from_slice(&key);
            hashes.push(Hash::from_raw(raw));
        }
        Ok(hashes)
    }

    /// All index entries, in hash order.
    pub fn entries(&self) -> BlobResult<Vec<(Hash, IndexEntry)>> {
        let mut entries = Vec::new();
        for item in self.db.iter() {
            let (key, value) = item?;
            if key.len() != 20 {
                continue;
            }
            let mut raw = [0u8; 20];
            raw.copy_from_slice(&key);
            entries.push((Hash::from_raw(raw), IndexEntry::decode(&value)?));
        }
        Ok(entries)
    }

    /// Number of indexed blobs.
    pub fn len(&self) -> BlobResult<usize> {
        let mut count = 0;
        for item in self.db.iter() {
            let (key, _) = item?;
            if key.len() == 20 {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Returns `true` if no blob is indexed.
    pub fn is_empty(&self) -> BlobResult<bool> {
        Ok(self.len()? == 0)
    }

    /// The recovery head: `(newest file number, bytes scanned)` at the time
    /// the index was last known to match the data files.
    pub fn head(&self) -> BlobResult<Option<(u32, u64)>> {
        match self.db.get(HEAD_KEY)? {
            Some(raw) if raw.len() == 12 => {
                let number = u32::from_le_bytes(raw[0..4].try_into().expect("sized slice"));
                let size = u64::from_le_bytes(raw[4..12].try_into().expect("sized slice"));
                Ok(Some((number, size)))
            }
            _ => Ok(None),
        }
    }

    /// Update the recovery head.
    pub fn set_head(&self, file_number: u32, size: u64) -> BlobResult<()> {
        let mut buf = [0u8; 12];
        buf[0..4].copy_from_slice(&file_number.to_le_bytes());
        buf[4..12].copy_from_slice(&size.to_le_bytes());
        self.db.insert(HEAD_KEY, &buf[..])?;
        Ok(())
    }

    /// Flush the index to disk.
    pub fn flush(&self) -> BlobResult<()> {
        self.db.flush()?;
        Ok(())
    }
}
