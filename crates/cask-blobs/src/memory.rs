use std::collections::BTreeMap;
use std::sync::RwLock;

use cask_types::Hash;

use crate::error::{BlobError, BlobResult};
use crate::traits::BlobHandler;

/// In-memory blob store for tests and embedding.
///
/// Blobs live in a `BTreeMap` behind a `RwLock`, so enumeration comes out in
/// hash order for free. Data is lost when the store is dropped.
pub struct InMemoryBlobStore {
    blobs: RwLock<BTreeMap<Hash, Vec<u8>>>,
}

impl InMemoryBlobStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobHandler for InMemoryBlobStore {
    fn put(&self, hash: &Hash, data: &[u8]) -> BlobResult<()> {
        let computed = Hash::compute(data);
        if computed != *hash {
            return Err(BlobError::HashMismatch {
                expected: *hash,
                computed,
            });
        }
        let mut blobs = self.blobs.write().expect("lock poisoned");
        blobs.entry(*hash).or_insert_with(|| data.to_vec());
        Ok(())
    }

    fn get(&self, hash: &Hash) -> BlobResult<Vec<u8>> {
        let blobs = self.blobs.read().expect("lock poisoned");
        blobs.get(hash).cloned().ok_or(BlobError::NotFound(*hash))
    }

    fn stat(&self, hash: &Hash) -> BlobResult<bool> {
        let blobs = self.blobs.read().expect("lock poisoned");
        Ok(blobs.contains_key(hash))
    }

    fn enumerate(&self) -> BlobResult<Vec<Hash>> {
        let blobs = self.blobs.read().expect("lock poisoned");
        Ok(blobs.keys().copied().collect())
    }
}
