use cask_types::Hash;

use crate::engine::BlobStore;
use crate::error::BlobResult;

/// Content-addressed blob storage.
///
/// This is the complete surface higher layers see; data files are never
/// addressed by number from outside. All implementations must satisfy:
/// - Blobs are immutable once written; a hash always resolves to the same
///   bytes.
/// - `put` is idempotent: storing an already-stored hash is a successful
///   no-op.
/// - A hash visible through `stat` or `enumerate` is readable through `get`
///   (unless the store is write-only).
/// - All I/O errors are propagated, never silently ignored.
pub trait BlobHandler: Send + Sync {
    /// Store `data` under `hash`.
    ///
    /// Fails with a hash mismatch when `hash` is not the SHA-1 of `data`.
    fn put(&self, hash: &Hash, data: &[u8]) -> BlobResult<()>;

    /// Fetch the blob stored under `hash`.
    ///
    /// Fails with not-found for an unknown hash, and with a corruption
    /// error when the stored bytes no longer hash to `hash`.
    fn get(&self, hash: &Hash) -> BlobResult<Vec<u8>>;

    /// Check whether `hash` is stored, without reading its bytes.
    fn stat(&self, hash: &Hash) -> BlobResult<bool>;

    /// All stored hashes, in hash order.
    fn enumerate(&self) -> BlobResult<Vec<Hash>>;
}

impl BlobHandler for BlobStore {
    fn put(&self, hash: &Hash, data: &[u8]) -> BlobResult<()> {
        BlobStore::put(self, hash, data)
    }

    fn get(&self, hash: &Hash) -> BlobResult<Vec<u8>> {
        BlobStore::get(self, hash)
    }

    fn stat(&self, hash: &Hash) -> BlobResult<bool> {
        BlobStore::stat(self, hash)
    }

    fn enumerate(&self) -> BlobResult<Vec<Hash>> {
        BlobStore::enumerate(self)
    }
}
