//! Chunk manifests: the ordered list of chunk hashes for one payload.
//!
//! A manifest is itself stored as a blob, so the data model stays closed
//! under content addressing: a single hash names an arbitrarily large
//! payload.

use cask_blobs::BlobHandler;
use cask_types::Hash;
use serde::{Deserialize, Serialize};

use crate::chunker::Chunker;
use crate::error::{ChunkError, ChunkResult};

/// Payloads at or below this size are stored as a single chunk; chunking
/// only pays off once edits can share pieces.
pub const SINGLE_BLOB_THRESHOLD: usize = 512 * 1024;

/// Ordered list of chunk hashes reassembling one payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub chunks: Vec<Hash>,
}

impl Manifest {
    /// Serialize for storage as a blob.
    pub fn to_bytes(&self) -> ChunkResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| ChunkError::InvalidManifest(e.to_string()))
    }

    /// Parse a stored manifest blob.
    pub fn from_bytes(data: &[u8]) -> ChunkResult<Self> {
        serde_json::from_slice(data).map_err(|e| ChunkError::InvalidManifest(e.to_string()))
    }
}

/// Chunk `payload`, store every chunk and the manifest, and return the
/// manifest's hash.
///
/// Payloads at or below [`SINGLE_BLOB_THRESHOLD`] become a single chunk.
pub fn store_chunked(
    store: &dyn BlobHandler,
    payload: &[u8],
    chunker: &Chunker,
) -> ChunkResult<Hash> {
    let chunks: Vec<&[u8]> = if payload.len() <= SINGLE_BLOB_THRESHOLD {
        vec![payload]
    } else {
        chunker.split(payload)
    };

    let mut manifest = Manifest {
        chunks: Vec::with_capacity(chunks.len()),
    };
    for chunk in chunks {
        let hash = Hash::compute(chunk);
        store.put(&hash, chunk)?;
        manifest.chunks.push(hash);
    }

    let bytes = manifest.to_bytes()?;
    let manifest_hash = Hash::compute(&bytes);
    store.put(&manifest_hash, &bytes)?;
    Ok(manifest_hash)
}

/// Reassemble a payload from its manifest hash.
pub fn assemble(store: &dyn BlobHandler, manifest_hash: &Hash) -> ChunkResult<Vec<u8>> {
    let manifest = Manifest::from_bytes(&store.get(manifest_hash)?)?;
    let mut payload = Vec::new();
    for hash in &manifest.chunks {
        payload.extend_from_slice(&store.get(hash)?);
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cask_blobs::InMemoryBlobStore;

    fn test_chunker() -> Chunker {
        Chunker::new(64, 8, 1024)
    }

    fn pseudo_random(len: usize, mut state: u64) -> Vec<u8> {
        let mut out = Vec::with_capacity(len);
        while out.len() < len {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            out.extend_from_slice(&state.to_le_bytes());
        }
        out.truncate(len);
        out
    }

    #[test]
    fn manifest_roundtrip() {
        let manifest = Manifest {
            chunks: vec![Hash::compute(b"a"), Hash::compute(b"b")],
        };
        let parsed = Manifest::from_bytes(&manifest.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed, manifest);
    }

    #[test]
    fn malformed_manifest_is_rejected() {
        assert!(matches!(
            Manifest::from_bytes(b"not json").unwrap_err(),
            ChunkError::InvalidManifest(_)
        ));
    }

    #[test]
    fn small_payload_is_a_single_chunk() {
        let store = InMemoryBlobStore::new();
        let payload = b"well under the threshold".to_vec();

        let manifest_hash = store_chunked(&store, &payload, &test_chunker()).unwrap();
        let manifest = Manifest::from_bytes(&store.get(&manifest_hash).unwrap()).unwrap();
        assert_eq!(manifest.chunks, vec![Hash::compute(&payload)]);
        assert_eq!(assemble(&store, &manifest_hash).unwrap(), payload);
    }

    #[test]
    fn large_payload_roundtrips_through_chunks() {
        let store = InMemoryBlobStore::new();
        let payload = pseudo_random(SINGLE_BLOB_THRESHOLD + 200_000, 42);

        let manifest_hash = store_chunked(&store, &payload, &test_chunker()).unwrap();
        let manifest = Manifest::from_bytes(&store.get(&manifest_hash).unwrap()).unwrap();
        assert!(manifest.chunks.len() > 1);
        assert_eq!(assemble(&store, &manifest_hash).unwrap(), payload);
    }

    #[test]
    fn shared_content_shares_chunks() {
        let store = InMemoryBlobStore::new();
        let base = pseudo_random(SINGLE_BLOB_THRESHOLD + 100_000, 7);
        let mut extended = base.clone();
        extended.extend_from_slice(b"trailing edit that leaves the prefix alone");

        let base_hash = store_chunked(&store, &base, &test_chunker()).unwrap();
        let base_manifest = Manifest::from_bytes(&store.get(&base_hash).unwrap()).unwrap();
        let before = store.len();
        store_chunked(&store, &extended, &test_chunker()).unwrap();

        // The extended payload reuses the base's prefix chunks; only the
        // tail and the new manifest are new blobs.
        let added = store.len() - before;
        assert!(added < base_manifest.chunks.len() / 2);
    }

    #[test]
    fn empty_payload_roundtrips() {
        let store = InMemoryBlobStore::new();
        let manifest_hash = store_chunked(&store, b"", &test_chunker()).unwrap();
        assert_eq!(assemble(&store, &manifest_hash).unwrap(), b"");
    }

    #[test]
    fn assemble_unknown_manifest_fails() {
        let store = InMemoryBlobStore::new();
        let err = assemble(&store, &Hash::compute(b"missing")).unwrap_err();
        assert!(matches!(err, ChunkError::Blob(_)));
    }
}
