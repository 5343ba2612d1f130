//! Content-defined chunking over the cask blob store.
//!
//! Large opaque payloads are split at content-defined boundaries, each chunk
//! stored as a blob, and the ordered list of chunk hashes stored as a
//! manifest blob. Edits to a large payload then share the unchanged chunks
//! with earlier revisions. The blob engine does not require any of this; the
//! chunker lives entirely on the caller's side of the [`BlobHandler`]
//! contract.
//!
//! [`BlobHandler`]: cask_blobs::BlobHandler

pub mod chunker;
pub mod error;
pub mod manifest;

pub use chunker::Chunker;
pub use error::{ChunkError, ChunkResult};
pub use manifest::{assemble, store_chunked, Manifest, SINGLE_BLOB_THRESHOLD};
