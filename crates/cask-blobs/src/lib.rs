//! Append-only, content-addressed blob storage for the cask stack.
//!
//! Blobs are immutable byte sequences identified by their SHA-1. They are
//! packed into a rotating family of append-only data files and located
//! through a derived on-disk index.
//!
//! # Architecture
//!
//! - **Data files** (`blobs-%05d`): sequences of magic-prefixed records,
//!   optionally Snappy-compressed. Strictly append-only until sealed by
//!   rotation; authoritative for payload and recovery.
//! - **Index** (`index/`): ordered map from hash to `(file, offset, size)`.
//!   Authoritative for lookup, rebuildable by scanning the data files.
//! - **[`BlobStore`]**: put/get/stat/enumerate over the two, with crash
//!   recovery on open.
//! - **[`BlobHandler`]**: the trait higher layers consume;
//!   [`InMemoryBlobStore`] implements it for tests and embedding.

pub mod config;
pub mod engine;
pub mod error;
pub mod files;
pub mod index;
pub mod memory;
pub mod record;
pub mod traits;

pub use config::{BlobsConfig, SyncMode};
pub use engine::BlobStore;
pub use error::{BlobError, BlobResult};
pub use index::{BlobIndex, IndexEntry};
pub use memory::InMemoryBlobStore;
pub use traits::BlobHandler;
