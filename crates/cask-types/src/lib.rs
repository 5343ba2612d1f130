//! Shared primitive types for the cask storage stack.
//!
//! The central type is [`Hash`], the SHA-1 content identity under which every
//! blob is stored. Identical bytes always produce the same hash, so blobs are
//! deduplicatable and verifiable by construction.

pub mod error;
pub mod hash;

pub use error::TypeError;
pub use hash::Hash;
