use cask_types::Hash;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob not found: {0}")]
    NotFound(Hash),

    #[error("corrupt blob {hash}: stored bytes hash to {computed}")]
    CorruptBlob { hash: Hash, computed: Hash },

    #[error("hash mismatch: supplied bytes hash to {computed}, not {expected}")]
    HashMismatch { expected: Hash, computed: Hash },

    #[error("corrupt record in file {file_number} at offset {offset}: {reason}")]
    CorruptRecord {
        file_number: u32,
        offset: u64,
        reason: String,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("store is closed")]
    Closed,

    #[error("store is write-only")]
    WriteOnly,

    #[error("compression failed: {0}")]
    Compression(String),

    #[error("index error: {0}")]
    Index(#[from] sled::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type BlobResult<T> = Result<T, BlobError>;
