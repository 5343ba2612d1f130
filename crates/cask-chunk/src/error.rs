use cask_blobs::BlobError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("blob store error: {0}")]
    Blob(#[from] BlobError),

    #[error("invalid manifest: {0}")]
    InvalidManifest(String),
}

pub type ChunkResult<T> = Result<T, ChunkError>;
