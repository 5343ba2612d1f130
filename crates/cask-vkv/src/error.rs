use thiserror::Error;

#[derive(Debug, Error)]
pub enum VkvError {
    #[error("key not found: {0}")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("corrupt entry: {0}")]
    Corrupt(String),

    #[error("store is closed")]
    Closed,

    #[error("backend error: {0}")]
    Backend(#[from] sled::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type VkvResult<T> = Result<T, VkvError>;
