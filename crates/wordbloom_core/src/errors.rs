use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BloomError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Persist: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Bit vector size must be at least one bit")]
    InvalidSize,

    #[error("Bit index {index} out of range for {bit_count} bits")]
    IndexOutOfRange { index: u64, bit_count: u64 },

    #[error("Expected {expected} bytes, found {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("Corpus unavailable at {}: {source}", path.display())]
    CorpusUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, BloomError>;
