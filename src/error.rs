//! Error types shared by the decay engine and its backing stores.

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Storage backend failure: {0}")]
    Storage(#[from] StorageError),
}

/// Failures raised by a durable backing store.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
    #[error("Invalid checksum for chunk table: expected {expected:#010x}, found {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },
    #[error("Compression error: {0}")]
    Compression(String),
    #[error("Unsupported chunk table format version: {0}")]
    UnsupportedFormat(u16),
    #[error("File is not a chunk table")]
    BadMagic,
    #[error("Chunk {key} has heat or tier out of range")]
    InvalidRecord { key: String },
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Storage(StorageError::Io(err))
    }
}
