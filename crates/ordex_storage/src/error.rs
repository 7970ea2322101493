//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Attempted to read beyond the end of storage.
    #[error("read beyond end of storage: offset {offset}, len {len}, size {size}")]
    ReadPastEnd {
        /// The requested read offset.
        offset: u64,
        /// The requested read length.
        len: usize,
        /// The current storage size.
        size: u64,
    },

    /// The commit log could not be decoded.
    #[error("storage corrupted: {0}")]
    Corrupted(String),

    /// Another process holds the store file.
    #[error("store locked: another process has exclusive access to {0}")]
    Locked(PathBuf),

    /// The store file does not exist and creation was disabled.
    #[error("store not found: {0}")]
    NotFound(PathBuf),

    /// The named bucket does not exist.
    #[error("bucket not found: {name}")]
    BucketNotFound {
        /// Display form of the bucket name.
        name: String,
    },

    /// A bucket with this name already exists.
    #[error("bucket already exists: {name}")]
    BucketExists {
        /// Display form of the bucket name.
        name: String,
    },

    /// Bucket names must be non-empty.
    #[error("invalid bucket name")]
    InvalidBucketName,

    /// Keys written to a bucket must be non-empty.
    #[error("key must not be empty")]
    EmptyKey,

    /// Key exceeds the configured maximum size.
    #[error("key too large: {len} bytes exceeds maximum of {max}")]
    KeyTooLarge {
        /// Length of the rejected key.
        len: usize,
        /// Configured maximum.
        max: usize,
    },
}

impl StorageError {
    /// Creates a corruption error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted(message.into())
    }

    /// Creates a bucket-not-found error from a raw bucket name.
    pub fn bucket_not_found(name: &[u8]) -> Self {
        Self::BucketNotFound {
            name: String::from_utf8_lossy(name).into_owned(),
        }
    }

    /// Creates a bucket-exists error from a raw bucket name.
    pub fn bucket_exists(name: &[u8]) -> Self {
        Self::BucketExists {
            name: String::from_utf8_lossy(name).into_owned(),
        }
    }
}
