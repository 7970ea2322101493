//! Error types for Ordex core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in index and key operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage or transaction error, passed through unchanged.
    #[error("storage error: {0}")]
    Storage(#[from] ordex_storage::StorageError),

    /// A value key was empty.
    #[error("invalid index key: value key must not be empty")]
    InvalidIndexKey,

    /// An item key was not exactly 16 bytes.
    #[error("invalid item key: expected 16 bytes, got {len}")]
    InvalidItemKey {
        /// Length of the rejected key.
        len: usize,
    },

    /// A unique index already maps the value to a different item.
    #[error("value already indexed to item {existing} in {index}")]
    AlreadyExists {
        /// Name of the index bucket.
        index: String,
        /// Display form of the item currently holding the value.
        existing: String,
    },

    /// Input to the numeric encoder was not an integer.
    #[error("not numeric: {type_name}")]
    NotNumeric {
        /// Type name of the rejected value.
        type_name: &'static str,
    },

    /// An encoded number had the wrong width.
    #[error("invalid number encoding: expected 8 bytes, got {len}")]
    InvalidNumber {
        /// Length of the rejected input.
        len: usize,
    },

    /// Text could not be parsed as an item key.
    #[error("invalid item key text: {text}")]
    InvalidKeyText {
        /// The rejected text.
        text: String,
    },

    /// Record key generation failed.
    #[error("key generation failed: {message}")]
    KeyGeneration {
        /// Description of the failure.
        message: String,
    },

    /// A named index does not exist.
    #[error("index not found: {name}")]
    IndexNotFound {
        /// Name of the missing index bucket.
        name: String,
    },
}

impl CoreError {
    /// Creates an invalid item key error.
    pub fn invalid_item_key(len: usize) -> Self {
        Self::InvalidItemKey { len }
    }

    /// Creates a unique-index conflict error.
    pub fn already_exists(index: &[u8], existing: &[u8]) -> Self {
        Self::AlreadyExists {
            index: String::from_utf8_lossy(index).into_owned(),
            existing: crate::key::key_to_string(existing),
        }
    }

    /// Creates a key generation error.
    pub fn key_generation(message: impl Into<String>) -> Self {
        Self::KeyGeneration {
            message: message.into(),
        }
    }

    /// Creates an index not found error from a raw bucket name.
    pub fn index_not_found(name: &[u8]) -> Self {
        Self::IndexNotFound {
            name: String::from_utf8_lossy(name).into_owned(),
        }
    }

    /// Returns true for a unique-index conflict.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}
