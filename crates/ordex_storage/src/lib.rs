//! # Ordex Storage
//!
//! The ordered key-value store underneath Ordex indexes.
//!
//! A [`Store`] holds named **buckets**, each an independently ordered map
//! from byte keys to byte values. Access happens inside transactions:
//!
//! - [`ReadTxn`]: a snapshot of the last commit, never blocked by writers
//! - [`WriteTxn`]: the single writer; commits atomically or not at all
//!
//! Inside a transaction, buckets are reached through the [`ReadBucket`]
//! and [`WriteBucket`] traits, which offer `get`, `put`, `delete` and a
//! [`Cursor`] with `first`, `seek`, `next`, `seek_last` and `prev`.
//!
//! ## Durability
//!
//! Each commit is appended as one checksummed record to a
//! [`StorageBackend`]. Opening a store replays the log; a torn record at
//! the tail (a crash mid-append) is dropped.
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral stores
//! - [`FileBackend`] - A single locked file on disk

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod bucket;
mod config;
mod error;
mod file;
pub mod log;
mod memory;
mod store;

pub use backend::StorageBackend;
pub use bucket::{Bucket, BucketMut, Cursor, Entry, ReadBucket, WriteBucket};
pub use config::{StoreConfig, DEFAULT_MAX_KEY_SIZE};
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use log::{CommitLog, LogEntry, LogOp, ReplayStats};
pub use memory::InMemoryBackend;
pub use store::{ReadTxn, Store, WriteTxn};
