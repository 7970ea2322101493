//! Storage backend trait definition.

use crate::error::StorageResult;

/// An append-only byte store holding the commit log of a [`crate::Store`].
///
/// Backends are **opaque**: they never interpret the bytes they hold. The
/// store frames, checksums and replays commit records on top of them.
///
/// # Invariants
///
/// - `append` returns the offset where data was written
/// - `read_at` returns exactly the bytes previously written at that offset
/// - `sync` makes every appended byte durable
pub trait StorageBackend: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::ReadPastEnd`] if the range extends
    /// beyond the current size, or an I/O error.
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Appends data to the end of the storage, returning its offset.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Pushes buffered writes to the operating system.
    fn flush(&mut self) -> StorageResult<()>;

    /// Forces data and metadata to durable storage.
    fn sync(&mut self) -> StorageResult<()>;

    /// Returns the current size in bytes; the offset of the next `append`.
    fn size(&self) -> StorageResult<u64>;

    /// Discards everything after `new_size`.
    ///
    /// Used to drop a torn commit record left by a crash mid-append.
    ///
    /// # Errors
    ///
    /// Fails if `new_size` is greater than the current size.
    fn truncate(&mut self, new_size: u64) -> StorageResult<()>;
}
