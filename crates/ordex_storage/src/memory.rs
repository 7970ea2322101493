//! In-memory storage backend.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use std::io;

/// A commit log kept entirely in memory.
///
/// Backs [`crate::Store::open_in_memory`]. Nothing survives the process,
/// but replay works the same way as for files, so the log can be copied
/// out with [`InMemoryBackend::data`] and handed to a new store to
/// exercise recovery.
#[derive(Debug, Default, Clone)]
pub struct InMemoryBackend {
    log: Vec<u8>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend preloaded with an existing commit log.
    #[must_use]
    pub fn with_data(log: Vec<u8>) -> Self {
        Self { log }
    }

    /// Returns a copy of the raw log bytes.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.log.clone()
    }
}

impl StorageBackend for InMemoryBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let size = self.log.len() as u64;
        let range = usize::try_from(offset)
            .ok()
            .and_then(|start| Some(start..start.checked_add(len)?));
        match range.and_then(|r| self.log.get(r)) {
            Some(bytes) => Ok(bytes.to_vec()),
            None => Err(StorageError::ReadPastEnd { offset, len, size }),
        }
    }

    fn append(&mut self, bytes: &[u8]) -> StorageResult<u64> {
        let offset = self.log.len() as u64;
        self.log.extend_from_slice(bytes);
        Ok(offset)
    }

    // nothing is buffered
    fn flush(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.log.len() as u64)
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        match usize::try_from(new_size) {
            Ok(keep) if keep <= self.log.len() => {
                self.log.truncate(keep);
                Ok(())
            }
            _ => Err(StorageError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "cannot grow an in-memory log from {} to {new_size} bytes",
                    self.log.len()
                ),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_returns_offsets() {
        let mut backend = InMemoryBackend::new();
        assert_eq!(backend.append(b"abc").unwrap(), 0);
        assert_eq!(backend.append(b"defg").unwrap(), 3);
        assert_eq!(backend.size().unwrap(), 7);
    }

    #[test]
    fn read_back_slices() {
        let backend = InMemoryBackend::with_data(b"commit log".to_vec());
        assert_eq!(backend.read_at(0, 6).unwrap(), b"commit");
        assert_eq!(backend.read_at(7, 3).unwrap(), b"log");
        assert!(backend.read_at(8, 0).unwrap().is_empty());
    }

    #[test]
    fn read_past_end_fails() {
        let backend = InMemoryBackend::with_data(b"short".to_vec());
        assert!(matches!(
            backend.read_at(3, 10),
            Err(StorageError::ReadPastEnd { .. })
        ));
        assert!(matches!(
            backend.read_at(9, 1),
            Err(StorageError::ReadPastEnd { .. })
        ));
    }

    #[test]
    fn truncate_drops_tail() {
        let mut backend = InMemoryBackend::with_data(b"good|torn".to_vec());
        backend.truncate(4).unwrap();
        assert_eq!(backend.data(), b"good");
        assert!(backend.truncate(10).is_err());
    }
}
