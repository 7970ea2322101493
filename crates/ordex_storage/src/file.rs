//! File-based storage backend.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use fs2::FileExt;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A commit log stored in a single OS file.
///
/// The file is held under an exclusive advisory lock for the lifetime of
/// the backend, so a second process (or a second `Store` in the same
/// process) opening the same path fails with [`StorageError::Locked`].
///
/// Appends go straight to the file. `sync()` calls `File::sync_all()`.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    // reads seek the shared handle, so they serialize on this lock
    log: Mutex<LogFile>,
}

#[derive(Debug)]
struct LogFile {
    file: File,
    len: u64,
}

impl FileBackend {
    /// Opens the log at `path`, creating it if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or is locked.
    pub fn open(path: &Path) -> StorageResult<Self> {
        Self::lock_and_open(path, true)
    }

    /// Opens an existing log, failing with [`StorageError::NotFound`] if
    /// there is none.
    pub fn open_existing(path: &Path) -> StorageResult<Self> {
        Self::lock_and_open(path, false)
    }

    /// Opens or creates the log, creating parent directories if needed.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    fn lock_and_open(path: &Path, create: bool) -> StorageResult<Self> {
        let mut options = OpenOptions::new();
        options.read(true).write(true).create(create).truncate(false);

        let file = options.open(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound if !create => StorageError::NotFound(path.to_path_buf()),
            _ => StorageError::Io(err),
        })?;
        file.try_lock_exclusive()
            .map_err(|_| StorageError::Locked(path.to_path_buf()))?;

        let len = file.metadata()?.len();
        Ok(Self {
            path: path.to_path_buf(),
            log: Mutex::new(LogFile { file, len }),
        })
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageBackend for FileBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let mut log = self.log.lock();
        let size = log.len;
        if offset.checked_add(len as u64).map_or(true, |end| end > size) {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }

        let mut buf = vec![0u8; len];
        if len > 0 {
            log.file.seek(SeekFrom::Start(offset))?;
            log.file.read_exact(&mut buf)?;
        }
        Ok(buf)
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        let log = self.log.get_mut();
        let offset = log.len;
        if !data.is_empty() {
            log.file.seek(SeekFrom::Start(offset))?;
            log.file.write_all(data)?;
            log.len += data.len() as u64;
        }
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.log.get_mut().file.flush()?;
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.log.get_mut().file.sync_all()?;
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.log.lock().len)
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        let log = self.log.get_mut();
        if new_size > log.len {
            return Err(StorageError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "cannot grow {} from {} to {new_size} bytes",
                    self.path.display(),
                    log.len
                ),
            )));
        }

        log.file.set_len(new_size)?;
        log.file.sync_all()?;
        log.len = new_size;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn creates_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.oxl");

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.size().unwrap(), 0);
        assert!(path.exists());
        assert_eq!(backend.path(), path);
    }

    #[test]
    fn open_existing_requires_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.oxl");

        let result = FileBackend::open_existing(&path);
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.oxl");

        {
            let mut backend = FileBackend::open(&path).unwrap();
            backend.append(b"first").unwrap();
            backend.append(b"second").unwrap();
            backend.sync().unwrap();
        }

        let backend = FileBackend::open_existing(&path).unwrap();
        assert_eq!(backend.size().unwrap(), 11);
        assert_eq!(backend.read_at(5, 6).unwrap(), b"second");
    }

    #[test]
    fn second_open_is_locked() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.oxl");

        let _held = FileBackend::open(&path).unwrap();
        let result = FileBackend::open(&path);
        assert!(matches!(result, Err(StorageError::Locked(_))));
    }

    #[test]
    fn truncate_shrinks_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("store.oxl");

        let mut backend = FileBackend::open_with_create_dirs(&path).unwrap();
        backend.append(b"keep|drop").unwrap();
        backend.truncate(4).unwrap();

        assert_eq!(backend.size().unwrap(), 4);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 4);
        assert!(backend.truncate(5).is_err());
    }
}
