//! The store handle and its transactions.

use crate::backend::StorageBackend;
use crate::bucket::{Bucket, BucketMut, Entries};
use crate::config::StoreConfig;
use crate::error::{StorageError, StorageResult};
use crate::file::FileBackend;
use crate::log::{CommitLog, LogOp, ReplayStats};
use crate::memory::InMemoryBackend;
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Committed state: bucket name to its sorted entries.
type Buckets = BTreeMap<Vec<u8>, Arc<Entries>>;

struct Shared {
    config: StoreConfig,
    /// Last committed snapshot, swapped atomically on commit.
    snapshot: RwLock<Arc<Buckets>>,
    /// Held for the lifetime of a write transaction.
    writer: Mutex<CommitLog>,
    /// Number of commits applied since open.
    sequence: AtomicU64,
    replay: ReplayStats,
}

/// An embedded ordered key-value store of named buckets.
///
/// `Store` is a cheap, cloneable handle owned by the caller; there is no
/// process-wide registry of open stores.
///
/// # Concurrency
///
/// - Exactly one [`WriteTxn`] can be active; `begin_write` blocks until
///   the previous writer commits, rolls back or is dropped.
/// - Any number of [`ReadTxn`]s run alongside. Each sees the snapshot
///   committed when it began and never waits for the writer.
///
/// # Example
///
/// ```rust
/// use ordex_storage::{ReadBucket, Store, WriteBucket};
///
/// let store = Store::open_in_memory().unwrap();
///
/// let mut tx = store.begin_write();
/// tx.create_bucket_if_not_exists(b"people")
///     .unwrap()
///     .put(b"ada", b"lovelace")
///     .unwrap();
/// tx.commit().unwrap();
///
/// let rx = store.begin_read();
/// let people = rx.bucket(b"people").unwrap();
/// assert_eq!(people.get(b"ada"), Some(&b"lovelace"[..]));
/// ```
#[derive(Clone)]
pub struct Store {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("config", &self.shared.config)
            .field("sequence", &self.sequence())
            .finish_non_exhaustive()
    }
}

impl Store {
    /// Opens (or creates) a store file at `path`.
    ///
    /// # Errors
    ///
    /// Fails if the file is locked by another handle, missing while
    /// `create_if_missing` is off, or its commit log cannot be replayed.
    pub fn open(path: &Path, config: StoreConfig) -> StorageResult<Self> {
        let backend = if config.create_if_missing {
            FileBackend::open_with_create_dirs(path)?
        } else {
            FileBackend::open_existing(path)?
        };
        debug!(path = %path.display(), "opening store");
        Self::open_with_backend(config, Box::new(backend))
    }

    /// Opens an ephemeral store that lives only in memory.
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::open_with_backend(StoreConfig::default(), Box::new(InMemoryBackend::new()))
    }

    /// Opens a store on an arbitrary backend, replaying its commit log.
    pub fn open_with_backend(
        config: StoreConfig,
        backend: Box<dyn StorageBackend>,
    ) -> StorageResult<Self> {
        let mut log = CommitLog::new(backend, config.sync_on_commit);
        let mut buckets = Buckets::new();
        let replay = log.replay(|op| apply_op(&mut buckets, op))?;

        debug!(
            buckets = buckets.len(),
            commits = replay.commits,
            "store opened"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                snapshot: RwLock::new(Arc::new(buckets)),
                writer: Mutex::new(log),
                sequence: AtomicU64::new(0),
                replay,
            }),
        })
    }

    /// Returns the configuration the store was opened with.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.shared.config
    }

    /// Returns what replay did when the store was opened.
    #[must_use]
    pub fn replay_stats(&self) -> ReplayStats {
        self.shared.replay
    }

    /// Returns the number of commits made through this handle.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.shared.sequence.load(Ordering::SeqCst)
    }

    /// Begins a read transaction on the latest committed snapshot.
    #[must_use]
    pub fn begin_read(&self) -> ReadTxn {
        let snapshot = self.shared.snapshot.read();
        ReadTxn {
            snapshot: Arc::clone(&snapshot),
            sequence: self.sequence(),
        }
    }

    /// Begins the write transaction, waiting for any active writer.
    #[must_use]
    pub fn begin_write(&self) -> WriteTxn<'_> {
        let log = self.shared.writer.lock();
        let buckets = (**self.shared.snapshot.read()).clone();
        trace!("write transaction started");
        WriteTxn {
            shared: &self.shared,
            log,
            buckets,
            ops: Vec::new(),
        }
    }

    /// Runs `f` in a read transaction.
    pub fn view<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&ReadTxn) -> Result<T, E>,
    {
        let tx = self.begin_read();
        f(&tx)
    }

    /// Runs `f` in a write transaction, committing if it returns `Ok` and
    /// rolling back otherwise.
    pub fn update<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut WriteTxn<'_>) -> Result<T, E>,
        E: From<StorageError>,
    {
        let mut tx = self.begin_write();
        match f(&mut tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                tx.rollback();
                Err(err)
            }
        }
    }
}

fn apply_op(buckets: &mut Buckets, op: LogOp) -> StorageResult<()> {
    match op {
        LogOp::CreateBucket { name } => {
            buckets.entry(name).or_default();
        }
        LogOp::DeleteBucket { name } => {
            buckets.remove(&name);
        }
        LogOp::Put { bucket, key, value } => {
            let entries = buckets.get_mut(&bucket).ok_or_else(|| {
                StorageError::corrupted(format!(
                    "put into unknown bucket {}",
                    String::from_utf8_lossy(&bucket)
                ))
            })?;
            Arc::make_mut(entries).insert(key, value);
        }
        LogOp::Delete { bucket, key } => {
            let entries = buckets.get_mut(&bucket).ok_or_else(|| {
                StorageError::corrupted(format!(
                    "delete from unknown bucket {}",
                    String::from_utf8_lossy(&bucket)
                ))
            })?;
            Arc::make_mut(entries).remove(&key);
        }
    }
    Ok(())
}

/// A read-only snapshot of the store.
#[derive(Debug, Clone)]
pub struct ReadTxn {
    snapshot: Arc<Buckets>,
    sequence: u64,
}

impl ReadTxn {
    /// Returns the named bucket, or `None` if it does not exist.
    #[must_use]
    pub fn bucket(&self, name: &[u8]) -> Option<Bucket<'_>> {
        self.snapshot
            .get_key_value(name)
            .map(|(name, entries)| Bucket::new(name, entries))
    }

    /// Returns the names of all buckets in byte order.
    #[must_use]
    pub fn bucket_names(&self) -> Vec<Vec<u8>> {
        self.snapshot.keys().cloned().collect()
    }

    /// Returns the commit sequence this snapshot was taken at.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// The single active write transaction.
///
/// Changes are visible through this transaction immediately and to
/// everyone else only after [`WriteTxn::commit`]. Dropping the
/// transaction without committing discards every change.
pub struct WriteTxn<'s> {
    shared: &'s Shared,
    log: MutexGuard<'s, CommitLog>,
    buckets: Buckets,
    ops: Vec<LogOp>,
}

impl std::fmt::Debug for WriteTxn<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteTxn")
            .field("buckets", &self.buckets.len())
            .field("pending_ops", &self.ops.len())
            .finish()
    }
}

impl<'s> WriteTxn<'s> {
    /// Returns a read view of the named bucket, including uncommitted writes.
    #[must_use]
    pub fn bucket(&self, name: &[u8]) -> Option<Bucket<'_>> {
        self.buckets
            .get_key_value(name)
            .map(|(name, entries)| Bucket::new(name, entries))
    }

    /// Returns a writable handle to the named bucket.
    pub fn bucket_mut(&mut self, name: &[u8]) -> Option<BucketMut<'_>> {
        let max_key_size = self.shared.config.max_key_size;
        let entries = Arc::make_mut(self.buckets.get_mut(name)?);
        Some(BucketMut::new(name, entries, &mut self.ops, max_key_size))
    }

    /// Returns true if the named bucket exists.
    #[must_use]
    pub fn has_bucket(&self, name: &[u8]) -> bool {
        self.buckets.contains_key(name)
    }

    /// Returns the names of all buckets in byte order.
    #[must_use]
    pub fn bucket_names(&self) -> Vec<Vec<u8>> {
        self.buckets.keys().cloned().collect()
    }

    /// Creates a new bucket.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::BucketExists`] if it already exists.
    pub fn create_bucket(&mut self, name: &[u8]) -> StorageResult<BucketMut<'_>> {
        if self.has_bucket(name) {
            return Err(StorageError::bucket_exists(name));
        }
        self.create_bucket_if_not_exists(name)
    }

    /// Returns the named bucket, creating it first if needed.
    pub fn create_bucket_if_not_exists(&mut self, name: &[u8]) -> StorageResult<BucketMut<'_>> {
        if name.is_empty() {
            return Err(StorageError::InvalidBucketName);
        }
        if !self.buckets.contains_key(name) {
            self.buckets.insert(name.to_vec(), Arc::new(Entries::new()));
            self.ops.push(LogOp::CreateBucket {
                name: name.to_vec(),
            });
        }
        self.bucket_mut(name)
            .ok_or_else(|| StorageError::bucket_not_found(name))
    }

    /// Deletes a bucket and all of its entries.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::BucketNotFound`] if it does not exist.
    pub fn delete_bucket(&mut self, name: &[u8]) -> StorageResult<()> {
        if self.buckets.remove(name).is_none() {
            return Err(StorageError::bucket_not_found(name));
        }
        self.ops.push(LogOp::DeleteBucket {
            name: name.to_vec(),
        });
        Ok(())
    }

    /// Returns the number of mutations recorded so far.
    #[must_use]
    pub fn pending_ops(&self) -> usize {
        self.ops.len()
    }

    /// Appends the transaction to the commit log and publishes it.
    ///
    /// Returns the commit sequence. A transaction with no mutations
    /// commits without touching the log.
    pub fn commit(mut self) -> StorageResult<u64> {
        if self.ops.is_empty() {
            return Ok(self.shared.sequence.load(Ordering::SeqCst));
        }

        self.log.append(&self.ops)?;

        let buckets = std::mem::take(&mut self.buckets);
        let mut snapshot = self.shared.snapshot.write();
        *snapshot = Arc::new(buckets);
        let sequence = self.shared.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        drop(snapshot);

        debug!(sequence, ops = self.ops.len(), "transaction committed");
        Ok(sequence)
    }

    /// Discards every change made in this transaction.
    pub fn rollback(self) {
        trace!(ops = self.ops.len(), "transaction rolled back");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::{ReadBucket, WriteBucket};
    use std::sync::atomic::AtomicBool;

    /// Log bytes that outlive the store, with a switch to fail `sync`.
    #[derive(Clone, Default)]
    struct SharedLog {
        bytes: Arc<Mutex<Vec<u8>>>,
        fail_sync: Arc<AtomicBool>,
    }

    impl StorageBackend for SharedLog {
        fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
            let bytes = self.bytes.lock();
            let size = bytes.len() as u64;
            let start = offset as usize;
            bytes
                .get(start..start + len)
                .map(<[u8]>::to_vec)
                .ok_or(StorageError::ReadPastEnd { offset, len, size })
        }

        fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
            let mut bytes = self.bytes.lock();
            let offset = bytes.len() as u64;
            bytes.extend_from_slice(data);
            Ok(offset)
        }

        fn flush(&mut self) -> StorageResult<()> {
            Ok(())
        }

        fn sync(&mut self) -> StorageResult<()> {
            if self.fail_sync.load(Ordering::SeqCst) {
                return Err(StorageError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "sync failed",
                )));
            }
            Ok(())
        }

        fn size(&self) -> StorageResult<u64> {
            Ok(self.bytes.lock().len() as u64)
        }

        fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
            self.bytes.lock().truncate(new_size as usize);
            Ok(())
        }
    }

    #[test]
    fn commit_publishes_snapshot() {
        let store = Store::open_in_memory().unwrap();

        let mut tx = store.begin_write();
        let mut bucket = tx.create_bucket(b"people").unwrap();
        bucket.put(b"k1", b"v1").unwrap();
        assert_eq!(tx.commit().unwrap(), 1);

        let rx = store.begin_read();
        assert_eq!(rx.bucket(b"people").unwrap().get(b"k1"), Some(&b"v1"[..]));
        assert_eq!(rx.sequence(), 1);
    }

    #[test]
    fn readers_keep_their_snapshot() {
        let store = Store::open_in_memory().unwrap();
        store
            .update(|tx| {
                tx.create_bucket(b"b")?.put(b"k", b"old")?;
                Ok::<_, StorageError>(())
            })
            .unwrap();

        let before = store.begin_read();

        let mut tx = store.begin_write();
        tx.bucket_mut(b"b").unwrap().put(b"k", b"new").unwrap();
        // uncommitted writes are visible inside the writer only
        assert_eq!(tx.bucket(b"b").unwrap().get(b"k"), Some(&b"new"[..]));
        assert_eq!(before.bucket(b"b").unwrap().get(b"k"), Some(&b"old"[..]));
        tx.commit().unwrap();

        assert_eq!(before.bucket(b"b").unwrap().get(b"k"), Some(&b"old"[..]));
        let after = store.begin_read();
        assert_eq!(after.bucket(b"b").unwrap().get(b"k"), Some(&b"new"[..]));
    }

    #[test]
    fn drop_rolls_back() {
        let store = Store::open_in_memory().unwrap();
        {
            let mut tx = store.begin_write();
            tx.create_bucket(b"temp").unwrap();
        }
        assert!(store.begin_read().bucket(b"temp").is_none());
        assert_eq!(store.sequence(), 0);
    }

    #[test]
    fn update_rolls_back_on_error() {
        let store = Store::open_in_memory().unwrap();
        let result: StorageResult<()> = store.update(|tx| {
            tx.create_bucket(b"a")?;
            tx.create_bucket(b"a")?;
            Ok(())
        });

        assert!(matches!(result, Err(StorageError::BucketExists { .. })));
        assert!(store.begin_read().bucket_names().is_empty());
    }

    #[test]
    fn bucket_lifecycle_errors() {
        let store = Store::open_in_memory().unwrap();
        let mut tx = store.begin_write();

        assert!(matches!(
            tx.create_bucket(b""),
            Err(StorageError::InvalidBucketName)
        ));
        assert!(matches!(
            tx.delete_bucket(b"nope"),
            Err(StorageError::BucketNotFound { .. })
        ));
        assert!(tx.bucket_mut(b"nope").is_none());

        tx.create_bucket_if_not_exists(b"x").unwrap();
        tx.create_bucket_if_not_exists(b"x").unwrap();
        assert_eq!(tx.pending_ops(), 1);
        tx.delete_bucket(b"x").unwrap();
        assert!(!tx.has_bucket(b"x"));
    }

    #[test]
    fn empty_commit_skips_log() {
        let store = Store::open_in_memory().unwrap();
        let tx = store.begin_write();
        assert_eq!(tx.commit().unwrap(), 0);
        assert_eq!(store.sequence(), 0);
    }

    #[test]
    fn reopen_replays_commits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("store.oxl");

        {
            let store = Store::open(&path, StoreConfig::default()).unwrap();
            store
                .update(|tx| {
                    let mut b = tx.create_bucket(b"b")?;
                    b.put(b"one", b"1")?;
                    b.put(b"two", b"2")?;
                    Ok::<_, StorageError>(())
                })
                .unwrap();
            store
                .update(|tx| {
                    tx.bucket_mut(b"b")
                        .ok_or_else(|| StorageError::bucket_not_found(b"b"))?
                        .delete(b"one")
                })
                .unwrap();
        }

        let store = Store::open(&path, StoreConfig::new().create_if_missing(false)).unwrap();
        assert_eq!(store.replay_stats().commits, 2);

        let rx = store.begin_read();
        let b = rx.bucket(b"b").unwrap();
        assert_eq!(b.len(), 1);
        assert_eq!(b.get(b"two"), Some(&b"2"[..]));
    }

    #[test]
    fn writers_are_serialized() {
        let store = Store::open_in_memory().unwrap();
        store
            .update(|tx| tx.create_bucket(b"n").map(|_| ()))
            .unwrap();

        let handles: Vec<_> = (0..4u8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for j in 0..25u8 {
                        store
                            .update(|tx| {
                                tx.bucket_mut(b"n")
                                    .ok_or_else(|| StorageError::bucket_not_found(b"n"))?
                                    .put(&[i, j], &[j])
                            })
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.begin_read().bucket(b"n").unwrap().len(), 100);
        assert_eq!(store.sequence(), 101);
    }

    #[test]
    fn failed_commit_is_not_replayed() {
        let log = SharedLog::default();
        let store =
            Store::open_with_backend(StoreConfig::default(), Box::new(log.clone())).unwrap();

        log.fail_sync.store(true, Ordering::SeqCst);
        let result = store.update(|tx| {
            tx.create_bucket(b"ghost")?.put(b"k", b"v")?;
            Ok::<_, StorageError>(())
        });
        assert!(matches!(result, Err(StorageError::Io(_))));
        assert!(store.begin_read().bucket(b"ghost").is_none());

        log.fail_sync.store(false, Ordering::SeqCst);
        store
            .update(|tx| {
                tx.create_bucket(b"kept")?.put(b"k", b"v")?;
                Ok::<_, StorageError>(())
            })
            .unwrap();
        drop(store);

        let reopened =
            Store::open_with_backend(StoreConfig::default(), Box::new(log.clone())).unwrap();
        assert_eq!(reopened.replay_stats().commits, 1);
        let read = reopened.begin_read();
        assert!(read.bucket(b"ghost").is_none());
        assert_eq!(read.bucket(b"kept").unwrap().get(b"k"), Some(&b"v"[..]));
    }
}
