//! Test fixtures and store helpers.
//!
//! Provides convenience functions for setting up test stores and the
//! index layouts most tests start from.

use ordex_storage::{Store, StoreConfig};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// File name of the store inside a fixture's temporary directory.
pub const STORE_FILE: &str = "ordex.db";

/// A test store with automatic cleanup.
pub struct TestStore {
    /// The store instance.
    pub store: Store,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: Option<TempDir>,
}

impl TestStore {
    /// Creates a new in-memory test store.
    pub fn memory() -> Self {
        Self {
            store: Store::open_in_memory().expect("Failed to open in-memory store"),
            temp_dir: None,
        }
    }

    /// Creates a new file-backed test store.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join(STORE_FILE);
        let store = Store::open(&path, StoreConfig::default()).expect("Failed to open file store");

        Self {
            store,
            temp_dir: Some(temp_dir),
        }
    }

    /// Returns the store path if file-backed, None if in-memory.
    pub fn path(&self) -> Option<PathBuf> {
        self.temp_dir.as_ref().map(|d| d.path().join(STORE_FILE))
    }

    /// Closes and reopens a file-backed store, replaying its log.
    ///
    /// # Panics
    ///
    /// Panics for an in-memory store, which cannot be reopened.
    pub fn reopen(self) -> Self {
        let path = self.path().expect("Only file stores can be reopened");
        let Self { store, temp_dir } = self;
        drop(store);

        let store = Store::open(&path, StoreConfig::default()).expect("Failed to reopen store");
        Self { store, temp_dir }
    }
}

impl std::ops::Deref for TestStore {
    type Target = Store;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Runs a test with a temporary in-memory store.
///
/// # Example
///
/// ```rust
/// use ordex_testkit::with_temp_store;
///
/// with_temp_store(|store| {
///     assert_eq!(store.sequence(), 0);
/// });
/// ```
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&Store) -> R,
{
    let test_store = TestStore::memory();
    f(&test_store.store)
}

/// Runs a test with a temporary file-backed store.
pub fn with_file_store<F, R>(f: F) -> R
where
    F: FnOnce(&Store, &Path) -> R,
{
    let test_store = TestStore::file();
    let path = test_store.path().expect("File store should have a path");
    f(&test_store.store, &path)
}

/// Index layouts shared by many tests.
pub mod scenarios {
    use super::*;
    use crate::vectors::{item, value, REPEATS, VALUES};
    use ordex_core::{NonUniqueIndex, SecondaryIndex, UniqueIndex};

    /// Bucket name the scenarios index into.
    pub const INDEX: &[u8] = b"_index_test";

    /// A unique index holding `value(i) -> item(i)` for all ten pairs.
    pub fn unique_store() -> TestStore {
        let test_store = TestStore::memory();
        let mut tx = test_store.begin_write();
        let mut index = UniqueIndex::create(&mut tx, INDEX).expect("Failed to create index");
        for i in 0..VALUES.len() {
            index.add(&value(i), &item(i)).expect("Failed to add pair");
        }
        tx.commit().expect("Failed to commit");
        test_store
    }

    /// A non-unique index holding the ten pairs plus [`REPEATS`].
    pub fn non_unique_store() -> TestStore {
        let test_store = TestStore::memory();
        let mut tx = test_store.begin_write();
        let mut index = NonUniqueIndex::create(&mut tx, INDEX).expect("Failed to create index");
        for i in 0..VALUES.len() {
            index.add(&value(i), &item(i)).expect("Failed to add pair");
        }
        for (v, items) in REPEATS {
            for &i in items {
                index.add(&value(v), &item(i)).expect("Failed to add repeat");
            }
        }
        tx.commit().expect("Failed to commit");
        test_store
    }
}
