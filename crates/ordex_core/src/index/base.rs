//! Bucket operations shared by both index kinds.

use crate::error::{CoreError, CoreResult};
use crate::index::keys::{first_prefix, make_prefix, validate_keys, Selector};
use crate::key;
use ordex_storage::{ReadBucket, WriteBucket};
use tracing::{debug, trace};

/// An index bucket and its name.
///
/// Stores entries of `key -> item`, where the key is either a bare value
/// or a composite `value ‖ 0xFF ‖ item`. The wrapped handle decides what
/// is allowed: reads need [`ReadBucket`], writes need [`WriteBucket`].
#[derive(Debug)]
pub struct BaseIndex<B> {
    name: Vec<u8>,
    bucket: B,
}

impl<B> BaseIndex<B> {
    /// Wraps a bucket handle.
    pub fn new(name: &[u8], bucket: B) -> Self {
        Self {
            name: name.to_vec(),
            bucket,
        }
    }

    /// Returns the index bucket name.
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    /// Returns the wrapped bucket handle.
    pub fn bucket(&self) -> &B {
        &self.bucket
    }

    /// Unwraps the bucket handle.
    pub fn into_bucket(self) -> B {
        self.bucket
    }
}

impl<B: ReadBucket> BaseIndex<B> {
    /// Number of entries in the bucket.
    pub fn len(&self) -> usize {
        self.bucket.len()
    }

    /// Returns true if the bucket has no entries.
    pub fn is_empty(&self) -> bool {
        self.bucket.is_empty()
    }

    /// Returns the item stored under an exact key.
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.bucket.get(key).map(<[u8]>::to_vec)
    }

    /// Returns every key whose entry points at `item_key`.
    ///
    /// Walks the whole bucket.
    pub fn keys_with_item(&self, item_key: &[u8]) -> Vec<Vec<u8>> {
        self.bucket
            .cursor()
            .filter(|(_, v)| *v == item_key)
            .map(|(k, _)| k.to_vec())
            .collect()
    }

    /// Selects from every entry whose key starts with `value_key ‖ 0xFF`.
    pub fn prefix_scan(&self, value_key: &[u8], select: Selector) -> Vec<Vec<u8>> {
        let prefix = make_prefix(value_key);
        let mut cursor = self.bucket.cursor();
        let mut out = Vec::new();
        let mut entry = cursor.seek(&first_prefix(value_key));
        while let Some((k, v)) = entry {
            if !k.starts_with(&prefix) {
                break;
            }
            out.push(select(k, v).to_vec());
            entry = cursor.next();
        }
        out
    }

    /// Returns the first entry value under `value_key ‖ 0xFF`, if any.
    ///
    /// The seek may land past the prefix, so the landing key is checked.
    pub fn first_with_prefix(&self, value_key: &[u8]) -> Option<Vec<u8>> {
        let mut cursor = self.bucket.cursor();
        let (k, v) = cursor.seek(&first_prefix(value_key))?;
        k.starts_with(&make_prefix(value_key)).then(|| v.to_vec())
    }

    /// Visits entries with `lower <= key <= upper` in key order.
    ///
    /// Stops at the first error `f` returns.
    pub fn for_range<F>(&self, lower: &[u8], upper: &[u8], mut f: F) -> CoreResult<()>
    where
        F: FnMut(&[u8], &[u8]) -> CoreResult<()>,
    {
        let mut cursor = self.bucket.cursor();
        let mut entry = cursor.seek(lower);
        while let Some((k, v)) = entry {
            if k > upper {
                break;
            }
            f(k, v)?;
            entry = cursor.next();
        }
        Ok(())
    }

    /// Selects from entries with `lower <= key <= upper`.
    pub fn range_scan(
        &self,
        lower: &[u8],
        upper: &[u8],
        select: Selector,
    ) -> CoreResult<Vec<Vec<u8>>> {
        let mut out = Vec::new();
        self.for_range(lower, upper, |k, v| {
            out.push(select(k, v).to_vec());
            Ok(())
        })?;
        Ok(out)
    }

    /// Selects from every entry.
    pub fn all(&self, select: Selector) -> Vec<Vec<u8>> {
        self.bucket
            .cursor()
            .map(|(k, v)| select(k, v).to_vec())
            .collect()
    }
}

impl<B: WriteBucket> BaseIndex<B> {
    /// Stores `key -> item_key`.
    ///
    /// Re-adding the same pair is a no-op.
    ///
    /// # Errors
    ///
    /// Fails on invalid keys, and with [`CoreError::AlreadyExists`] when
    /// the key already points at a different item.
    pub fn add(&mut self, key: &[u8], item_key: &[u8]) -> CoreResult<()> {
        validate_keys(key, item_key)?;

        if let Some(existing) = self.bucket.get(key) {
            if existing == item_key {
                return Ok(());
            }
            debug!(
                index = %String::from_utf8_lossy(&self.name),
                existing = %key::key_to_string(existing),
                "index conflict"
            );
            return Err(CoreError::already_exists(&self.name, existing));
        }
        self.bucket.put(key, item_key)?;
        Ok(())
    }

    /// Deletes one key. Absent keys are ignored.
    pub fn delete(&mut self, key: &[u8]) -> CoreResult<()> {
        self.bucket.delete(key)?;
        Ok(())
    }

    /// Deletes each of `keys`.
    pub fn delete_all(&mut self, keys: &[Vec<u8>]) -> CoreResult<()> {
        for key in keys {
            self.bucket.delete(key)?;
        }
        Ok(())
    }

    /// Deletes every entry pointing at `item_key` and returns how many
    /// there were.
    pub fn remove_item(&mut self, item_key: &[u8]) -> CoreResult<usize> {
        let keys = self.keys_with_item(item_key);
        self.delete_all(&keys)?;
        trace!(
            index = %String::from_utf8_lossy(&self.name),
            item = %key::key_to_string(item_key),
            removed = keys.len(),
            "removed item from index"
        );
        Ok(keys.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::keys::{composite_key, last_prefix, select_key, select_value};
    use ordex_storage::Store;

    fn item(n: u8) -> [u8; 16] {
        [n; 16]
    }

    #[test]
    fn add_is_idempotent_and_detects_conflicts() {
        let store = Store::open_in_memory().unwrap();
        let mut tx = store.begin_write();
        let bucket = tx.create_bucket(b"idx").unwrap();
        let mut idx = BaseIndex::new(b"idx", bucket);

        idx.add(b"v", &item(1)).unwrap();
        idx.add(b"v", &item(1)).unwrap();
        assert_eq!(idx.len(), 1);

        let err = idx.add(b"v", &item(2)).unwrap_err();
        assert!(err.is_already_exists());
        assert_eq!(idx.get(b"v"), Some(item(1).to_vec()));
    }

    #[test]
    fn prefix_scan_stops_at_prefix_end() {
        let store = Store::open_in_memory().unwrap();
        let mut tx = store.begin_write();
        let bucket = tx.create_bucket(b"idx").unwrap();
        let mut idx = BaseIndex::new(b"idx", bucket);

        for (value, n) in [("a", 1), ("b", 2), ("b", 3), ("c", 4)] {
            idx.add(&composite_key(value.as_bytes(), &item(n)), &item(n))
                .unwrap();
        }

        assert_eq!(
            idx.prefix_scan(b"b", select_value),
            vec![item(2).to_vec(), item(3).to_vec()]
        );
        assert_eq!(idx.prefix_scan(b"b", select_key).len(), 2);
        assert!(idx.prefix_scan(b"bb", select_value).is_empty());
        assert_eq!(idx.first_with_prefix(b"c"), Some(item(4).to_vec()));
        assert_eq!(idx.first_with_prefix(b"0"), None);
        assert_eq!(idx.first_with_prefix(b"d"), None);
    }

    #[test]
    fn range_is_inclusive() {
        let store = Store::open_in_memory().unwrap();
        let mut tx = store.begin_write();
        let bucket = tx.create_bucket(b"idx").unwrap();
        let mut idx = BaseIndex::new(b"idx", bucket);

        for (value, n) in [("a", 1), ("b", 2), ("c", 3), ("d", 4)] {
            idx.add(&composite_key(value.as_bytes(), &item(n)), &item(n))
                .unwrap();
        }

        let found = idx
            .range_scan(&first_prefix(b"b"), &last_prefix(b"c"), select_value)
            .unwrap();
        assert_eq!(found, vec![item(2).to_vec(), item(3).to_vec()]);
        assert!(idx
            .range_scan(&first_prefix(b"d"), &last_prefix(b"a"), select_value)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn for_range_propagates_errors() {
        let store = Store::open_in_memory().unwrap();
        let mut tx = store.begin_write();
        let bucket = tx.create_bucket(b"idx").unwrap();
        let mut idx = BaseIndex::new(b"idx", bucket);
        idx.add(b"a", &item(1)).unwrap();
        idx.add(b"b", &item(2)).unwrap();

        let mut seen = 0;
        let result = idx.for_range(b"a", b"z", |_, _| {
            seen += 1;
            Err(CoreError::InvalidIndexKey)
        });
        assert!(result.is_err());
        assert_eq!(seen, 1);
    }

    #[test]
    fn remove_item_deletes_every_entry() {
        let store = Store::open_in_memory().unwrap();
        let mut tx = store.begin_write();
        let bucket = tx.create_bucket(b"idx").unwrap();
        let mut idx = BaseIndex::new(b"idx", bucket);

        idx.add(b"x", &item(1)).unwrap();
        idx.add(b"y", &item(1)).unwrap();
        idx.add(b"z", &item(2)).unwrap();

        assert_eq!(idx.keys_with_item(&item(1)).len(), 2);
        assert_eq!(idx.remove_item(&item(1)).unwrap(), 2);
        assert_eq!(idx.remove_item(&item(9)).unwrap(), 0);
        assert_eq!(idx.all(select_key), vec![b"z".to_vec()]);
    }
}
