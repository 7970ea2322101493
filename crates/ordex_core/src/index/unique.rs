//! Indexes holding at most one item per value.

use crate::error::CoreResult;
use crate::index::base::BaseIndex;
use crate::index::keys::select_value;
use crate::index::options::paginate;
use crate::index::{IndexReader, QueryOptions, SecondaryIndex};
use ordex_storage::{Bucket, BucketMut, ReadBucket, ReadTxn, WriteBucket, WriteTxn};

/// A `value -> item` index.
///
/// A value can be held by only one item; adding it for another item fails
/// with [`CoreError::AlreadyExists`](crate::CoreError::AlreadyExists)
/// until the first item's entry is removed.
#[derive(Debug)]
pub struct UniqueIndex<B> {
    base: BaseIndex<B>,
}

impl<B> UniqueIndex<B> {
    /// Wraps an existing bucket handle.
    pub fn new(name: &[u8], bucket: B) -> Self {
        Self {
            base: BaseIndex::new(name, bucket),
        }
    }

    /// Returns the underlying bucket operations.
    pub fn base(&self) -> &BaseIndex<B> {
        &self.base
    }
}

impl<'tx> UniqueIndex<BucketMut<'tx>> {
    /// Opens the index bucket `name` for writing, creating it if missing.
    pub fn create(tx: &'tx mut WriteTxn<'_>, name: &[u8]) -> CoreResult<Self> {
        let bucket = tx.create_bucket_if_not_exists(name)?;
        Ok(Self::new(name, bucket))
    }

    /// Opens an existing index bucket for writing.
    pub fn open_mut(tx: &'tx mut WriteTxn<'_>, name: &[u8]) -> Option<Self> {
        tx.bucket_mut(name).map(|bucket| Self::new(name, bucket))
    }
}

impl<'tx> UniqueIndex<Bucket<'tx>> {
    /// Opens an existing index bucket in a read transaction.
    pub fn open(tx: &'tx ReadTxn, name: &[u8]) -> Option<Self> {
        tx.bucket(name).map(|bucket| Self::new(name, bucket))
    }
}

impl<B: ReadBucket> IndexReader for UniqueIndex<B> {
    fn name(&self) -> &[u8] {
        self.base.name()
    }

    fn is_unique(&self) -> bool {
        true
    }

    fn len(&self) -> usize {
        self.base.len()
    }

    fn first_with_value(&self, value_key: &[u8]) -> Option<Vec<u8>> {
        self.base.get(value_key)
    }

    fn all_with_value(
        &self,
        value_key: &[u8],
        opts: Option<&QueryOptions>,
    ) -> CoreResult<Vec<Vec<u8>>> {
        let found = self.base.get(value_key).into_iter().collect();
        Ok(paginate(found, opts))
    }

    fn all(&self, opts: Option<&QueryOptions>) -> CoreResult<Vec<Vec<u8>>> {
        Ok(paginate(self.base.all(select_value), opts))
    }

    fn all_in_range(
        &self,
        min: &[u8],
        max: &[u8],
        opts: Option<&QueryOptions>,
    ) -> CoreResult<Vec<Vec<u8>>> {
        let found = self.base.range_scan(min, max, select_value)?;
        Ok(paginate(found, opts))
    }
}

impl<B: WriteBucket> SecondaryIndex for UniqueIndex<B> {
    fn add(&mut self, value_key: &[u8], item_key: &[u8]) -> CoreResult<()> {
        self.base.add(value_key, item_key)
    }

    fn remove_item(&mut self, item_key: &[u8]) -> CoreResult<()> {
        self.base.remove_item(item_key).map(|_| ())
    }

    fn remove_value(&mut self, value_key: &[u8]) -> CoreResult<()> {
        self.base.delete(value_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::index::fixtures::{add_items, item, value, ITEMS};
    use ordex_storage::Store;

    fn with_unique(f: impl FnOnce(&mut UniqueIndex<BucketMut<'_>>)) {
        let store = Store::open_in_memory().unwrap();
        let mut tx = store.begin_write();
        let mut idx = UniqueIndex::create(&mut tx, b"_index_test").unwrap();
        add_items(&mut idx);
        f(&mut idx);
    }

    #[test]
    fn create_and_open() {
        let store = Store::open_in_memory().unwrap();
        store
            .update(|tx| {
                let idx = UniqueIndex::create(tx, b"_index_name")?;
                assert!(idx.is_unique());
                assert_eq!(idx.name(), b"_index_name");
                Ok::<_, CoreError>(())
            })
            .unwrap();

        let read = store.begin_read();
        assert!(UniqueIndex::open(&read, b"_index_name").is_some());
        assert!(UniqueIndex::open(&read, b"_index_other").is_none());

        let mut tx = store.begin_write();
        assert!(UniqueIndex::open_mut(&mut tx, b"_index_name").is_some());
    }

    #[test]
    fn add() {
        with_unique(|idx| {
            idx.add(&value(2), &item(2)).unwrap();

            let err = idx.add(&value(3), &item(5)).unwrap_err();
            assert!(err.is_already_exists());
            assert_eq!(idx.first_with_value(&value(3)), Some(item(3)));
        });
    }

    #[test]
    fn add_validates_keys() {
        with_unique(|idx| {
            assert!(matches!(
                idx.add(b"", &item(0)),
                Err(CoreError::InvalidIndexKey)
            ));
            assert!(matches!(
                idx.add(b"zz", b"short"),
                Err(CoreError::InvalidItemKey { len: 5 })
            ));
        });
    }

    #[test]
    fn first_with_value() {
        with_unique(|idx| {
            assert_eq!(idx.first_with_value(&value(2)), Some(item(2)));
            assert_eq!(idx.first_with_value(b"nothing"), None);
        });
    }

    #[test]
    fn remove_value() {
        with_unique(|idx| {
            idx.remove_value(&value(3)).unwrap();
            assert_eq!(idx.first_with_value(&value(3)), None);
            idx.remove_value(b"nothing").unwrap();
            assert_eq!(idx.len(), ITEMS.len() - 1);
        });
    }

    #[test]
    fn remove_item() {
        with_unique(|idx| {
            idx.remove_item(&item(3)).unwrap();
            assert_eq!(idx.first_with_value(&value(3)), None);
            idx.remove_item(b"nothing").unwrap();

            // the value is free for another item now
            idx.add(&value(3), &item(5)).unwrap();
        });
    }

    #[test]
    fn all_with_value() {
        with_unique(|idx| {
            assert_eq!(idx.all_with_value(&value(3), None).unwrap(), vec![item(3)]);
            assert!(idx.all_with_value(b"nothing", None).unwrap().is_empty());
        });
    }

    #[test]
    fn all() {
        with_unique(|idx| {
            let all = idx.all(None).unwrap();
            assert_eq!(all.len(), ITEMS.len());
            assert_eq!(all[0], item(0));

            let opts = QueryOptions::new().reverse(true).limit(2);
            assert_eq!(idx.all(Some(&opts)).unwrap(), vec![item(9), item(8)]);
        });
    }

    #[test]
    fn all_in_range() {
        with_unique(|idx| {
            assert_eq!(
                idx.all_in_range(&value(2), &value(4), None).unwrap(),
                vec![item(2), item(3), item(4)]
            );
            assert_eq!(
                idx.all_in_range(&value(2), &value(8), None).unwrap().len(),
                7
            );
            assert!(idx
                .all_in_range(&value(8), &value(2), None)
                .unwrap()
                .is_empty());
        });
    }

    #[test]
    fn changes_roll_back_with_transaction() {
        let store = Store::open_in_memory().unwrap();
        store
            .update(|tx| {
                let mut idx = UniqueIndex::create(tx, b"_index_test")?;
                idx.add(&value(0), &item(0))
            })
            .unwrap();

        let result = store.update(|tx| {
            let mut idx = UniqueIndex::create(tx, b"_index_test")?;
            idx.add(&value(1), &item(1))?;
            idx.add(&value(0), &item(2))
        });
        assert!(result.unwrap_err().is_already_exists());

        let read = store.begin_read();
        let idx = UniqueIndex::open(&read, b"_index_test").unwrap();
        assert_eq!(idx.len(), 1);
        assert_eq!(idx.first_with_value(&value(1)), None);
    }
}
