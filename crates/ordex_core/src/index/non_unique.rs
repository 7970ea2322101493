//! Indexes allowing many items per value.

use crate::error::{CoreError, CoreResult};
use crate::index::base::BaseIndex;
use crate::index::keys::{
    composite_key, first_prefix, last_prefix, select_key, select_value, validate_keys,
};
use crate::index::options::paginate;
use crate::index::{IndexReader, QueryOptions, SecondaryIndex};
use crate::key;
use ordex_storage::{Bucket, BucketMut, ReadBucket, ReadTxn, WriteBucket, WriteTxn};

/// A `value ‖ 0xFF ‖ item -> item` index.
///
/// Every `(value, item)` pair is its own entry, so one value can be held
/// by many items and one item can hold many values. All items for a value
/// sit next to each other in item key order.
#[derive(Debug)]
pub struct NonUniqueIndex<B> {
    base: BaseIndex<B>,
}

impl<B> NonUniqueIndex<B> {
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

impl<'tx> NonUniqueIndex<BucketMut<'tx>> {
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

impl<'tx> NonUniqueIndex<Bucket<'tx>> {
    /// Opens an existing index bucket in a read transaction.
    pub fn open(tx: &'tx ReadTxn, name: &[u8]) -> Option<Self> {
        tx.bucket(name).map(|bucket| Self::new(name, bucket))
    }
}

impl<B: WriteBucket> NonUniqueIndex<B> {
    /// Removes the single entry pairing `value_key` with `item_key`.
    ///
    /// Other items holding the same value are left alone. Succeeds if the
    /// pair was never indexed.
    pub fn remove_entry(&mut self, value_key: &[u8], item_key: &[u8]) -> CoreResult<()> {
        validate_keys(value_key, item_key)?;
        self.base.delete(&composite_key(value_key, item_key))
    }
}

impl<B: ReadBucket> IndexReader for NonUniqueIndex<B> {
    fn name(&self) -> &[u8] {
        self.base.name()
    }

    fn is_unique(&self) -> bool {
        false
    }

    fn len(&self) -> usize {
        self.base.len()
    }

    fn first_with_value(&self, value_key: &[u8]) -> Option<Vec<u8>> {
        if key::is_empty(value_key) {
            return None;
        }
        self.base.first_with_prefix(value_key)
    }

    fn all_with_value(
        &self,
        value_key: &[u8],
        opts: Option<&QueryOptions>,
    ) -> CoreResult<Vec<Vec<u8>>> {
        if key::is_empty(value_key) {
            return Ok(Vec::new());
        }
        Ok(paginate(self.base.prefix_scan(value_key, select_value), opts))
    }

    fn all(&self, opts: Option<&QueryOptions>) -> CoreResult<Vec<Vec<u8>>> {
        let items = self.base.all(select_value);
        Ok(paginate(key::merge_lists(&[&items]), opts))
    }

    fn all_in_range(
        &self,
        min: &[u8],
        max: &[u8],
        opts: Option<&QueryOptions>,
    ) -> CoreResult<Vec<Vec<u8>>> {
        let items = self
            .base
            .range_scan(&first_prefix(min), &last_prefix(max), select_value)?;
        Ok(paginate(key::merge_lists(&[&items]), opts))
    }
}

impl<B: WriteBucket> SecondaryIndex for NonUniqueIndex<B> {
    fn add(&mut self, value_key: &[u8], item_key: &[u8]) -> CoreResult<()> {
        validate_keys(value_key, item_key)?;
        self.base.add(&composite_key(value_key, item_key), item_key)
    }

    fn remove_item(&mut self, item_key: &[u8]) -> CoreResult<()> {
        self.base.remove_item(item_key).map(|_| ())
    }

    fn remove_value(&mut self, value_key: &[u8]) -> CoreResult<()> {
        if key::is_empty(value_key) {
            return Err(CoreError::InvalidIndexKey);
        }
        let keys = self.base.prefix_scan(value_key, select_key);
        self.base.delete_all(&keys)
    }
}
