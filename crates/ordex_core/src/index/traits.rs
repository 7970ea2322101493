//! Object-safe index interfaces.

use crate::error::CoreResult;
use crate::index::QueryOptions;

/// Read operations shared by every index kind.
///
/// Results are item keys as raw bytes. Queries that find nothing return
/// `None` or an empty list rather than an error.
pub trait IndexReader {
    /// Name of the index bucket.
    fn name(&self) -> &[u8];

    /// True for an index that allows one item per value.
    fn is_unique(&self) -> bool;

    /// Number of stored entries.
    fn len(&self) -> usize;

    /// Returns true if the index holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the lowest item key indexed to `value_key`.
    fn first_with_value(&self, value_key: &[u8]) -> Option<Vec<u8>>;

    /// Returns every item key indexed to `value_key`, in item key order.
    fn all_with_value(
        &self,
        value_key: &[u8],
        opts: Option<&QueryOptions>,
    ) -> CoreResult<Vec<Vec<u8>>>;

    /// Returns every distinct item key in the index, in value order.
    fn all(&self, opts: Option<&QueryOptions>) -> CoreResult<Vec<Vec<u8>>>;

    /// Returns the distinct item keys for values in `min..=max`, in value
    /// order.
    fn all_in_range(
        &self,
        min: &[u8],
        max: &[u8],
        opts: Option<&QueryOptions>,
    ) -> CoreResult<Vec<Vec<u8>>>;
}

/// An index that can be modified inside a write transaction.
pub trait SecondaryIndex: IndexReader {
    /// Indexes `value_key` to `item_key`. Re-adding a pair is a no-op.
    fn add(&mut self, value_key: &[u8], item_key: &[u8]) -> CoreResult<()>;

    /// Removes every entry pointing at `item_key`.
    ///
    /// Walks the whole index bucket.
    fn remove_item(&mut self, item_key: &[u8]) -> CoreResult<()>;

    /// Removes every entry for `value_key`.
    fn remove_value(&mut self, value_key: &[u8]) -> CoreResult<()>;
}
