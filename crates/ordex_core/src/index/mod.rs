//! Secondary indexes.
//!
//! An index is a bucket that maps encoded field values back to the
//! [`ItemKey`](crate::key::ItemKey)s of the records holding them.
//!
//! - [`UniqueIndex`]: one entry per value, `value -> item`. Adding a value
//!   already held by another item fails with
//!   [`CoreError::AlreadyExists`](crate::CoreError::AlreadyExists).
//! - [`NonUniqueIndex`]: one entry per `(value, item)` pair, keyed by
//!   `value ‖ 0xFF ‖ item`, so a value scan is a prefix scan.
//!
//! Both are generic over the bucket handle. Over a read-only
//! [`Bucket`](ordex_storage::Bucket) they answer queries; over a
//! [`BucketMut`](ordex_storage::BucketMut) they can also be modified.
//! Callers that pick the kind at runtime use the object-safe
//! [`IndexReader`] and [`SecondaryIndex`] traits, as [`IndexMap`] does.
//!
//! Index buckets are named with the [`PREFIX`] so they can be told apart
//! from record buckets; see [`bucket_name`].

mod base;
#[cfg(test)]
mod fixtures;
mod keys;
mod map;
mod non_unique;
mod options;
mod traits;
mod unique;

pub use base::BaseIndex;
pub use keys::{
    composite_key, first_prefix, last_prefix, make_prefix, select_key, select_value,
    validate_keys, Selector, KEY_SEPARATOR,
};
pub use map::{open_index, open_reader, IndexDefinition, IndexMap, Indexed};
pub use non_unique::NonUniqueIndex;
pub use options::QueryOptions;
pub use traits::{IndexReader, SecondaryIndex};
pub use unique::UniqueIndex;

/// Prefix of every index bucket name.
pub const PREFIX: &str = "_index_";

/// Returns the bucket name for an index called `name`.
#[must_use]
pub fn bucket_name(name: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(PREFIX.len() + name.len());
    out.extend_from_slice(PREFIX.as_bytes());
    out.extend_from_slice(name.as_bytes());
    out
}

/// Returns true if `bucket` is named like an index bucket.
#[must_use]
pub fn is_index_bucket(bucket: &[u8]) -> bool {
    bucket.starts_with(PREFIX.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_naming() {
        assert_eq!(bucket_name("email"), b"_index_email".to_vec());
        assert!(is_index_bucket(&bucket_name("email")));
        assert!(!is_index_bucket(b"users"));
    }
}
