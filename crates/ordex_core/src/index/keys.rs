//! Index key construction.

use crate::error::{CoreError, CoreResult};
use crate::key;

/// Byte placed between the value and the item in a non-unique index key.
///
/// A value key that itself contains `0xFF` can make one value's prefix a
/// prefix of another's. Values from [`encoding`](crate::encoding) text
/// never contain it.
pub const KEY_SEPARATOR: u8 = 0xFF;

/// Picks either the key or the value of an index entry.
pub type Selector = for<'a> fn(&'a [u8], &'a [u8]) -> &'a [u8];

/// Selects the entry key.
#[must_use]
pub fn select_key<'a>(key: &'a [u8], _value: &'a [u8]) -> &'a [u8] {
    key
}

/// Selects the entry value, which in an index is the item key.
#[must_use]
pub fn select_value<'a>(_key: &'a [u8], value: &'a [u8]) -> &'a [u8] {
    value
}

/// Checks a value key and item key pair.
///
/// # Errors
///
/// [`CoreError::InvalidIndexKey`] for an empty value key,
/// [`CoreError::InvalidItemKey`] for an item key that is not 16 bytes.
pub fn validate_keys(value_key: &[u8], item_key: &[u8]) -> CoreResult<()> {
    if key::is_empty(value_key) {
        return Err(CoreError::InvalidIndexKey);
    }
    if !key::is_valid(item_key) {
        return Err(CoreError::invalid_item_key(item_key.len()));
    }
    Ok(())
}

/// `value ‖ 0xFF`
#[must_use]
pub fn make_prefix(value_key: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(value_key.len() + 1 + key::KEY_LEN);
    out.extend_from_slice(value_key);
    out.push(KEY_SEPARATOR);
    out
}

/// Lowest possible composite key for `value_key`.
#[must_use]
pub fn first_prefix(value_key: &[u8]) -> Vec<u8> {
    composite_key(value_key, &key::ZERO)
}

/// Highest possible composite key for `value_key`.
#[must_use]
pub fn last_prefix(value_key: &[u8]) -> Vec<u8> {
    composite_key(value_key, &key::MAX)
}

/// `value ‖ 0xFF ‖ item`
#[must_use]
pub fn composite_key(value_key: &[u8], item_key: &[u8]) -> Vec<u8> {
    let mut out = make_prefix(value_key);
    out.extend_from_slice(item_key);
    out
}
