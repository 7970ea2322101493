//! Value encodings for index keys.
//!
//! Index buckets compare value keys as raw bytes, so a value must be
//! encoded such that byte order is the order a range query expects.
//!
//! Integers are widened to 64 bits and written big-endian. For values of
//! the same sign that gives numeric order. Negative values sort *after*
//! non-negative ones because the sign bit is left as is; callers that mix
//! signs in one range should offset their values first.

use crate::error::{CoreError, CoreResult};
use crate::key::ItemKey;
use std::any::{type_name, Any};

/// Width of every encoded number.
pub const NUMBER_LEN: usize = 8;

/// Integer types with a fixed-width sortable encoding.
pub trait SortableInt: Copy {
    /// Encodes the value as 8 big-endian bytes.
    fn to_sortable_bytes(self) -> [u8; NUMBER_LEN];
}

macro_rules! impl_sortable_signed {
    ($($t:ty),*) => {
        $(impl SortableInt for $t {
            #[inline]
            fn to_sortable_bytes(self) -> [u8; NUMBER_LEN] {
                (self as i64).to_be_bytes()
            }
        })*
    };
}

macro_rules! impl_sortable_unsigned {
    ($($t:ty),*) => {
        $(impl SortableInt for $t {
            #[inline]
            fn to_sortable_bytes(self) -> [u8; NUMBER_LEN] {
                (self as u64).to_be_bytes()
            }
        })*
    };
}

impl_sortable_signed!(i8, i16, i32, i64, isize);
impl_sortable_unsigned!(u8, u16, u32, u64, usize);

/// Encodes an integer known at compile time.
#[must_use]
pub fn int_to_bytes<T: SortableInt>(value: T) -> Vec<u8> {
    value.to_sortable_bytes().to_vec()
}

/// Encodes a value whose concrete type is only checked at runtime.
///
/// # Errors
///
/// Returns [`CoreError::NotNumeric`] if `value` is not one of the built-in
/// integer types.
pub fn number_to_bytes<T: Any>(value: &T) -> CoreResult<Vec<u8>> {
    let any = value as &dyn Any;

    macro_rules! try_types {
        ($($t:ty),*) => {
            $(if let Some(v) = any.downcast_ref::<$t>() {
                return Ok(int_to_bytes(*v));
            })*
        };
    }
    try_types!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

    Err(CoreError::NotNumeric {
        type_name: type_name::<T>(),
    })
}

/// Decodes a signed number written by [`number_to_bytes`].
///
/// # Errors
///
/// Returns [`CoreError::InvalidNumber`] unless `raw` is exactly 8 bytes.
pub fn number_from_bytes(raw: &[u8]) -> CoreResult<i64> {
    fixed(raw).map(i64::from_be_bytes)
}

/// Decodes an unsigned number written by [`number_to_bytes`].
///
/// # Errors
///
/// Returns [`CoreError::InvalidNumber`] unless `raw` is exactly 8 bytes.
pub fn unsigned_from_bytes(raw: &[u8]) -> CoreResult<u64> {
    fixed(raw).map(u64::from_be_bytes)
}

fn fixed(raw: &[u8]) -> CoreResult<[u8; NUMBER_LEN]> {
    <[u8; NUMBER_LEN]>::try_from(raw).map_err(|_| CoreError::InvalidNumber { len: raw.len() })
}

/// Encodes text as its UTF-8 bytes.
#[must_use]
pub fn text_value(text: &str) -> Vec<u8> {
    text.as_bytes().to_vec()
}

/// Encodes a reference to another record, for indexing relations.
#[must_use]
pub fn item_key_value(key: &ItemKey) -> Vec<u8> {
    key.as_bytes().to_vec()
}
