//! The item key type.

use crate::error::{CoreError, CoreResult};
use crate::key::{KEY_LEN, MAX, ZERO};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// A 16-byte record identifier.
///
/// Byte order, `Ord` and creation time agree for keys made in different
/// milliseconds. Text form is the 26-character Crockford base32 ULID.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemKey([u8; KEY_LEN]);

impl ItemKey {
    /// All-zero sentinel; the lower bound of the key space.
    pub const ZERO: Self = Self(ZERO);

    /// All-ones sentinel; the upper bound of the key space.
    pub const MAX: Self = Self(MAX);

    /// Creates a key from raw bytes.
    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Creates a key from a slice.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidItemKey`] unless the slice is exactly
    /// 16 bytes.
    pub fn from_slice(slice: &[u8]) -> CoreResult<Self> {
        <[u8; KEY_LEN]>::try_from(slice)
            .map(Self)
            .map_err(|_| CoreError::invalid_item_key(slice.len()))
    }

    /// Builds a key from a millisecond timestamp and 80 random bits.
    ///
    /// Only the low 48 bits of `timestamp_ms` are kept.
    #[must_use]
    pub fn from_parts(timestamp_ms: u64, random: [u8; 10]) -> Self {
        let mut wide = [0u8; 16];
        wide[6..].copy_from_slice(&random);
        Self(Ulid::from_parts(timestamp_ms, u128::from_be_bytes(wide)).to_bytes())
    }

    /// Generates a fresh key for the current time.
    pub fn generate() -> CoreResult<Self> {
        super::generate()
    }

    /// Returns the raw bytes.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Returns the embedded millisecond timestamp.
    #[must_use]
    pub fn timestamp_ms(&self) -> u64 {
        Ulid::from_bytes(self.0).timestamp_ms()
    }

    /// Returns the next key in byte order within the same millisecond,
    /// or `None` when the random component is exhausted.
    #[must_use]
    pub fn increment(&self) -> Option<Self> {
        Ulid::from_bytes(self.0)
            .increment()
            .map(|next| Self(next.to_bytes()))
    }

    /// Returns true for the `ZERO` and `MAX` sentinels.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.0 == ZERO || self.0 == MAX
    }
}

impl fmt::Debug for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemKey({self})")
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Ulid::from_bytes(self.0))
    }
}

impl FromStr for ItemKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_string(s)
            .map(|ulid| Self(ulid.to_bytes()))
            .map_err(|_| CoreError::InvalidKeyText {
                text: s.to_string(),
            })
    }
}

impl AsRef<[u8]> for ItemKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; KEY_LEN]> for ItemKey {
    fn from(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }
}

impl From<ItemKey> for [u8; KEY_LEN] {
    fn from(key: ItemKey) -> Self {
        key.0
    }
}

impl From<ItemKey> for Vec<u8> {
    fn from(key: ItemKey) -> Self {
        key.0.to_vec()
    }
}

impl TryFrom<&[u8]> for ItemKey {
    type Error = CoreError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        Self::from_slice(slice)
    }
}
