//! Record keys.
//!
//! Records are addressed by 16-byte [`ItemKey`]s laid out like a ULID:
//! a 48-bit big-endian millisecond timestamp followed by 80 random bits,
//! so byte order follows creation time across milliseconds.
//!
//! The free functions here work on raw byte slices, since index buckets
//! hand keys back as plain bytes.

mod generator;
mod item;

pub use generator::{generate, generate_at, MonotonicKeyGenerator, MAX_TIMESTAMP_MS};
pub use item::ItemKey;

use std::collections::HashSet;
use ulid::Ulid;

/// Length of every item key.
pub const KEY_LEN: usize = 16;

/// Smallest possible item key. Sorts before every generated key.
pub const ZERO: [u8; KEY_LEN] = [0x00; KEY_LEN];

/// Largest possible item key. Sorts after every generated key.
pub const MAX: [u8; KEY_LEN] = [0xFF; KEY_LEN];

/// Returns true if `raw` is the right length to be an item key.
#[must_use]
pub fn is_valid(raw: &[u8]) -> bool {
    raw.len() == KEY_LEN
}

/// Returns true if `raw` holds no bytes.
#[must_use]
pub fn is_empty(raw: &[u8]) -> bool {
    raw.is_empty()
}

/// Renders a key for display.
///
/// Item keys become their 26-character canonical text. Anything else is
/// reinterpreted as UTF-8, replacing invalid sequences, so the result is
/// only suitable for logs and debugging.
#[must_use]
pub fn key_to_string(raw: &[u8]) -> String {
    match <[u8; KEY_LEN]>::try_from(raw) {
        Ok(bytes) => Ulid::from_bytes(bytes).to_string(),
        Err(_) => String::from_utf8_lossy(raw).into_owned(),
    }
}

/// Parses text produced by [`key_to_string`].
///
/// Canonical item key text yields the 16 key bytes; any other text yields
/// its own bytes unchanged.
#[must_use]
pub fn key_from_string(text: &str) -> Vec<u8> {
    match Ulid::from_string(text) {
        Ok(ulid) => ulid.to_bytes().to_vec(),
        Err(_) => text.as_bytes().to_vec(),
    }
}

/// Returns true if `list` contains `key`. An empty key is never contained.
#[must_use]
pub fn list_contains(list: &[Vec<u8>], key: &[u8]) -> bool {
    !key.is_empty() && list.iter().any(|k| k.as_slice() == key)
}

/// Combines key lists into one list without duplicates.
///
/// Keys keep the position of their first occurrence.
#[must_use]
pub fn merge_lists(lists: &[&[Vec<u8>]]) -> Vec<Vec<u8>> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for list in lists {
        for key in list.iter() {
            if seen.insert(key.as_slice()) {
                merged.push(key.clone());
            }
        }
    }
    merged
}
