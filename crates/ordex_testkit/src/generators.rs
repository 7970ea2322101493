//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random keys, values and index
//! operations that respect the index input rules.

use ordex_core::key::MAX_TIMESTAMP_MS;
use ordex_core::ItemKey;
use proptest::prelude::*;

/// Strategy for generating item keys across the whole time range.
pub fn item_key_strategy() -> impl Strategy<Value = ItemKey> {
    (0..=MAX_TIMESTAMP_MS, prop::array::uniform10(any::<u8>()))
        .prop_map(|(ms, random)| ItemKey::from_parts(ms, random))
}

/// Strategy for generating value keys.
///
/// Values are non-empty and never contain the `0xFF` separator, so one
/// value's prefix cannot swallow another's.
pub fn value_key_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..0xFF, 1..24)
}

/// Strategy for generating short lowercase text values.
pub fn text_value_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9 ]{0,15}").expect("Invalid regex")
}

/// One step against an index.
#[derive(Debug, Clone)]
pub enum IndexOp {
    /// Index a value to an item
    Add {
        /// Value key
        value: Vec<u8>,
        /// Item key
        item: ItemKey,
    },
    /// Remove every entry for an item
    RemoveItem {
        /// Item key
        item: ItemKey,
    },
    /// Remove every entry for a value
    RemoveValue {
        /// Value key
        value: Vec<u8>,
    },
}

/// Strategy for generating operation sequences over small pools of values
/// and items, so adds collide and removals usually hit something.
pub fn index_ops_strategy(max_ops: usize) -> impl Strategy<Value = Vec<IndexOp>> {
    let pools = (
        prop::collection::vec(value_key_strategy(), 4),
        prop::collection::vec(item_key_strategy(), 4),
    );
    pools.prop_flat_map(move |(values, items)| {
        let op = prop_oneof![
            4 => (0..values.len(), 0..items.len()).prop_map({
                let values = values.clone();
                let items = items.clone();
                move |(v, i)| IndexOp::Add {
                    value: values[v].clone(),
                    item: items[i],
                }
            }),
            1 => (0..items.len()).prop_map({
                let items = items.clone();
                move |i| IndexOp::RemoveItem { item: items[i] }
            }),
            1 => (0..values.len()).prop_map({
                let values = values.clone();
                move |v| IndexOp::RemoveValue {
                    value: values[v].clone(),
                }
            }),
        ];
        prop::collection::vec(op, 0..max_ops)
    })
}
