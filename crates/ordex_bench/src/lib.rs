//! Benchmark utilities.

#![warn(missing_docs)]

use ordex_core::index::{NonUniqueIndex, SecondaryIndex, UniqueIndex};
use ordex_core::ItemKey;
use ordex_storage::Store;
use rand::Rng;

/// Generate random bytes of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate a batch of item keys.
pub fn generate_keys(count: usize) -> Vec<ItemKey> {
    (0..count)
        .map(|_| ItemKey::generate().expect("Failed to generate key"))
        .collect()
}

/// Fixed-width text value `n`, so text order matches numeric order.
pub fn text_value(n: usize) -> Vec<u8> {
    format!("value-{n:08}").into_bytes()
}

/// Builds a store with a unique index of `count` values.
pub fn unique_store(name: &[u8], count: usize) -> (Store, Vec<ItemKey>) {
    let store = Store::open_in_memory().expect("Failed to open store");
    let keys = generate_keys(count);
    let mut tx = store.begin_write();
    let mut index = UniqueIndex::create(&mut tx, name).expect("Failed to create index");
    for (n, key) in keys.iter().enumerate() {
        index
            .add(&text_value(n), key.as_bytes())
            .expect("Failed to add value");
    }
    tx.commit().expect("Failed to commit");
    (store, keys)
}

/// Builds a store with a non-unique index of `count` items spread over
/// `values` distinct values.
pub fn non_unique_store(name: &[u8], count: usize, values: usize) -> (Store, Vec<ItemKey>) {
    let store = Store::open_in_memory().expect("Failed to open store");
    let keys = generate_keys(count);
    let mut tx = store.begin_write();
    let mut index = NonUniqueIndex::create(&mut tx, name).expect("Failed to create index");
    for (n, key) in keys.iter().enumerate() {
        index
            .add(&text_value(n % values.max(1)), key.as_bytes())
            .expect("Failed to add value");
    }
    tx.commit().expect("Failed to commit");
    (store, keys)
}
