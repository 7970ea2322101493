//! Lookup command implementation.

use ordex_core::index::{bucket_name, IndexReader, NonUniqueIndex, UniqueIndex};
use ordex_core::{encoding, key, QueryOptions};
use ordex_storage::{ReadTxn, Store};
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// What to look up.
#[derive(Debug, Clone)]
pub struct Query {
    /// Index name, without prefix.
    pub index: String,
    /// Value, or lower bound when `to` is set.
    pub value: String,
    /// Inclusive upper bound for a range lookup.
    pub to: Option<String>,
    /// Whether the index is unique.
    pub unique: bool,
    /// Encode values as integers.
    pub numeric: bool,
    /// Maximum number of keys.
    pub limit: Option<usize>,
}

/// Lookup result.
#[derive(Debug, Serialize)]
pub struct LookupResult {
    /// Index bucket searched.
    pub index: String,
    /// Matching item keys.
    pub items: Vec<String>,
}

/// Runs the lookup command.
pub fn run(path: &Path, query: &Query, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    info!("Looking up {:?} in index {}", query.value, query.index);
    let store = super::open_store(path)?;
    let result = collect(&store, query)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => {
            for item in &result.items {
                println!("{}", item);
            }
            println!("({} items)", result.items.len());
        }
    }

    Ok(())
}

/// Runs a query against `store`.
pub fn collect(store: &Store, query: &Query) -> Result<LookupResult, Box<dyn std::error::Error>> {
    let name = bucket_name(&query.index);
    let tx = store.begin_read();
    let index = open(&tx, &name, query.unique)
        .ok_or_else(|| format!("Index not found: {}", query.index))?;

    let mut opts = QueryOptions::new();
    if let Some(limit) = query.limit {
        opts = opts.limit(limit);
    }

    let value = encode(&query.value, query.numeric)?;
    let items = match &query.to {
        Some(to) => index.all_in_range(&value, &encode(to, query.numeric)?, Some(&opts))?,
        None => index.all_with_value(&value, Some(&opts))?,
    };

    Ok(LookupResult {
        index: String::from_utf8_lossy(&name).into_owned(),
        items: items.iter().map(|item| key::key_to_string(item)).collect(),
    })
}

fn open<'tx>(tx: &'tx ReadTxn, name: &[u8], unique: bool) -> Option<Box<dyn IndexReader + 'tx>> {
    if unique {
        UniqueIndex::open(tx, name).map(|index| Box::new(index) as Box<dyn IndexReader + 'tx>)
    } else {
        NonUniqueIndex::open(tx, name)
            .map(|index| Box::new(index) as Box<dyn IndexReader + 'tx>)
    }
}

/// Encodes a command-line value the way records index it.
fn encode(value: &str, numeric: bool) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    if numeric {
        let n: i64 = value.parse()?;
        Ok(encoding::int_to_bytes(n))
    } else {
        Ok(encoding::text_value(value))
    }
}
