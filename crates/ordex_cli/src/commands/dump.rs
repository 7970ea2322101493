//! Dump command implementation.

use ordex_core::index::KEY_SEPARATOR;
use ordex_core::key;
use ordex_storage::{ReadBucket, Store};
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// One bucket entry in display form.
#[derive(Debug, Serialize)]
pub struct DumpEntry {
    /// Display form of the key.
    pub key: String,
    /// Display form of the value.
    pub value: String,
}

/// Runs the dump command.
pub fn run(
    path: &Path,
    bucket: &str,
    limit: Option<usize>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Dumping bucket {} from {:?}", bucket, path);
    let store = super::open_store(path)?;
    let entries = collect(&store, bucket, limit)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&entries)?),
        _ => {
            for entry in &entries {
                println!("{} -> {}", entry.key, entry.value);
            }
            println!("({} entries)", entries.len());
        }
    }

    Ok(())
}

/// Reads up to `limit` entries of `bucket` in key order.
pub fn collect(
    store: &Store,
    bucket: &str,
    limit: Option<usize>,
) -> Result<Vec<DumpEntry>, Box<dyn std::error::Error>> {
    let tx = store.begin_read();
    let handle = tx
        .bucket(bucket.as_bytes())
        .ok_or_else(|| format!("Bucket not found: {}", bucket))?;

    let entries = handle
        .cursor()
        .take(limit.unwrap_or(usize::MAX))
        .map(|(k, v)| DumpEntry {
            key: display_key(k),
            value: key::key_to_string(v),
        })
        .collect();
    Ok(entries)
}

/// Renders an item key, or a non-unique index key as `value|item`.
fn display_key(raw: &[u8]) -> String {
    let split = raw.len().checked_sub(key::KEY_LEN + 1);
    match split {
        Some(at) if raw[at] == KEY_SEPARATOR && at > 0 => format!(
            "{}|{}",
            key::key_to_string(&raw[..at]),
            key::key_to_string(&raw[at + 1..])
        ),
        _ => key::key_to_string(raw),
    }
}
