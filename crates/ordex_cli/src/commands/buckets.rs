//! Buckets command implementation.

use ordex_core::index;
use ordex_storage::ReadBucket;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// One listed bucket.
#[derive(Debug, Serialize)]
pub struct BucketInfo {
    /// Bucket name.
    pub name: String,
    /// Whether the name carries the index prefix.
    pub index: bool,
    /// Number of entries.
    pub entries: usize,
}

/// Runs the buckets command.
pub fn run(
    path: &Path,
    indexes_only: bool,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Listing buckets in {:?}", path);
    let store = super::open_store(path)?;
    let buckets = collect(&store, indexes_only);

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&buckets)?),
        _ => {
            if buckets.is_empty() {
                println!("No buckets");
            }
            for bucket in &buckets {
                let kind = if bucket.index { "index" } else { "data" };
                println!("{:<32} {:>6} {:>10}", bucket.name, kind, bucket.entries);
            }
        }
    }

    Ok(())
}

/// Lists buckets in name order.
pub fn collect(store: &ordex_storage::Store, indexes_only: bool) -> Vec<BucketInfo> {
    let tx = store.begin_read();
    tx.bucket_names()
        .into_iter()
        .filter(|name| !indexes_only || index::is_index_bucket(name))
        .map(|name| BucketInfo {
            entries: tx.bucket(&name).map_or(0, |b| b.len()),
            index: index::is_index_bucket(&name),
            name: String::from_utf8_lossy(&name).into_owned(),
        })
        .collect()
}
