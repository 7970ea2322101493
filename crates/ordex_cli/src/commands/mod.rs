//! CLI command implementations.

pub mod buckets;
pub mod dump;
pub mod genkey;
pub mod lookup;
pub mod verify;

use ordex_storage::{Store, StoreConfig};
use std::path::Path;

/// Opens an existing store without creating one.
pub fn open_store(path: &Path) -> Result<Store, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("No store found at {:?}", path).into());
    }
    Ok(Store::open(path, StoreConfig::new().create_if_missing(false))?)
}
