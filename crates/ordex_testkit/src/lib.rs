//! # Ordex Testkit
//!
//! Test utilities for Ordex.
//!
//! This crate provides:
//! - Store fixtures, in memory or backed by a temporary file
//! - Property-based test generators using proptest
//! - A model harness that checks indexes against an in-memory model
//! - Concurrent reader/writer stress helpers
//! - Fixed index and encoding test vectors
//!
//! ## Usage
//!
//! ```rust
//! use ordex_testkit::prelude::*;
//! use ordex_core::{IndexReader, SecondaryIndex, UniqueIndex};
//!
//! with_temp_store(|store| {
//!     let mut tx = store.begin_write();
//!     let mut index = UniqueIndex::create(&mut tx, b"_index_test").unwrap();
//!     index.add(&value(0), &item(0)).unwrap();
//!     assert_eq!(index.first_with_value(&value(0)), Some(item(0)));
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod harness;
pub mod stress;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::harness::*;
    pub use crate::stress::*;
    pub use crate::vectors::*;
}

pub use fixtures::*;
pub use generators::*;
pub use harness::*;
pub use stress::*;
pub use vectors::*;
