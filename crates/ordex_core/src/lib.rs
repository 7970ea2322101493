//! # Ordex Core
//!
//! Secondary indexes over an ordered bucket store.
//!
//! Records live in buckets keyed by 16-byte [`ItemKey`]s. To find records
//! by something other than their key, each indexed field value is written
//! to an index bucket that points back at the record:
//!
//! - [`UniqueIndex`] for values held by at most one record
//! - [`NonUniqueIndex`] for values shared by many records
//!
//! Index writes happen inside the caller's write transaction, so they
//! commit or roll back together with the record.
//!
//! ## Value encoding
//!
//! Index buckets compare keys as bytes. The [`encoding`] module turns
//! integers, text and record references into bytes whose order matches
//! the value order, so range queries work.
//!
//! ## Example
//!
//! ```
//! use ordex_core::index::{bucket_name, IndexReader, SecondaryIndex, UniqueIndex};
//! use ordex_core::{encoding, CoreError, ItemKey};
//! use ordex_storage::Store;
//!
//! let store = Store::open_in_memory()?;
//! let alice = ItemKey::generate()?;
//! let email = bucket_name("email");
//!
//! store.update(|tx| {
//!     let mut index = UniqueIndex::create(tx, &email)?;
//!     index.add(&encoding::text_value("alice@example.com"), alice.as_bytes())
//! })?;
//!
//! let tx = store.begin_read();
//! let index = UniqueIndex::open(&tx, &email).unwrap();
//! let found = index.first_with_value(b"alice@example.com");
//! assert_eq!(found.as_deref(), Some(&alice.as_bytes()[..]));
//! # Ok::<(), CoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod encoding;
mod error;
pub mod index;
pub mod key;

pub use error::{CoreError, CoreResult};
pub use index::{
    IndexDefinition, IndexMap, IndexReader, Indexed, NonUniqueIndex, QueryOptions,
    SecondaryIndex, UniqueIndex,
};
pub use key::{ItemKey, MonotonicKeyGenerator};
