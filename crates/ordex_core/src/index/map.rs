//! Declaring which values of a record get indexed.
//!
//! A record type lists its indexed values in an [`IndexMap`]. The write
//! path hands the map its write transaction and the record's item key, so
//! index entries commit or roll back together with the record itself.

use crate::error::CoreResult;
use crate::index::{bucket_name, IndexReader, NonUniqueIndex, SecondaryIndex, UniqueIndex};
use ordex_storage::{ReadTxn, WriteTxn};
use std::collections::HashSet;
use tracing::trace;

/// One value to index, and the index that holds it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexDefinition {
    /// Index bucket name, including the index prefix.
    pub bucket_name: Vec<u8>,
    /// Encoded value to index.
    pub value: Vec<u8>,
    /// Use a unique index rather than a non-unique one.
    pub unique: bool,
}

impl IndexDefinition {
    /// Defines `value` for the index called `name`.
    pub fn new(name: &str, value: impl Into<Vec<u8>>, unique: bool) -> Self {
        Self {
            bucket_name: bucket_name(name),
            value: value.into(),
            unique,
        }
    }
}

/// The indexed values of one record.
///
/// A non-unique index may appear several times with different values,
/// which indexes the record under each of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexMap {
    definitions: Vec<IndexDefinition>,
}

impl IndexMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a map with one definition.
    #[must_use]
    pub fn define(name: &str, value: impl Into<Vec<u8>>, unique: bool) -> Self {
        Self::new().add(name, value, unique)
    }

    /// Adds a definition.
    #[must_use]
    pub fn add(mut self, name: &str, value: impl Into<Vec<u8>>, unique: bool) -> Self {
        self.definitions.push(IndexDefinition::new(name, value, unique));
        self
    }

    /// Adds a prepared definition.
    pub fn push(&mut self, definition: IndexDefinition) {
        self.definitions.push(definition);
    }

    /// Returns the definitions in declaration order.
    pub fn definitions(&self) -> &[IndexDefinition] {
        &self.definitions
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns true if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Returns true if the map holds `definition`.
    pub fn contains(&self, definition: &IndexDefinition) -> bool {
        self.definitions.contains(definition)
    }

    /// Indexes every value in the map to `item_key`, creating index
    /// buckets as needed.
    ///
    /// # Errors
    ///
    /// Stops at the first failure, typically a unique conflict. The
    /// caller's transaction should then be rolled back; entries already
    /// written by this call are part of it.
    pub fn save(&self, tx: &mut WriteTxn<'_>, item_key: &[u8]) -> CoreResult<()> {
        for definition in &self.definitions {
            let mut index = open_index(tx, definition)?;
            index.add(&definition.value, item_key)?;
        }
        trace!(definitions = self.definitions.len(), "saved index entries");
        Ok(())
    }

    /// Removes `item_key` from every index bucket named in the map.
    ///
    /// Each bucket is scanned once; missing buckets are skipped.
    pub fn remove_item(&self, tx: &mut WriteTxn<'_>, item_key: &[u8]) -> CoreResult<()> {
        let mut seen = HashSet::new();
        for definition in &self.definitions {
            if !seen.insert(definition.bucket_name.as_slice()) {
                continue;
            }
            if let Some(mut index) = open_existing(tx, definition) {
                index.remove_item(item_key)?;
            }
        }
        Ok(())
    }

    /// Moves `item_key` from the values in `previous` to the values in
    /// this map.
    ///
    /// Definitions present in both are left untouched. For a unique
    /// index, an old value is only removed while it still points at this
    /// item. For a non-unique index only this item's entry is removed.
    pub fn reindex(
        &self,
        tx: &mut WriteTxn<'_>,
        item_key: &[u8],
        previous: &IndexMap,
    ) -> CoreResult<()> {
        for old in previous.definitions.iter().filter(|d| !self.contains(d)) {
            remove_definition(tx, old, item_key)?;
        }
        for new in self.definitions.iter().filter(|d| !previous.contains(d)) {
            open_index(tx, new)?.add(&new.value, item_key)?;
        }
        Ok(())
    }
}

fn remove_definition(
    tx: &mut WriteTxn<'_>,
    definition: &IndexDefinition,
    item_key: &[u8],
) -> CoreResult<()> {
    if definition.unique {
        if let Some(mut index) = UniqueIndex::open_mut(tx, &definition.bucket_name) {
            let held = index.first_with_value(&definition.value);
            if held.as_deref() == Some(item_key) {
                index.remove_value(&definition.value)?;
            }
        }
    } else if let Some(mut index) = NonUniqueIndex::open_mut(tx, &definition.bucket_name) {
        index.remove_entry(&definition.value, item_key)?;
    }
    Ok(())
}

fn open_existing<'tx>(
    tx: &'tx mut WriteTxn<'_>,
    definition: &IndexDefinition,
) -> Option<Box<dyn SecondaryIndex + 'tx>> {
    let name = &definition.bucket_name;
    if definition.unique {
        UniqueIndex::open_mut(tx, name)
            .map(|index| Box::new(index) as Box<dyn SecondaryIndex + 'tx>)
    } else {
        NonUniqueIndex::open_mut(tx, name)
            .map(|index| Box::new(index) as Box<dyn SecondaryIndex + 'tx>)
    }
}

/// Opens the index a definition routes to for writing, creating its
/// bucket if missing.
pub fn open_index<'tx>(
    tx: &'tx mut WriteTxn<'_>,
    definition: &IndexDefinition,
) -> CoreResult<Box<dyn SecondaryIndex + 'tx>> {
    let name = &definition.bucket_name;
    let index: Box<dyn SecondaryIndex + 'tx> = if definition.unique {
        Box::new(UniqueIndex::create(tx, name)?)
    } else {
        Box::new(NonUniqueIndex::create(tx, name)?)
    };
    Ok(index)
}

/// Opens the index a definition routes to for reading, if it exists.
pub fn open_reader<'tx>(
    tx: &'tx ReadTxn,
    definition: &IndexDefinition,
) -> Option<Box<dyn IndexReader + 'tx>> {
    let name = &definition.bucket_name;
    if definition.unique {
        UniqueIndex::open(tx, name)
            .map(|index| Box::new(index) as Box<dyn IndexReader + 'tx>)
    } else {
        NonUniqueIndex::open(tx, name)
            .map(|index| Box::new(index) as Box<dyn IndexReader + 'tx>)
    }
}

/// A record type with indexed values.
pub trait Indexed {
    /// Name of the bucket holding the records themselves.
    fn bucket_name(&self) -> &[u8];

    /// The values of this record to index.
    fn index_map(&self) -> IndexMap;
}
