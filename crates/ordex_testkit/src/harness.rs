//! Model-checking harness for indexes.
//!
//! [`IndexHarness`] applies operations to a real index, each in its own
//! write transaction, and to an [`IndexModel`] built from plain
//! collections. After every step the two can be compared with
//! [`IndexHarness::verify`].

use crate::fixtures::TestStore;
use crate::generators::IndexOp;
use ordex_core::index::make_prefix;
use ordex_core::{CoreResult, IndexReader, NonUniqueIndex, SecondaryIndex, UniqueIndex};
use ordex_storage::ReadTxn;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

/// In-memory model of one index: value -> items holding it.
#[derive(Debug, Clone, Default)]
pub struct IndexModel {
    unique: bool,
    entries: BTreeMap<Vec<u8>, BTreeSet<Vec<u8>>>,
}

impl IndexModel {
    /// Creates an empty model.
    pub fn new(unique: bool) -> Self {
        Self {
            unique,
            entries: BTreeMap::new(),
        }
    }

    /// Applies an operation. Returns false when a unique index would
    /// reject the add, leaving the model unchanged.
    pub fn apply(&mut self, op: &IndexOp) -> bool {
        match op {
            IndexOp::Add { value, item } => {
                let item = item.as_bytes().to_vec();
                let holders = self.entries.entry(value.clone()).or_default();
                if self.unique && !holders.is_empty() && !holders.contains(&item) {
                    return false;
                }
                holders.insert(item);
            }
            IndexOp::RemoveItem { item } => {
                for holders in self.entries.values_mut() {
                    holders.remove(item.as_bytes().as_slice());
                }
                self.entries.retain(|_, holders| !holders.is_empty());
            }
            IndexOp::RemoveValue { value } => {
                self.entries.remove(value);
            }
        }
        true
    }

    /// Items holding `value`, in item order.
    pub fn with_value(&self, value: &[u8]) -> Vec<Vec<u8>> {
        self.entries
            .get(value)
            .map(|holders| holders.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Items in index key order, as `IndexReader::all` returns them.
    ///
    /// A unique index yields one item per value, so an item holding two
    /// values appears twice. A non-unique index yields distinct items,
    /// ordered by `value ‖ 0xFF`, which differs from plain value order
    /// when one value is a prefix of another.
    pub fn all(&self) -> Vec<Vec<u8>> {
        self.items_in(self.entries.iter())
    }

    /// Items for values in `min..=max`, as `IndexReader::all_in_range`
    /// returns them for fixed-width values.
    pub fn in_range(&self, min: &[u8], max: &[u8]) -> Vec<Vec<u8>> {
        if min > max {
            return Vec::new();
        }
        self.items_in(
            self.entries
                .range::<[u8], _>((Bound::Included(min), Bound::Included(max))),
        )
    }

    fn items_in<'a>(
        &'a self,
        entries: impl Iterator<Item = (&'a Vec<u8>, &'a BTreeSet<Vec<u8>>)>,
    ) -> Vec<Vec<u8>> {
        let mut ordered: Vec<_> = entries.collect();
        if self.unique {
            return ordered
                .into_iter()
                .flat_map(|(_, holders)| holders.iter().cloned())
                .collect();
        }

        ordered.sort_by_key(|(value, _)| make_prefix(value));
        let mut seen = BTreeSet::new();
        ordered
            .into_iter()
            .flat_map(|(_, holders)| holders)
            .filter(|item| seen.insert(item.as_slice()))
            .cloned()
            .collect()
    }

    /// Number of `(value, item)` pairs.
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeSet::len).sum()
    }

    /// Returns true if the model holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Values currently held by at least one item.
    pub fn values(&self) -> impl Iterator<Item = &Vec<u8>> {
        self.entries.keys()
    }
}

/// Drives a stored index and its model in lockstep.
pub struct IndexHarness {
    store: TestStore,
    name: Vec<u8>,
    model: IndexModel,
}

impl IndexHarness {
    /// Creates a harness over a fresh in-memory store.
    pub fn new(name: &[u8], unique: bool) -> Self {
        Self {
            store: TestStore::memory(),
            name: name.to_vec(),
            model: IndexModel::new(unique),
        }
    }

    /// Returns the model.
    pub fn model(&self) -> &IndexModel {
        &self.model
    }

    /// Returns the store.
    pub fn store(&self) -> &TestStore {
        &self.store
    }

    /// Applies `op` to both sides and checks they agree on whether it was
    /// accepted.
    pub fn apply(&mut self, op: &IndexOp) {
        let accepted = self.model.apply(op);
        let unique = self.model.unique;
        let name = self.name.clone();

        let result = self.store.update(|tx| {
            let mut index: Box<dyn SecondaryIndex + '_> = if unique {
                Box::new(UniqueIndex::create(tx, &name)?)
            } else {
                Box::new(NonUniqueIndex::create(tx, &name)?)
            };
            apply_op(index.as_mut(), op)
        });

        match result {
            Ok(()) => assert!(accepted, "store accepted {op:?}, model rejected it"),
            Err(err) => {
                assert!(!accepted, "store rejected {op:?}: {err}");
                assert!(err.is_already_exists(), "unexpected error {err}");
            }
        }
    }

    /// Compares every query against the model.
    pub fn verify(&self) {
        let tx = self.store.begin_read();
        let index = open(&tx, &self.name, self.model.unique);
        let Some(index) = index else {
            assert!(self.model.is_empty(), "index missing but model has entries");
            return;
        };

        assert_eq!(index.len(), self.model.len(), "entry count");
        assert_eq!(index.all(None).unwrap(), self.model.all(), "all items");
        for value in self.model.values() {
            let expected = self.model.with_value(value);
            assert_eq!(
                index.all_with_value(value, None).unwrap(),
                expected,
                "items for value {value:?}"
            );
            assert_eq!(index.first_with_value(value), expected.first().cloned());
        }
    }

    /// Compares a range query against the model.
    ///
    /// Only meaningful for fixed-width values; with variable widths a
    /// non-unique range also catches values that extend `max`.
    pub fn verify_range(&self, min: &[u8], max: &[u8]) {
        let tx = self.store.begin_read();
        let Some(index) = open(&tx, &self.name, self.model.unique) else {
            assert!(self.model.is_empty(), "index missing but model has entries");
            return;
        };

        assert_eq!(
            index.all_in_range(min, max, None).unwrap(),
            self.model.in_range(min, max),
            "items for range {min:?}..={max:?}"
        );
    }
}

fn apply_op(index: &mut dyn SecondaryIndex, op: &IndexOp) -> CoreResult<()> {
    match op {
        IndexOp::Add { value, item } => index.add(value, item.as_bytes()),
        IndexOp::RemoveItem { item } => index.remove_item(item.as_bytes()),
        IndexOp::RemoveValue { value } => index.remove_value(value),
    }
}

fn open<'tx>(tx: &'tx ReadTxn, name: &[u8], unique: bool) -> Option<Box<dyn IndexReader + 'tx>> {
    if unique {
        UniqueIndex::open(tx, name).map(|index| Box::new(index) as Box<dyn IndexReader + 'tx>)
    } else {
        NonUniqueIndex::open(tx, name)
            .map(|index| Box::new(index) as Box<dyn IndexReader + 'tx>)
    }
}
