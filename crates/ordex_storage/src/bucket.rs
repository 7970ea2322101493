//! Buckets: independently ordered key-value namespaces.
//!
//! A bucket keeps its entries sorted by raw byte key. Read access goes
//! through [`ReadBucket`], mutation through [`WriteBucket`]; both are
//! implemented by the transaction-scoped handles [`Bucket`] and
//! [`BucketMut`] so that higher layers can be written once against the
//! traits and used from read or write transactions alike.

use crate::error::{StorageError, StorageResult};
use crate::log::LogOp;
use std::collections::BTreeMap;
use std::ops::Bound;

/// Sorted entries of one bucket.
pub(crate) type Entries = BTreeMap<Vec<u8>, Vec<u8>>;

/// A borrowed `(key, value)` pair.
pub type Entry<'a> = (&'a [u8], &'a [u8]);

/// Read operations on an ordered bucket.
pub trait ReadBucket {
    /// Returns the value stored under `key`.
    fn get(&self, key: &[u8]) -> Option<&[u8]>;

    /// Returns a cursor over the bucket in ascending key order.
    fn cursor(&self) -> Cursor<'_>;

    /// Returns the number of entries.
    fn len(&self) -> usize;

    /// Returns true if the bucket holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Mutating operations on an ordered bucket.
pub trait WriteBucket: ReadBucket {
    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::EmptyKey`] for an empty key and
    /// [`StorageError::KeyTooLarge`] for keys over the configured limit.
    fn put(&mut self, key: &[u8], value: &[u8]) -> StorageResult<()>;

    /// Removes `key`. Removing an absent key succeeds.
    fn delete(&mut self, key: &[u8]) -> StorageResult<()>;
}

impl<B: ReadBucket + ?Sized> ReadBucket for &B {
    fn get(&self, key: &[u8]) -> Option<&[u8]> {
        (**self).get(key)
    }

    fn cursor(&self) -> Cursor<'_> {
        (**self).cursor()
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}

impl<B: ReadBucket + ?Sized> ReadBucket for &mut B {
    fn get(&self, key: &[u8]) -> Option<&[u8]> {
        (**self).get(key)
    }

    fn cursor(&self) -> Cursor<'_> {
        (**self).cursor()
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}

impl<B: WriteBucket + ?Sized> WriteBucket for &mut B {
    fn put(&mut self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        (**self).put(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> StorageResult<()> {
        (**self).delete(key)
    }
}

#[derive(Debug, Clone, Copy)]
enum Position<'a> {
    Unpositioned,
    At(&'a [u8]),
    Exhausted,
}

/// A bidirectional cursor over one bucket.
///
/// `first`, `seek_last` and `seek` position the cursor and return the
/// entry they land on; `next` (via [`Iterator`]) and `prev` step from the
/// current position. A fresh cursor's `next` behaves like `first`, so a
/// cursor can be used directly in a `for` loop.
///
/// Entries borrow from the transaction snapshot and stay valid for as
/// long as the bucket handle does.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    entries: &'a Entries,
    position: Position<'a>,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(entries: &'a Entries) -> Self {
        Self {
            entries,
            position: Position::Unpositioned,
        }
    }

    fn land(&mut self, found: Option<(&'a Vec<u8>, &'a Vec<u8>)>) -> Option<Entry<'a>> {
        match found {
            Some((k, v)) => {
                self.position = Position::At(k.as_slice());
                Some((k.as_slice(), v.as_slice()))
            }
            None => {
                self.position = Position::Exhausted;
                None
            }
        }
    }

    /// Moves to the smallest key.
    pub fn first(&mut self) -> Option<Entry<'a>> {
        let found = self.entries.iter().next();
        self.land(found)
    }

    /// Moves to the largest key.
    ///
    /// Not named `last`, which [`Iterator::last`] would shadow.
    pub fn seek_last(&mut self) -> Option<Entry<'a>> {
        let found = self.entries.iter().next_back();
        self.land(found)
    }

    /// Moves to the smallest key greater than or equal to `key`.
    ///
    /// When there is no exact match the cursor lands on the next key in
    /// byte order, which may belong to an unrelated prefix; callers that
    /// seek to a prefix must check it themselves.
    pub fn seek(&mut self, key: &[u8]) -> Option<Entry<'a>> {
        let found = self
            .entries
            .range::<[u8], _>((Bound::Included(key), Bound::Unbounded))
            .next();
        self.land(found)
    }

    /// Steps to the previous key.
    pub fn prev(&mut self) -> Option<Entry<'a>> {
        match self.position {
            Position::Unpositioned => self.seek_last(),
            Position::At(current) => {
                let found = self
                    .entries
                    .range::<[u8], _>((Bound::Unbounded, Bound::Excluded(current)))
                    .next_back();
                self.land(found)
            }
            Position::Exhausted => None,
        }
    }
}

impl<'a> Iterator for Cursor<'a> {
    type Item = Entry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.position {
            Position::Unpositioned => self.first(),
            Position::At(current) => {
                let found = self
                    .entries
                    .range::<[u8], _>((Bound::Excluded(current), Bound::Unbounded))
                    .next();
                self.land(found)
            }
            Position::Exhausted => None,
        }
    }
}

/// Read-only handle to a bucket inside a transaction.
#[derive(Debug, Clone, Copy)]
pub struct Bucket<'a> {
    name: &'a [u8],
    entries: &'a Entries,
}

impl<'a> Bucket<'a> {
    pub(crate) fn new(name: &'a [u8], entries: &'a Entries) -> Self {
        Self { name, entries }
    }

    /// Returns the bucket name.
    #[must_use]
    pub fn name(&self) -> &'a [u8] {
        self.name
    }

    /// Returns a cursor that borrows for the full transaction lifetime.
    #[must_use]
    pub fn cursor_owned(&self) -> Cursor<'a> {
        Cursor::new(self.entries)
    }
}

impl ReadBucket for Bucket<'_> {
    fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    fn cursor(&self) -> Cursor<'_> {
        Cursor::new(self.entries)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Writable handle to a bucket inside a write transaction.
///
/// Every successful mutation is recorded for the transaction's commit
/// record; nothing is visible outside the transaction until it commits.
#[derive(Debug)]
pub struct BucketMut<'a> {
    name: Vec<u8>,
    entries: &'a mut Entries,
    ops: &'a mut Vec<LogOp>,
    max_key_size: usize,
}

impl<'a> BucketMut<'a> {
    pub(crate) fn new(
        name: &[u8],
        entries: &'a mut Entries,
        ops: &'a mut Vec<LogOp>,
        max_key_size: usize,
    ) -> Self {
        Self {
            name: name.to_vec(),
            entries,
            ops,
            max_key_size,
        }
    }

    /// Returns the bucket name.
    #[must_use]
    pub fn name(&self) -> &[u8] {
        &self.name
    }
}

impl ReadBucket for BucketMut<'_> {
    fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    fn cursor(&self) -> Cursor<'_> {
        Cursor::new(self.entries)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

impl WriteBucket for BucketMut<'_> {
    fn put(&mut self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        if key.is_empty() {
            return Err(StorageError::EmptyKey);
        }
        if key.len() > self.max_key_size {
            return Err(StorageError::KeyTooLarge {
                len: key.len(),
                max: self.max_key_size,
            });
        }

        self.entries.insert(key.to_vec(), value.to_vec());
        self.ops.push(LogOp::Put {
            bucket: self.name.clone(),
            key: key.to_vec(),
            value: value.to_vec(),
        });
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> StorageResult<()> {
        if self.entries.remove(key).is_some() {
            self.ops.push(LogOp::Delete {
                bucket: self.name.clone(),
                key: key.to_vec(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Entries {
        [
            (b"apple".to_vec(), b"1".to_vec()),
            (b"banana".to_vec(), b"2".to_vec()),
            (b"cherry".to_vec(), b"3".to_vec()),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn cursor_walks_forward() {
        let entries = entries();
        let keys: Vec<&[u8]> = Cursor::new(&entries).map(|(k, _)| k).collect();
        assert_eq!(keys, vec![&b"apple"[..], b"banana", b"cherry"]);
    }

    #[test]
    fn seek_lands_on_next_greater_key() {
        let entries = entries();
        let mut cursor = Cursor::new(&entries);

        assert_eq!(cursor.seek(b"b").map(|(k, _)| k), Some(&b"banana"[..]));
        assert_eq!(cursor.next().map(|(k, _)| k), Some(&b"cherry"[..]));
        assert_eq!(cursor.next(), None);
        assert_eq!(cursor.next(), None);

        assert_eq!(cursor.seek(b"zebra"), None);
    }

    #[test]
    fn cursor_walks_backward() {
        let entries = entries();
        let mut cursor = Cursor::new(&entries);

        assert_eq!(cursor.seek_last().map(|(_, v)| v), Some(&b"3"[..]));
        assert_eq!(cursor.prev().map(|(_, v)| v), Some(&b"2"[..]));
        assert_eq!(cursor.prev().map(|(_, v)| v), Some(&b"1"[..]));
        assert_eq!(cursor.prev(), None);
    }

    #[test]
    fn fresh_cursor_prev_starts_at_end() {
        let entries = entries();
        let mut cursor = Cursor::new(&entries);

        assert_eq!(cursor.prev().map(|(_, v)| v), Some(&b"3"[..]));
        assert_eq!(cursor.next(), None);
        assert_eq!(cursor.seek_last().map(|(_, v)| v), Some(&b"3"[..]));
        assert_eq!(cursor.prev().map(|(_, v)| v), Some(&b"2"[..]));
        assert_eq!(cursor.next().map(|(_, v)| v), Some(&b"3"[..]));
    }

    #[test]
    fn put_validates_and_records() {
        let mut entries = Entries::new();
        let mut ops = Vec::new();
        let mut bucket = BucketMut::new(b"fruit", &mut entries, &mut ops, 8);

        assert!(matches!(bucket.put(b"", b"x"), Err(StorageError::EmptyKey)));
        assert!(matches!(
            bucket.put(b"way too long", b"x"),
            Err(StorageError::KeyTooLarge { len: 12, max: 8 })
        ));

        bucket.put(b"kiwi", b"4").unwrap();
        bucket.delete(b"kiwi").unwrap();
        bucket.delete(b"absent").unwrap();
        assert!(bucket.is_empty());

        assert_eq!(ops.len(), 2);
        assert!(matches!(&ops[1], LogOp::Delete { key, .. } if key == b"kiwi"));
    }
}
