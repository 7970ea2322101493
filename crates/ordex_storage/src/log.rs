//! Commit log framing and replay.
//!
//! Every committed write transaction becomes one record:
//!
//! ```text
//! | magic "OXCL" (4) | version (2) | payload len (4) | payload | crc32 (4) |
//! ```
//!
//! The payload is an operation count followed by the operations in the order
//! they were applied. All integers are little-endian; byte strings carry a
//! u32 length prefix. The CRC covers everything before it.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use tracing::{debug, warn};

/// Magic bytes opening every commit record.
pub const LOG_MAGIC: [u8; 4] = *b"OXCL";

/// Current commit log format version.
pub const LOG_VERSION: u16 = 1;

/// magic (4) + version (2) + length (4)
const HEADER_SIZE: usize = 10;

const CRC_SIZE: usize = 4;

const OP_CREATE_BUCKET: u8 = 1;
const OP_DELETE_BUCKET: u8 = 2;
const OP_PUT: u8 = 3;
const OP_DELETE: u8 = 4;

/// A single mutation recorded in the commit log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOp {
    /// A bucket was created.
    CreateBucket {
        /// Bucket name.
        name: Vec<u8>,
    },
    /// A bucket and all of its entries were removed.
    DeleteBucket {
        /// Bucket name.
        name: Vec<u8>,
    },
    /// A key was written.
    Put {
        /// Bucket name.
        bucket: Vec<u8>,
        /// Entry key.
        key: Vec<u8>,
        /// Entry value.
        value: Vec<u8>,
    },
    /// A key was removed.
    Delete {
        /// Bucket name.
        bucket: Vec<u8>,
        /// Entry key.
        key: Vec<u8>,
    },
}

impl LogOp {
    fn encode_into(&self, buf: &mut Vec<u8>) -> StorageResult<()> {
        match self {
            Self::CreateBucket { name } => {
                buf.push(OP_CREATE_BUCKET);
                put_bytes(buf, name)
            }
            Self::DeleteBucket { name } => {
                buf.push(OP_DELETE_BUCKET);
                put_bytes(buf, name)
            }
            Self::Put { bucket, key, value } => {
                buf.push(OP_PUT);
                put_bytes(buf, bucket)?;
                put_bytes(buf, key)?;
                put_bytes(buf, value)
            }
            Self::Delete { bucket, key } => {
                buf.push(OP_DELETE);
                put_bytes(buf, bucket)?;
                put_bytes(buf, key)
            }
        }
    }

    fn decode_from(reader: &mut Reader<'_>) -> StorageResult<Self> {
        let op = match reader.u8()? {
            OP_CREATE_BUCKET => Self::CreateBucket {
                name: reader.bytes()?,
            },
            OP_DELETE_BUCKET => Self::DeleteBucket {
                name: reader.bytes()?,
            },
            OP_PUT => Self::Put {
                bucket: reader.bytes()?,
                key: reader.bytes()?,
                value: reader.bytes()?,
            },
            OP_DELETE => Self::Delete {
                bucket: reader.bytes()?,
                key: reader.bytes()?,
            },
            other => {
                return Err(StorageError::corrupted(format!(
                    "unknown log operation {other}"
                )))
            }
        };
        Ok(op)
    }
}

fn put_bytes(buf: &mut Vec<u8>, bytes: &[u8]) -> StorageResult<()> {
    buf.extend_from_slice(&length_prefix(bytes.len(), "byte string")?);
    buf.extend_from_slice(bytes);
    Ok(())
}

fn length_prefix(len: usize, what: &str) -> StorageResult<[u8; 4]> {
    u32::try_from(len)
        .map(u32::to_le_bytes)
        .map_err(|_| {
            StorageError::corrupted(format!("{what} of {len} bytes is too large to log"))
        })
}

/// Cursor over a decoded payload.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, len: usize) -> StorageResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| StorageError::corrupted("commit payload truncated"))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> StorageResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> StorageResult<u32> {
        let raw = self.take(4)?;
        Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    fn bytes(&mut self) -> StorageResult<Vec<u8>> {
        let len = self.u32()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    fn is_exhausted(&self) -> bool {
        self.pos == self.data.len()
    }
}

/// Encodes one commit record, envelope included.
///
/// # Errors
///
/// Fails if the payload does not fit the 4-byte length field.
pub fn encode_record(ops: &[LogOp]) -> StorageResult<Vec<u8>> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&length_prefix(ops.len(), "operation count")?);
    for op in ops {
        op.encode_into(&mut payload)?;
    }

    let len = length_prefix(payload.len(), "commit payload")?;

    let mut data = Vec::with_capacity(HEADER_SIZE + payload.len() + CRC_SIZE);
    data.extend_from_slice(&LOG_MAGIC);
    data.extend_from_slice(&LOG_VERSION.to_le_bytes());
    data.extend_from_slice(&len);
    data.extend_from_slice(&payload);

    let crc = crc32fast::hash(&data);
    data.extend_from_slice(&crc.to_le_bytes());

    Ok(data)
}

/// Decodes a payload previously produced by [`encode_record`].
pub fn decode_payload(payload: &[u8]) -> StorageResult<Vec<LogOp>> {
    let mut reader = Reader::new(payload);
    let count = reader.u32()? as usize;
    let mut ops = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        ops.push(LogOp::decode_from(&mut reader)?);
    }
    if !reader.is_exhausted() {
        return Err(StorageError::corrupted("trailing bytes in commit payload"));
    }
    Ok(ops)
}

/// Outcome of reading the record at one offset.
#[derive(Debug)]
pub enum LogEntry {
    /// A complete, checksummed record.
    Commit {
        /// Offset of the record.
        offset: u64,
        /// Offset of the following record.
        next: u64,
        /// Operations in application order.
        ops: Vec<LogOp>,
    },
    /// The log ends here with an incomplete or damaged record.
    Torn {
        /// Offset where the damage starts.
        offset: u64,
        /// What was wrong with it.
        reason: String,
    },
}

/// Counters reported after replaying a log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Commit records applied.
    pub commits: usize,
    /// Operations applied.
    pub ops: usize,
    /// Bytes dropped from a torn tail.
    pub truncated_bytes: u64,
}

/// Append-only commit log on top of a [`StorageBackend`].
pub struct CommitLog {
    backend: Box<dyn StorageBackend>,
    sync_on_commit: bool,
}

impl CommitLog {
    /// Wraps a backend.
    pub fn new(backend: Box<dyn StorageBackend>, sync_on_commit: bool) -> Self {
        Self {
            backend,
            sync_on_commit,
        }
    }

    /// Appends one commit, returning its offset.
    ///
    /// On failure the log is cut back to where the record started, so a
    /// commit that reported an error is never replayed.
    pub fn append(&mut self, ops: &[LogOp]) -> StorageResult<u64> {
        let data = encode_record(ops)?;
        let offset = self.backend.size()?;
        if let Err(err) = self.write_record(&data) {
            if let Err(undo) = self.backend.truncate(offset) {
                warn!(offset, error = %undo, "failed to discard unwritten commit");
            }
            return Err(err);
        }
        Ok(offset)
    }

    fn write_record(&mut self, data: &[u8]) -> StorageResult<()> {
        self.backend.append(data)?;
        if self.sync_on_commit {
            self.backend.sync()
        } else {
            self.backend.flush()
        }
    }

    /// Returns the log size in bytes.
    pub fn size(&self) -> StorageResult<u64> {
        self.backend.size()
    }

    /// Reads the record starting at `offset`, or `None` at a clean end.
    pub fn read_entry(&self, offset: u64) -> StorageResult<Option<LogEntry>> {
        let size = self.backend.size()?;
        if offset >= size {
            return Ok(None);
        }

        let torn = |reason: &str| {
            Ok(Some(LogEntry::Torn {
                offset,
                reason: reason.to_string(),
            }))
        };

        if size - offset < (HEADER_SIZE + CRC_SIZE) as u64 {
            return torn("short record header");
        }

        let header = self.backend.read_at(offset, HEADER_SIZE)?;
        if header[0..4] != LOG_MAGIC {
            return torn("bad magic");
        }
        let version = u16::from_le_bytes([header[4], header[5]]);
        if version != LOG_VERSION {
            return Err(StorageError::corrupted(format!(
                "unsupported commit log version {version}"
            )));
        }
        let len = u32::from_le_bytes([header[6], header[7], header[8], header[9]]) as usize;

        let total = (HEADER_SIZE + len + CRC_SIZE) as u64;
        if size - offset < total {
            return torn("record extends past end of log");
        }

        let record = self.backend.read_at(offset, total as usize)?;
        let body_end = HEADER_SIZE + len;
        let stored = u32::from_le_bytes([
            record[body_end],
            record[body_end + 1],
            record[body_end + 2],
            record[body_end + 3],
        ]);
        if crc32fast::hash(&record[..body_end]) != stored {
            return torn("checksum mismatch");
        }

        match decode_payload(&record[HEADER_SIZE..body_end]) {
            Ok(ops) => Ok(Some(LogEntry::Commit {
                offset,
                next: offset + total,
                ops,
            })),
            Err(err) => torn(&err.to_string()),
        }
    }

    /// Reads every record without modifying the log.
    pub fn entries(&self) -> StorageResult<Vec<LogEntry>> {
        let mut entries = Vec::new();
        let mut offset = 0;
        while let Some(entry) = self.read_entry(offset)? {
            match entry {
                LogEntry::Commit { next, .. } => {
                    offset = next;
                    entries.push(entry);
                }
                LogEntry::Torn { .. } => {
                    entries.push(entry);
                    break;
                }
            }
        }
        Ok(entries)
    }

    /// Applies every intact commit in order and truncates a torn tail.
    pub fn replay<F>(&mut self, mut apply: F) -> StorageResult<ReplayStats>
    where
        F: FnMut(LogOp) -> StorageResult<()>,
    {
        let mut stats = ReplayStats::default();
        let mut offset = 0;

        while let Some(entry) = self.read_entry(offset)? {
            match entry {
                LogEntry::Commit { next, ops, .. } => {
                    stats.commits += 1;
                    stats.ops += ops.len();
                    for op in ops {
                        apply(op)?;
                    }
                    offset = next;
                }
                LogEntry::Torn { offset, reason } => {
                    let size = self.backend.size()?;
                    warn!(offset, reason = %reason, "truncating torn commit log tail");
                    self.backend.truncate(offset)?;
                    stats.truncated_bytes = size - offset;
                    break;
                }
            }
        }

        debug!(
            commits = stats.commits,
            ops = stats.ops,
            "commit log replayed"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBackend;
    use proptest::prelude::*;
    use std::io;

    /// Accepts appends but fails every sync.
    #[derive(Default)]
    struct FailingSync {
        inner: InMemoryBackend,
    }

    impl StorageBackend for FailingSync {
        fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
            self.inner.read_at(offset, len)
        }

        fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
            self.inner.append(data)
        }

        fn flush(&mut self) -> StorageResult<()> {
            Ok(())
        }

        fn sync(&mut self) -> StorageResult<()> {
            Err(StorageError::Io(io::Error::new(io::ErrorKind::Other, "disk gone")))
        }

        fn size(&self) -> StorageResult<u64> {
            self.inner.size()
        }

        fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
            self.inner.truncate(new_size)
        }
    }

    fn log_op() -> impl Strategy<Value = LogOp> {
        let bytes = || prop::collection::vec(any::<u8>(), 0..32);
        prop_oneof![
            bytes().prop_map(|name| LogOp::CreateBucket { name }),
            bytes().prop_map(|name| LogOp::DeleteBucket { name }),
            (bytes(), bytes(), bytes())
                .prop_map(|(bucket, key, value)| LogOp::Put { bucket, key, value }),
            (bytes(), bytes()).prop_map(|(bucket, key)| LogOp::Delete { bucket, key }),
        ]
    }

    proptest! {
        #[test]
        fn any_ops_survive_a_record(ops in prop::collection::vec(log_op(), 0..16)) {
            let record = encode_record(&ops).unwrap();
            let backend = InMemoryBackend::with_data(record.clone());
            let log = CommitLog::new(Box::new(backend), true);

            match log.read_entry(0).unwrap() {
                Some(LogEntry::Commit { next, ops: read, .. }) => {
                    prop_assert_eq!(next, record.len() as u64);
                    prop_assert_eq!(read, ops);
                }
                other => prop_assert!(false, "expected a commit, got {:?}", other),
            }
        }
    }

    fn sample_ops() -> Vec<LogOp> {
        vec![
            LogOp::CreateBucket {
                name: b"people".to_vec(),
            },
            LogOp::Put {
                bucket: b"people".to_vec(),
                key: vec![1; 16],
                value: b"ada".to_vec(),
            },
            LogOp::Delete {
                bucket: b"people".to_vec(),
                key: vec![2; 16],
            },
            LogOp::DeleteBucket {
                name: b"scratch".to_vec(),
            },
        ]
    }

    #[test]
    fn record_payload_decodes() {
        let ops = sample_ops();
        let record = encode_record(&ops).unwrap();
        assert_eq!(&record[0..4], &LOG_MAGIC);

        let payload = &record[HEADER_SIZE..record.len() - CRC_SIZE];
        assert_eq!(decode_payload(payload).unwrap(), ops);
    }

    #[test]
    fn replay_applies_in_order() {
        let mut log = CommitLog::new(Box::new(InMemoryBackend::new()), true);
        log.append(&sample_ops()).unwrap();
        log.append(&[LogOp::DeleteBucket {
            name: b"people".to_vec(),
        }])
        .unwrap();

        let mut seen = Vec::new();
        let stats = log
            .replay(|op| {
                seen.push(op);
                Ok(())
            })
            .unwrap();

        assert_eq!(stats.commits, 2);
        assert_eq!(stats.ops, 5);
        assert_eq!(stats.truncated_bytes, 0);
        assert!(matches!(seen.last(), Some(LogOp::DeleteBucket { .. })));
    }

    #[test]
    fn torn_tail_is_truncated() {
        let good = encode_record(&sample_ops()).unwrap();
        let mut data = good.clone();
        let second = encode_record(&sample_ops()).unwrap();
        data.extend_from_slice(&second[..second.len() - 3]);

        let mut log = CommitLog::new(Box::new(InMemoryBackend::with_data(data)), true);
        let stats = log.replay(|_| Ok(())).unwrap();

        assert_eq!(stats.commits, 1);
        assert_eq!(stats.truncated_bytes, (second.len() - 3) as u64);
        assert_eq!(log.size().unwrap(), good.len() as u64);
    }

    #[test]
    fn checksum_mismatch_stops_replay() {
        let mut data = encode_record(&sample_ops()).unwrap();
        let mid = data.len() / 2;
        data[mid] ^= 0x55;

        let log = CommitLog::new(Box::new(InMemoryBackend::with_data(data)), true);
        let entries = log.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(matches!(entries[0], LogEntry::Torn { offset: 0, .. }));
    }

    #[test]
    fn failed_sync_leaves_no_record() {
        let mut log = CommitLog::new(Box::new(FailingSync::default()), true);

        let result = log.append(&sample_ops());
        assert!(matches!(result, Err(StorageError::Io(_))));
        assert_eq!(log.size().unwrap(), 0);
        assert!(log.entries().unwrap().is_empty());
    }

    #[test]
    fn oversized_length_is_rejected() {
        assert!(length_prefix(u32::MAX as usize, "value").is_ok());
        #[cfg(target_pointer_width = "64")]
        assert!(matches!(
            length_prefix(u32::MAX as usize + 1, "value"),
            Err(StorageError::Corrupted(_))
        ));
    }

    #[test]
    fn empty_log_has_no_entries() {
        let log = CommitLog::new(Box::new(InMemoryBackend::new()), false);
        assert!(log.entries().unwrap().is_empty());
    }
}
