//! Stress helpers for concurrent index access.
//!
//! One writer indexes records while reader threads check that every
//! snapshot they see is internally consistent.

use ordex_core::encoding::{int_to_bytes, unsigned_from_bytes};
use ordex_core::{CoreError, IndexReader, ItemKey, NonUniqueIndex, SecondaryIndex};
use ordex_storage::{ReadBucket, Store, WriteBucket};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Bucket holding the stress records.
pub const RECORDS: &[u8] = b"stress";

/// Bucket holding the committed record count.
pub const META: &[u8] = b"stress_meta";

/// Index bucket the stress records are indexed into.
pub const STRESS_INDEX: &[u8] = b"_index_stress";

const COUNT_KEY: &[u8] = b"count";

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Records written.
    pub writes: usize,
    /// Snapshots checked by readers.
    pub reads: usize,
    /// Snapshots that failed a consistency check.
    pub inconsistent: usize,
    /// Total duration.
    pub duration: Duration,
}

impl StressTestResult {
    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Writes: {}", self.writes);
        println!("Snapshot reads: {}", self.reads);
        println!("Inconsistent: {}", self.inconsistent);
        println!("Duration: {:?}", self.duration);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of records the writer indexes.
    pub writes: usize,
    /// Number of reader threads.
    pub readers: usize,
    /// Number of distinct indexed values.
    pub values: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            writes: 500,
            readers: 4,
            values: 16,
        }
    }
}

/// Writes records with one indexed value each while readers verify that
/// the index entry count always matches the committed record count.
pub fn stress_index_snapshots(store: &Store, config: &StressConfig) -> StressTestResult {
    let done = Arc::new(AtomicBool::new(false));
    let reads = Arc::new(AtomicUsize::new(0));
    let inconsistent = Arc::new(AtomicUsize::new(0));
    let start = Instant::now();

    let readers: Vec<_> = (0..config.readers)
        .map(|_| {
            let store = store.clone();
            let done = Arc::clone(&done);
            let reads = Arc::clone(&reads);
            let inconsistent = Arc::clone(&inconsistent);
            thread::spawn(move || {
                while !done.load(Ordering::Acquire) {
                    if !snapshot_is_consistent(&store) {
                        inconsistent.fetch_add(1, Ordering::Relaxed);
                    }
                    reads.fetch_add(1, Ordering::Relaxed);
                }
            })
        })
        .collect();

    let mut writes = 0;
    for n in 0..config.writes {
        let value = format!("value-{:04}", n % config.values.max(1));
        let result = store.update(|tx| {
            let key = ItemKey::generate()?;
            tx.create_bucket_if_not_exists(RECORDS)?
                .put(key.as_bytes(), value.as_bytes())?;

            let mut meta = tx.create_bucket_if_not_exists(META)?;
            let count = meta
                .get(COUNT_KEY)
                .map(unsigned_from_bytes)
                .transpose()?
                .unwrap_or(0);
            meta.put(COUNT_KEY, &int_to_bytes(count + 1))?;

            NonUniqueIndex::create(tx, STRESS_INDEX)?.add(value.as_bytes(), key.as_bytes())?;
            Ok::<_, CoreError>(())
        });
        if result.is_ok() {
            writes += 1;
        }
    }

    done.store(true, Ordering::Release);
    for reader in readers {
        reader.join().expect("Reader thread panicked");
    }

    StressTestResult {
        writes,
        reads: reads.load(Ordering::Relaxed),
        inconsistent: inconsistent.load(Ordering::Relaxed),
        duration: start.elapsed(),
    }
}

fn snapshot_is_consistent(store: &Store) -> bool {
    let tx = store.begin_read();
    let count = tx
        .bucket(META)
        .and_then(|meta| meta.get(COUNT_KEY).map(unsigned_from_bytes))
        .transpose();
    let Ok(count) = count else {
        return false;
    };
    let count = count.unwrap_or(0) as usize;

    let records = tx.bucket(RECORDS).map_or(0, |b| b.len());
    let indexed = NonUniqueIndex::open(&tx, STRESS_INDEX).map_or(0, |idx| idx.len());
    records == count && indexed == count
}
