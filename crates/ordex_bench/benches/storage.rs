//! Store and commit log benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ordex_bench::random_data;
use ordex_storage::{ReadBucket, Store, StoreConfig, WriteBucket};
use tempfile::TempDir;

/// Benchmark commits of a single put, in memory and on disk.
fn bench_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit");

    for size in [64, 1024].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::new("memory", size), size, |b, &size| {
            let store = Store::open_in_memory().unwrap();
            let value = random_data(size);
            let mut n = 0u64;
            b.iter(|| {
                n += 1;
                let mut tx = store.begin_write();
                tx.create_bucket_if_not_exists(b"bench")
                    .unwrap()
                    .put(&n.to_be_bytes(), black_box(&value))
                    .unwrap();
                black_box(tx.commit().unwrap());
            });
        });
    }

    group.sample_size(20);
    group.bench_function("file_unsynced", |b| {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bench.db");
        let store = Store::open(&path, StoreConfig::new().sync_on_commit(false)).unwrap();
        let value = random_data(256);
        let mut n = 0u64;
        b.iter(|| {
            n += 1;
            let mut tx = store.begin_write();
            tx.create_bucket_if_not_exists(b"bench")
                .unwrap()
                .put(&n.to_be_bytes(), &value)
                .unwrap();
            black_box(tx.commit().unwrap());
        });
    });

    group.finish();
}

/// Benchmark cursor seeks in a populated bucket.
fn bench_seek(c: &mut Criterion) {
    let store = Store::open_in_memory().unwrap();
    let mut tx = store.begin_write();
    let mut bucket = tx.create_bucket(b"bench").unwrap();
    for n in 0..10_000u64 {
        bucket.put(&n.to_be_bytes(), b"v").unwrap();
    }
    tx.commit().unwrap();

    let read = store.begin_read();
    let bucket = read.bucket(b"bench").unwrap();
    c.bench_function("cursor_seek", |b| {
        let target = 5_000u64.to_be_bytes();
        b.iter(|| black_box(bucket.cursor().seek(black_box(&target))));
    });
}

/// Benchmark replaying a commit log on open.
fn bench_replay(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("replay.db");
    {
        let store = Store::open(&path, StoreConfig::new().sync_on_commit(false)).unwrap();
        for n in 0..1_000u64 {
            let mut tx = store.begin_write();
            tx.create_bucket_if_not_exists(b"bench")
                .unwrap()
                .put(&n.to_be_bytes(), &random_data(64))
                .unwrap();
            tx.commit().unwrap();
        }
    }

    let mut group = c.benchmark_group("replay");
    group.sample_size(20);
    group.bench_function("1000_commits", |b| {
        b.iter(|| {
            let store = Store::open(&path, StoreConfig::default()).unwrap();
            black_box(store.replay_stats());
        });
    });
    group.finish();
}

criterion_group!(benches, bench_commit, bench_seek, bench_replay);
criterion_main!(benches);
