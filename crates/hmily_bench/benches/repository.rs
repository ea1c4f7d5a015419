//! Repository benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hmily_bench::sample_participant;
use hmily_repository::{
    filter, FileConfig, FileRepository, HmilyRepository, InMemoryRepository, Participant,
    RecordRepository, Timestamp, Transaction,
};
use hmily_serializer::SerializerKind;
use tempfile::TempDir;

fn open(temp_dir: &TempDir, serializer: SerializerKind) -> FileRepository {
    FileRepository::open(FileConfig::new(temp_dir.path(), "bench").serializer(serializer)).unwrap()
}

/// Benchmark participant creation per serializer.
fn bench_file_create(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_create");
    group.sample_size(50);

    for kind in SerializerKind::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(kind), &kind, |b, &kind| {
            let temp_dir = TempDir::new().unwrap();
            let repo = open(&temp_dir, kind);
            let mut id = 0u64;

            b.iter(|| {
                id += 1;
                let mut p = sample_participant(id, 128);
                repo.create_hmily_participant(black_box(&mut p)).unwrap();
            });
        });
    }

    group.finish();
}

/// Benchmark overwriting one record, as status updates do.
fn bench_file_update_status(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let repo = open(&temp_dir, SerializerKind::Cbor);
    repo.create_hmily_transaction(&mut Transaction::new(1, "bench")).unwrap();

    c.bench_function("file_update_status", |b| {
        let mut status = 0;
        b.iter(|| {
            status = (status + 1) % 4;
            let affected = repo.update_hmily_transaction_status(black_box(1), status);
            black_box(affected.rows());
        });
    });
}

/// Benchmark point lookups.
fn bench_file_find(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_find");

    for args_len in [16, 256, 512].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(args_len), args_len, |b, &args_len| {
            let temp_dir = TempDir::new().unwrap();
            let repo = open(&temp_dir, SerializerKind::Cbor);
            let mut p = sample_participant(7, args_len);
            repo.create_hmily_participant(&mut p).unwrap();

            b.iter(|| {
                let found = RecordRepository::<Participant>::find_by_id(&repo, black_box(7));
                black_box(found);
            });
        });
    }

    group.finish();
}

/// Benchmark recovery scans over populated directories.
fn bench_file_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_scan");
    group.sample_size(20);

    for count in [100u64, 1_000].iter() {
        group.throughput(Throughput::Elements(*count));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let temp_dir = TempDir::new().unwrap();
            let repo = open(&temp_dir, SerializerKind::Cbor);
            for id in 1..=count {
                repo.create_hmily_participant(&mut sample_participant(id, 64)).unwrap();
            }
            let cutoff = Timestamp::now().saturating_add(std::time::Duration::from_secs(3600));

            b.iter(|| {
                let stuck = repo.list_hmily_participant(black_box(cutoff), "TCC", 50);
                black_box(stuck.len());
            });
        });
    }

    group.finish();
}

/// Benchmark a full-scan predicate against the in-memory backend.
fn bench_memory_scan(c: &mut Criterion) {
    let repo = InMemoryRepository::new("bench");
    for id in 1..=1_000 {
        repo.create_hmily_transaction(&mut Transaction::new(id, "bench")).unwrap();
    }

    c.bench_function("memory_scan_1000", |b| {
        b.iter(|| {
            let mut pick = filter::limit(black_box(100), |t: &Transaction| t.trans_id % 2 == 0);
            let found = RecordRepository::<Transaction>::list_by_filter(&repo, &mut pick);
            black_box(found.len());
        });
    });
}

criterion_group!(
    benches,
    bench_file_create,
    bench_file_update_status,
    bench_file_find,
    bench_file_scan,
    bench_memory_scan,
);

criterion_main!(benches);
