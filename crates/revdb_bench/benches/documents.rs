//! Document operation benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use revdb_bench::utils::{generate_documents, populated_store, random_content};
use revdb_core::{Context, DocStore, Document, DocumentId, DriverConfig, SharedDriver};
use tempfile::TempDir;

/// Benchmark saving new documents of varying size.
fn bench_save(c: &mut Criterion) {
    let mut group = c.benchmark_group("save");
    let ctx = Context::background();

    for size in [64, 1024, 16384].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let dir = TempDir::new().unwrap();
            let store = DocStore::new(SharedDriver::new(DriverConfig::new(
                dir.path().join("bench.redb"),
            )));
            let content = random_content(size);

            b.iter(|| {
                let doc = Document::new(DocumentId::generate(), black_box(content.clone()));
                store.save(&ctx, "bench", doc).unwrap();
            });
        });
    }
    group.finish();
}

/// Benchmark saving batches in one transaction.
fn bench_save_many(c: &mut Criterion) {
    let mut group = c.benchmark_group("save_many");
    let ctx = Context::background();

    for batch_size in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*batch_size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            batch_size,
            |b, &batch_size| {
                let dir = TempDir::new().unwrap();
                let store = DocStore::new(SharedDriver::new(DriverConfig::new(
                    dir.path().join("bench.redb"),
                )));

                b.iter(|| {
                    let docs = generate_documents(batch_size, 256);
                    store.save_many(&ctx, "bench", black_box(docs)).unwrap();
                });
            },
        );
    }
    group.finish();
}

/// Benchmark key lookups and full scans.
fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("queries");
    let ctx = Context::background();

    let dir = TempDir::new().unwrap();
    let (store, _) = populated_store(&dir, 1000, 128);
    let tagged: Vec<Document> = (0..50)
        .map(|i| Document::new(format!("tagged-{i}"), Vec::new()).with_shared_key("tag"))
        .collect();
    store.save_many(&ctx, "bench", tagged).unwrap();

    group.bench_function("fetch_by_key", |b| {
        b.iter(|| black_box(store.fetch_by_key(&ctx, "bench", "tag").unwrap()));
    });
    group.bench_function("fetch_all", |b| {
        b.iter(|| black_box(store.fetch_all(&ctx, "bench").unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_save, bench_save_many, bench_queries);
criterion_main!(benches);
