//! HNSW Index Performance Benchmarks
//!
//! Run with: `cargo bench --bench hnsw_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use svarog_core::{BulkImporter, DistanceMetric, HnswIndex, HnswParams, MemoryHnsw};

/// Generates a random-ish vector for benchmarking.
#[allow(clippy::cast_precision_loss)]
fn generate_vector(dim: usize, seed: u64) -> Vec<f32> {
    (0..dim)
        .map(|i| ((seed as f32).mul_add(0.1, i as f32 * 0.01).sin() + 1.0) / 2.0)
        .collect()
}

/// Benchmark graph-backed insertion throughput.
fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("hnsw_insert");

    for count in &[500_u64, 2_000] {
        let dim = 64;
        group.throughput(Throughput::Elements(*count));

        group.bench_with_input(
            BenchmarkId::new("vectors", format!("{count}x{dim}d")),
            count,
            |b, &count| {
                b.iter(|| {
                    let index = HnswIndex::builder(dim, DistanceMetric::Euclidean)
                        .m(8)
                        .ef_construction(48)
                        .build()
                        .unwrap();
                    for i in 0..count {
                        let vector = generate_vector(dim, i);
                        index.insert(&format!("v{i}"), vector).unwrap();
                    }
                    black_box(index.len())
                });
            },
        );
    }

    group.finish();
}

/// Benchmark search latency over a pre-built graph.
fn bench_search_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("hnsw_search_latency");

    let dim = 64;
    let index = HnswIndex::builder(dim, DistanceMetric::Euclidean)
        .m(8)
        .ef_construction(48)
        .build()
        .unwrap();
    for i in 0..5_000_u64 {
        index.insert(&format!("v{i}"), generate_vector(dim, i)).unwrap();
    }
    index.set_ef(64);

    let query = generate_vector(dim, 99_999);
    for k in &[10_usize, 50] {
        group.bench_with_input(BenchmarkId::new("top_k", k), k, |b, &k| {
            b.iter(|| {
                let results = index.find_nearest(&query, k).unwrap();
                black_box(results.len())
            });
        });
    }

    group.finish();
}

/// Benchmark bulk import of an in-memory origin.
fn bench_bulk_import(c: &mut Criterion) {
    let mut group = c.benchmark_group("hnsw_bulk_import");
    group.sample_size(10);

    let dim = 64;
    let params = HnswParams::new(dim, 8, 24, 48, 100_000).unwrap();
    let origin = MemoryHnsw::new(DistanceMetric::Euclidean, params);
    for i in 0..2_000_u64 {
        origin
            .insert(&format!("v{i}"), generate_vector(dim, i))
            .unwrap();
    }

    group.throughput(Throughput::Elements(origin.len() as u64));
    group.bench_function("import_2000", |b| {
        b.iter(|| {
            let index = HnswIndex::builder(dim, DistanceMetric::Euclidean)
                .m(8)
                .ef_construction(48)
                .build()
                .unwrap();
            let report = BulkImporter::new(&index).import(&origin).unwrap();
            black_box(report.edges)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_insert, bench_search_latency, bench_bulk_import);
criterion_main!(benches);
