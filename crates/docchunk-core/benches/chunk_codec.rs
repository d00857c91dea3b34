//! Benchmark suite for the documentation chunk codec
//!
//! Measures the full write path for one unit and decode of its chunk at
//! several module sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use docchunk_core::chunk::DocChunk;
use docchunk_core::doc::EntityRef;
use docchunk_core::pipeline::{CompilationUnit, CompileOptions};
use docchunk_core::testutil::large_unit;

const SIZES: [usize; 3] = [100, 1_000, 10_000];

fn encoded_chunk(size: usize) -> Vec<u8> {
    let mut unit = CompilationUnit::new("bench", CompileOptions::default());
    unit.observe_all(large_unit(size))
        .expect("Failed to collect events");
    unit.finish()
        .expect("Failed to finish unit")
        .chunk
        .expect("Chunk generation is enabled")
}

/// Benchmark collect + merge + normalize + encode
fn bench_compile_unit(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile_unit");

    for size in SIZES {
        let events = large_unit(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &events, |b, events| {
            b.iter(|| {
                let mut unit = CompilationUnit::new("bench", CompileOptions::default());
                unit.observe_all(events.iter().cloned())
                    .expect("Failed to collect events");
                black_box(unit.finish().expect("Failed to finish unit"))
            });
        });
    }

    group.finish();
}

/// Benchmark decoding a chunk
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for size in SIZES {
        let bytes = encoded_chunk(size);
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &bytes, |b, bytes| {
            b.iter(|| black_box(DocChunk::decode(bytes).expect("Failed to decode")));
        });
    }

    group.finish();
}

/// Benchmark point lookups on a decoded chunk
fn bench_lookup(c: &mut Criterion) {
    let chunk = DocChunk::decode(&encoded_chunk(10_000)).expect("Failed to decode");
    let target: EntityRef = "fun_05000/0".parse().expect("Failed to parse entity");

    c.bench_function("lookup_10000", |b| {
        b.iter(|| black_box(chunk.lookup(black_box(&target))));
    });
}

criterion_group!(benches, bench_compile_unit, bench_decode, bench_lookup);
criterion_main!(benches);
