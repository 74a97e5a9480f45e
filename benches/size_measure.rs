//! Size measurement benchmark suite
//!
//! Raw and per-file gzip totals over synthetic build outputs:
//! - Flat directories of many small chunks
//! - Nested asset trees
//! - Compressible (minified-JS-like) vs incompressible content

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use vapor_size_bench::measure::{compressed_size, measure_dir, raw_size};

const JS_LINE: &str = "export function h(t,p,c){return{type:t,props:p,children:c}}\n";

/// Flat output directory with `file_count` chunks of roughly `file_size` bytes.
fn create_chunks(dir: &Path, file_count: usize, file_size: usize, random: bool, seed: u64) -> u64 {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut total = 0u64;
    for i in 0..file_count {
        let bytes = if random {
            let mut buf = vec![0u8; file_size];
            rng.fill_bytes(&mut buf);
            buf
        } else {
            JS_LINE.repeat(file_size / JS_LINE.len() + 1).into_bytes()
        };
        total += bytes.len() as u64;
        fs::write(dir.join(format!("chunk_{i:04}.js")), bytes).unwrap();
    }
    total
}

/// Nested asset tree: `depth` levels, three subdirectories per level.
fn create_nested(dir: &Path, depth: usize, files_per_dir: usize, file_size: usize) -> u64 {
    fn level(path: &Path, current: usize, max: usize, files: usize, size: usize) -> u64 {
        if current >= max {
            return 0;
        }
        let mut total = create_chunks(path, files, size, false, current as u64);
        for i in 0..3 {
            let sub = path.join(format!("dir_{i:02}"));
            fs::create_dir_all(&sub).unwrap();
            total += level(&sub, current + 1, max, files, size);
        }
        total
    }
    level(dir, 0, depth, files_per_dir, file_size)
}

fn bench_flat(c: &mut Criterion) {
    let mut group = c.benchmark_group("measure_flat");
    group.sample_size(20);

    for &(count, random) in &[(10usize, false), (100, false), (100, true)] {
        let dir = TempDir::new().unwrap();
        let bytes = create_chunks(dir.path(), count, 4 * 1024, random, 42);
        let label = format!("{count}x4k_{}", if random { "random" } else { "js" });
        group.throughput(Throughput::Bytes(bytes));

        group.bench_with_input(BenchmarkId::new("raw_size", &label), dir.path(), |b, p| {
            b.iter(|| black_box(raw_size(p).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("compressed_size", &label), dir.path(), |b, p| {
            b.iter(|| black_box(compressed_size(p).unwrap()))
        });
    }

    group.finish();
}

fn bench_nested(c: &mut Criterion) {
    let mut group = c.benchmark_group("measure_nested");
    group.sample_size(10);

    for &depth in &[2usize, 4] {
        let dir = TempDir::new().unwrap();
        let bytes = create_nested(dir.path(), depth, 5, 2 * 1024);
        group.throughput(Throughput::Bytes(bytes));
        group.bench_with_input(BenchmarkId::new("measure_dir", depth), dir.path(), |b, p| {
            b.iter(|| black_box(measure_dir(p).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_flat, bench_nested);
criterion_main!(benches);
