//! Scoring throughput for the dense and tiled encodings.
//!
//! # Usage:
//! ```bash
//! cargo bench --bench score
//! cargo bench --bench score -- score_dense
//! ```

use std::hint::black_box;
use std::io::Cursor;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mmprob::writer::{write_dense, write_tiled};
use mmprob::{Reader, TiledMatrix};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Square problem sizes below the large threshold (dense encoding).
const DENSE_SIZES: &[usize] = &[128, 512, 1024];

/// Square problem sizes at or above the large threshold (tiled encoding).
const TILED_SIZES: &[usize] = &[2048, 4096];

/// Periodic matrix with a 4 × 4 tile. The fixed seed keeps runs comparable.
fn periodic_matrix(size: usize, seed: u64) -> Array2<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let tile: Vec<f32> = (0..16).map(|_| rng.random_range(-1.0..1.0)).collect();
    Array2::from_shape_fn((size, size), |(r, c)| tile[(r % 4) * 4 + c % 4])
}

fn bench_score_dense(c: &mut Criterion) {
    let mut group = c.benchmark_group("score_dense");

    for &size in DENSE_SIZES {
        let operand = periodic_matrix(size, 42);
        let answer = operand.dot(&operand);
        let mut bytes = Vec::new();
        write_dense(&mut bytes, operand.view(), operand.view(), answer.view()).unwrap();

        let mut reader = Reader::<f32, _>::from_stream(Cursor::new(bytes)).unwrap();
        let calced: Vec<f32> = answer.iter().copied().collect();

        group.throughput(Throughput::Elements((size * size) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                reader
                    .score(black_box(&calced), size, |_, _, _, _| {})
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn bench_score_tiled(c: &mut Criterion) {
    let mut group = c.benchmark_group("score_tiled");
    group.sample_size(10);

    for &size in TILED_SIZES {
        let operand = periodic_matrix(size, 42);
        let tiles = TiledMatrix::compress(operand.view(), 4, 4).unwrap();
        // Any periodic answer exercises the walk; the operand itself is one.
        let mut bytes = Vec::new();
        write_tiled(&mut bytes, &tiles, &tiles, &tiles).unwrap();

        let mut reader = Reader::<f32, _>::from_stream(Cursor::new(bytes)).unwrap();
        let calced: Vec<f32> = operand.iter().copied().collect();

        group.throughput(Throughput::Elements((size * size) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                reader
                    .score(black_box(&calced), size, |_, _, _, _| {})
                    .unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_score_dense, bench_score_tiled);
criterion_main!(benches);
