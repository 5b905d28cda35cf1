//! Benchmarks for arc-length path traversal.

use std::{hint::black_box, sync::Arc};

use criterion::{BenchmarkId, Criterion};
use saavy_scope::{dsp::PathTraversal, Frame, Point, Shape};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;

pub fn bench_traversal(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/traversal");

    // A handful of lines
    let square = Arc::new(Frame::unit_square());

    // Curves: length is cached, but position_at still evaluates Bernstein terms
    let curves: Arc<Frame> = Arc::new(
        (0..32)
            .map(|i| {
                let a = i as f32 / 32.0;
                Shape::cubic(
                    Point::new(a, 0.0),
                    Point::new(a + 0.01, 0.5),
                    Point::new(a + 0.02, -0.5),
                    Point::new(a + 1.0 / 32.0, 0.0),
                )
            })
            .collect(),
    );

    // Many tiny shapes at a high note: exercises the shape-skip loop
    let dense = Arc::new(Frame::polygon(2000, 0.9, 0.0));

    for &size in BLOCK_SIZES {
        for (name, frame, frequency) in [
            ("square", &square, 220.0),
            ("beziers", &curves, 220.0),
            ("dense_high_note", &dense, 4_000.0),
        ] {
            let mut traversal = PathTraversal::new(frame.clone());
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, &size| {
                b.iter(|| {
                    let mut acc = Point::ORIGIN;
                    for _ in 0..size {
                        let (point, _) =
                            traversal.next_point(black_box(frequency), SAMPLE_RATE, frame);
                        acc += point;
                    }
                    black_box(acc)
                })
            });
        }
    }

    group.finish();
}
