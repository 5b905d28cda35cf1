//! Benchmarks for the DAHDSR envelope generator.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_scope::dsp::envelope::{DahdsrParams, Envelope};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Attack phase (ramping up), curved
        let mut env = Envelope::new(DahdsrParams {
            attack_curve: 4.0,
            ..DahdsrParams::adsr(10.0, 0.1, 0.7, 0.3)
        });
        env.note_on();
        group.bench_with_input(BenchmarkId::new("attack", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer), black_box(SAMPLE_RATE));
            })
        });

        // Sustain phase (holding steady)
        let mut env = Envelope::new(DahdsrParams::adsr(0.001, 0.001, 0.7, 0.3));
        env.note_on();
        // Advance past attack/decay
        for _ in 0..200 {
            env.next_sample(SAMPLE_RATE);
        }
        group.bench_with_input(BenchmarkId::new("sustain", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer), black_box(SAMPLE_RATE));
            })
        });

        // Release phase (ramping down), long enough to outlast the benchmark
        let mut env = Envelope::new(DahdsrParams {
            release_curve: -3.0,
            ..DahdsrParams::adsr(0.001, 0.001, 0.7, 1000.0)
        });
        env.note_on();
        for _ in 0..200 {
            env.next_sample(SAMPLE_RATE);
        }
        env.note_off(true);
        group.bench_with_input(BenchmarkId::new("release", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer), black_box(SAMPLE_RATE));
            })
        });
    }

    group.finish();
}
