//! Benchmarks for the per-voice effect chain.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_scope::{
    dsp::LfoWaveform,
    effect::{built_in, EffectChain, VoiceEffects},
    Point,
};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;

pub fn bench_effects(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/effects");

    let full_chain = || -> saavy_scope::Result<EffectChain> {
        EffectChain::new()
            .with(built_in::scale()?.with_precedence(0))?
            .with(built_in::rotate()?.with_precedence(1))?
            .with(built_in::delay()?.with_precedence(2))?
            .with(built_in::smooth()?.with_precedence(3))?
            .with(built_in::bit_crush()?.with_precedence(4))
    };

    for &size in BLOCK_SIZES {
        // Everything static
        let chain = full_chain().expect("chain");
        let mut voice = VoiceEffects::clone_from(&chain);
        group.bench_with_input(BenchmarkId::new("five_static", size), &size, |b, &size| {
            b.iter(|| {
                voice.refresh();
                let mut acc = Point::ORIGIN;
                for i in 0..size {
                    acc += voice.process(i, black_box(Point::new(0.5, -0.25)), SAMPLE_RATE, 220.0);
                }
                black_box(acc)
            })
        });

        // Every parameter on an LFO
        let chain = full_chain().expect("chain");
        for handle in chain.handles() {
            for param in handle.parameters() {
                param.set_lfo(LfoWaveform::Sine);
                param.set_lfo_rate(0.5);
            }
        }
        let mut voice = VoiceEffects::clone_from(&chain);
        group.bench_with_input(BenchmarkId::new("five_lfo", size), &size, |b, &size| {
            b.iter(|| {
                voice.refresh();
                let mut acc = Point::ORIGIN;
                for i in 0..size {
                    acc += voice.process(i, black_box(Point::new(0.5, -0.25)), SAMPLE_RATE, 220.0);
                }
                black_box(acc)
            })
        });
    }

    group.finish();
}
