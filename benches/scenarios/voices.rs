//! Benchmarks for complete voices.

use std::{hint::black_box, sync::Arc};

use criterion::{BenchmarkId, Criterion};
use saavy_scope::{
    dsp::DahdsrParams,
    effect::{built_in, EffectChain, VoiceEffects},
    io::ScopeBuffer,
    synth::{RenderCtx, Voice},
    Frame,
};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");
    let frame = Arc::new(Frame::polygon(7, 0.8, 0.0));
    let envelope = DahdsrParams::adsr(0.01, 0.1, 0.8, 0.3);

    for &size in BLOCK_SIZES {
        let mut out = ScopeBuffer::new(2, size).expect("buffer");
        let ctx = RenderCtx::new(SAMPLE_RATE, &frame);

        // === BARE VOICE ===
        // traversal → envelope, no effects. Baseline cost of a note.
        let mut bare = Voice::new(frame.clone(), VoiceEffects::empty(), envelope);
        bare.start_note(110.0, 1.0, frame.clone());

        group.bench_with_input(BenchmarkId::new("bare", size), &size, |b, &size| {
            b.iter(|| {
                out.clear();
                bare.render_block(black_box(&mut out), 0, size, &ctx);
            })
        });

        // === DEMO VOICE ===
        // scale → rotate (spinning) → delay, as in the scope binary
        let chain = EffectChain::new()
            .with(built_in::scale().expect("scale"))
            .and_then(|c| c.with(built_in::rotate().expect("rotate").with_precedence(1)))
            .and_then(|c| c.with(built_in::delay().expect("delay").with_precedence(2)))
            .expect("chain");
        if let Some(speed) = chain
            .get("rotate")
            .and_then(|r| r.parameter("rotateSpeed").cloned())
        {
            speed.set_value(0.25);
        }
        let mut demo = Voice::new(frame.clone(), VoiceEffects::clone_from(&chain), envelope);
        demo.start_note(110.0, 1.0, frame.clone());

        group.bench_with_input(BenchmarkId::new("demo_chain", size), &size, |b, &size| {
            b.iter(|| {
                out.clear();
                demo.refresh_effects();
                demo.render_block(black_box(&mut out), 0, size, &ctx);
            })
        });
    }

    group.finish();
}
