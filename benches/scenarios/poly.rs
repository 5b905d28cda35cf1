//! Benchmarks for the polyphonic synth.

use std::{hint::black_box, sync::Arc};

use criterion::{BenchmarkId, Criterion};
use rtrb::RingBuffer;
use saavy_scope::{
    effect::{built_in, EffectChain},
    frame::frame_channel,
    io::ScopeBuffer,
    synth::{PolySynth, SynthMessage},
    Frame, SynthConfig,
};

use crate::BLOCK_SIZES;

pub fn bench_poly(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/poly");
    let config = SynthConfig::default().with_voices(8);

    for &size in BLOCK_SIZES {
        let chain = EffectChain::new()
            .with(built_in::rotate().expect("rotate"))
            .and_then(|c| c.with(built_in::smooth().expect("smooth").with_precedence(1)))
            .expect("chain");
        let (mut publisher, receiver) = frame_channel(config.frame_queue_capacity).expect("channel");
        let (mut tx, rx) = RingBuffer::new(64);
        let mut synth = PolySynth::new(&config, &chain, receiver, rx).expect("synth");
        let mut out = ScopeBuffer::new(config.channels, size).expect("buffer");

        let _ = publisher.try_publish(Arc::new(Frame::polygon(5, 0.8, 0.0)));
        // A chord of eight notes
        for note in [48, 52, 55, 60, 64, 67, 72, 76] {
            let _ = tx.push(SynthMessage::NoteOn { note, velocity: 0.7 });
        }
        synth.render_block(&mut out);

        group.bench_with_input(BenchmarkId::new("eight_voices", size), &size, |b, _| {
            b.iter(|| {
                // A fresh frame every block, the worst case for frame handoff
                let _ = publisher.try_publish(Arc::new(Frame::polygon(5, 0.8, 0.0)));
                synth.render_block(black_box(&mut out));
            })
        });
    }

    group.finish();
}
