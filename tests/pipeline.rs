use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use rtrb::RingBuffer;
use saavy_scope::{
    effect::{built_in, EffectChain},
    frame::{frame_channel, FrameProducer, ProceduralSource, StaticSource},
    io::{MidiEvent, ScopeBuffer},
    synth::{PolySynth, SynthMessage},
    Frame, SynthConfig,
};

const BLOCK: usize = 256;

/// Render blocks until `done` says so or five seconds pass.
fn render_until(
    synth: &mut PolySynth,
    out: &mut ScopeBuffer,
    mut done: impl FnMut(&PolySynth, &ScopeBuffer) -> bool,
) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        synth.render_block(out);
        if done(synth, out) {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    false
}

#[test]
fn producer_to_output_draws_the_frame() {
    let config = SynthConfig::default().with_voices(4);
    let (publisher, receiver) = frame_channel(config.frame_queue_capacity).unwrap();
    let mut producer =
        FrameProducer::spawn(Box::new(StaticSource::new(Frame::unit_square())), publisher).unwrap();

    let (mut tx, rx) = RingBuffer::new(16);
    let mut synth = PolySynth::new(&config, &EffectChain::new(), receiver, rx).unwrap();
    let mut out = ScopeBuffer::new(2, BLOCK).unwrap();

    assert!(render_until(&mut synth, &mut out, |s, _| !s.current_frame().is_degenerate()));

    tx.push(SynthMessage::NoteOn { note: 57, velocity: 1.0 }).unwrap();
    // Let the attack finish
    for _ in 0..8 {
        synth.render_block(&mut out);
    }

    let x = out.channel(0);
    let y = out.channel(1);
    assert!(x.iter().chain(y).all(|s| s.is_finite() && s.abs() <= 0.5 + 1e-4));
    assert!(x.iter().any(|&s| s > 0.3));
    assert!(x.iter().any(|&s| s < -0.3));

    assert!(producer.stop(Duration::from_secs(2)));
}

#[test]
fn effects_apply_to_every_voice() {
    let config = SynthConfig::default().with_voices(2);
    let (mut publisher, receiver) = frame_channel(config.frame_queue_capacity).unwrap();
    publisher.try_publish(Arc::new(Frame::unit_square())).unwrap();

    let chain = EffectChain::new().with(built_in::scale().unwrap()).unwrap();
    let scale = chain.get("scale").unwrap();
    let (mut tx, rx) = RingBuffer::new(16);
    let mut synth = PolySynth::new(&config, &chain, receiver, rx).unwrap();
    let mut out = ScopeBuffer::new(2, BLOCK).unwrap();

    tx.push(SynthMessage::NoteOn { note: 60, velocity: 1.0 }).unwrap();
    tx.push(SynthMessage::NoteOn { note: 67, velocity: 1.0 }).unwrap();
    for _ in 0..8 {
        synth.render_block(&mut out);
    }
    let peak = |buffer: &ScopeBuffer| buffer.channel(0).iter().fold(0.0f32, |m, s| m.max(s.abs()));
    let before = peak(&out);
    assert!(before > 0.0);

    // One write, heard by both voices from the next block
    scale.parameter("scaleX").unwrap().set_value(0.0);
    synth.render_block(&mut out);
    assert_eq!(peak(&out), 0.0);
}

#[test]
fn source_switch_reaches_the_synth() {
    let config = SynthConfig::default();
    let (publisher, receiver) = frame_channel(config.frame_queue_capacity).unwrap();
    let mut producer = FrameProducer::spawn(
        Box::new(ProceduralSource::new("triangle", |n| {
            Frame::polygon(3, 0.5, n as f32 * 0.01)
        })),
        publisher,
    )
    .unwrap();

    let (_tx, rx) = RingBuffer::new(16);
    let mut synth = PolySynth::new(&config, &EffectChain::new(), receiver, rx).unwrap();
    let mut out = ScopeBuffer::new(2, BLOCK).unwrap();

    assert!(render_until(&mut synth, &mut out, |s, _| s.current_frame().shape_count() == 3));

    producer.set_source(Box::new(StaticSource::new(Frame::polygon(9, 0.5, 0.0))));
    assert!(render_until(&mut synth, &mut out, |s, _| s.current_frame().shape_count() == 9));

    assert!(producer.stop(Duration::from_secs(2)));
}

#[test]
fn dropping_the_synth_stops_the_producer() {
    let config = SynthConfig::default();
    let (publisher, receiver) = frame_channel(config.frame_queue_capacity).unwrap();
    let producer =
        FrameProducer::spawn(Box::new(StaticSource::new(Frame::unit_square())), publisher).unwrap();

    let (_tx, rx) = RingBuffer::new(16);
    let synth = PolySynth::new(&config, &EffectChain::new(), receiver, rx).unwrap();
    drop(synth);

    let deadline = Instant::now() + Duration::from_secs(5);
    while producer.is_running() {
        assert!(Instant::now() < deadline, "producer outlived its consumer");
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn midi_bytes_play_bend_and_silence_notes() {
    let config = SynthConfig {
        tail_off: false,
        ..SynthConfig::default().with_voices(4)
    };
    let (mut publisher, receiver) = frame_channel(config.frame_queue_capacity).unwrap();
    publisher.try_publish(Arc::new(Frame::unit_square())).unwrap();

    let (mut tx, rx) = RingBuffer::new(16);
    let mut synth = PolySynth::new(&config, &EffectChain::new(), receiver, rx).unwrap();
    let mut out = ScopeBuffer::new(2, BLOCK).unwrap();

    let mut play = |bytes: &[u8]| {
        let msg = MidiEvent::from_bytes(bytes).and_then(|event| event.to_synth(0));
        tx.push(msg.unwrap()).unwrap();
    };

    play(&[0x90, 60, 127]);
    play(&[0x90, 64, 127]);
    // Full bend up: two semitones
    play(&[0xE0, 0x7F, 0x7F]);
    synth.render_block(&mut out);
    assert_eq!(synth.active_voices(), 2);
    assert!(out.channel(0).iter().any(|&s| s != 0.0));

    // Other channels are ignored
    assert!(MidiEvent::from_bytes(&[0x91, 67, 127]).and_then(|e| e.to_synth(0)).is_none());

    play(&[0x80, 60, 0]);
    synth.render_block(&mut out);
    assert_eq!(synth.active_voices(), 1);

    play(&[0xB0, 123, 0]);
    synth.render_block(&mut out);
    assert_eq!(synth.active_voices(), 0);
}
