//! ScopeApp - wires sources, synth, audio device and UI together

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::RingBuffer;
use std::time::Duration;
use tracing::{error, info};

use saavy_scope::{
    dsp::DahdsrParams,
    effect::{built_in, EffectChain},
    frame::{frame_channel, FrameProducer},
    io::ScopeBuffer,
    synth::{PolySynth, SynthMessage},
    SynthConfig, MAX_BLOCK_SIZE,
};

use super::{
    sources::make_source,
    ui::{ScopePoint, UiApp},
};

/// Points queued for the UI. About a tenth of a second at 48 kHz.
const UI_POINT_QUEUE: usize = 4096;
/// Every n-th sample is sent to the UI.
const UI_DECIMATION: usize = 4;

/// Application builder
pub struct ScopeApp {
    voices: usize,
    envelope: DahdsrParams,
}

impl ScopeApp {
    pub fn new() -> Self {
        Self {
            voices: 8,
            envelope: DahdsrParams::adsr(0.01, 0.2, 0.7, 0.4),
        }
    }

    /// Set the polyphony
    pub fn voices(mut self, voices: usize) -> Self {
        self.voices = voices;
        self
    }

    /// Run the application (takes over the terminal, plays audio)
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0 as f32;
        let device_channels = config.channels() as usize;
        if device_channels < 2 {
            return Err(eyre!("output device has {} channel(s); need at least 2", device_channels));
        }
        info!("Audio device: {} channels at {} Hz", device_channels, sample_rate);

        let synth_config = SynthConfig::default()
            .with_sample_rate(sample_rate)
            .with_voices(self.voices)
            .with_channels(if device_channels >= 3 { 3 } else { 2 })
            .with_envelope(self.envelope);

        let effects = build_effects().wrap_err("failed to build effect chain")?;

        // Frames: producer thread → synth
        let (publisher, receiver) = frame_channel(synth_config.frame_queue_capacity)?;
        let producer = FrameProducer::spawn(make_source(0), publisher)?;

        // Notes: UI → synth
        let (note_tx, note_rx) = RingBuffer::<SynthMessage>::new(256);
        // Drawn points: synth → UI
        let (mut point_tx, point_rx) = RingBuffer::<ScopePoint>::new(UI_POINT_QUEUE);

        let mut synth = PolySynth::new(&synth_config, &effects, receiver, note_rx)?;
        let mut block = ScopeBuffer::new(synth_config.channels, MAX_BLOCK_SIZE)?;
        let mut decimation = 0usize;

        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| {
                let total_frames = data.len() / device_channels;
                let mut frames_written = 0;

                while frames_written < total_frames {
                    let frames_to_render = block.set_num_samples(total_frames - frames_written);
                    synth.render_block(&mut block);

                    let out_off = frames_written * device_channels;
                    let out_len = frames_to_render * device_channels;
                    block.write_interleaved(&mut data[out_off..out_off + out_len], device_channels);

                    // Scope feed; drop points when the UI falls behind
                    for i in 0..frames_to_render {
                        decimation += 1;
                        if decimation >= UI_DECIMATION {
                            decimation = 0;
                            let p = block.point(i);
                            let _ = point_tx.push((p.x, p.y));
                        }
                    }

                    frames_written += frames_to_render;
                }
            },
            |err| error!("Audio error: {}", err),
            None,
        )?;

        stream.play()?;
        info!("Audio stream started at {} Hz", sample_rate);

        let mut terminal = ratatui::init();
        let result = UiApp::new(note_tx, point_rx, effects, producer).run(&mut terminal);
        ratatui::restore();

        drop(stream);
        result
    }
}

impl Default for ScopeApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Effects the UI can toggle, in processing order.
fn build_effects() -> saavy_scope::Result<EffectChain> {
    let chain = EffectChain::new()
        .with(built_in::scale()?.with_precedence(0))?
        .with(built_in::rotate()?.with_precedence(10))?
        .with(built_in::delay()?.with_precedence(20).with_enabled(false))?
        .with(built_in::smooth()?.with_precedence(30).with_enabled(false))?
        .with(built_in::bit_crush()?.with_precedence(40).with_enabled(false))?;
    Ok(chain)
}

/// How long the UI waits for the producer thread on exit.
pub const PRODUCER_STOP_TIMEOUT: Duration = Duration::from_millis(250);
