use std::sync::Arc;

use rtrb::Consumer;
use tracing::info;

use crate::{
    config::SynthConfig,
    effect::{EffectChain, VoiceEffects},
    error::Result,
    frame::FrameReceiver,
    io::ScopeBuffer,
    shape::Frame,
    synth::{
        context::{cents_to_ratio, midi_note_to_freq, RenderCtx},
        message::SynthMessage,
        voice::{Voice, VoiceState},
    },
    MAX_BLOCK_SIZE,
};

/// Polyphonic shape synth: a voice pool fed by one frame stream.
///
/// Lives on the audio thread. Control arrives as [`SynthMessage`]s, frames
/// through a [`FrameReceiver`]; `render_block` neither blocks nor allocates.
pub struct PolySynth {
    voices: Vec<Voice>,
    rx: Consumer<SynthMessage>,
    frames: FrameReceiver,
    current_frame: Arc<Frame>,
    sample_rate: f32,
    pitch_ratio: f32,
    tail_off: bool,
    frame_counter: u64,
}

impl PolySynth {
    /// Build the voice pool. Each voice gets its own clone of `effects`.
    pub fn new(
        config: &SynthConfig,
        effects: &EffectChain,
        frames: FrameReceiver,
        rx: Consumer<SynthMessage>,
    ) -> Result<Self> {
        config.validate()?;

        let current_frame = Arc::new(Frame::empty());
        let voices = (0..config.max_voices)
            .map(|_| {
                Voice::new(
                    current_frame.clone(),
                    VoiceEffects::clone_from(effects),
                    config.envelope,
                )
            })
            .collect();

        info!(
            "PolySynth: {} voices at {} Hz, {} effects",
            config.max_voices,
            config.sample_rate,
            effects.len()
        );

        Ok(Self {
            voices,
            rx,
            frames,
            current_frame,
            sample_rate: config.sample_rate,
            pitch_ratio: 1.0,
            tail_off: config.tail_off,
            frame_counter: 0,
        })
    }

    /// Render one block into `out`, overwriting it.
    pub fn render_block(&mut self, out: &mut ScopeBuffer) {
        self.handle_messages();

        // One frame per block: every voice sees the same one.
        if let Some(frame) = self.frames.take_latest() {
            let previous = std::mem::replace(&mut self.current_frame, frame);
            self.frames.retire(previous);
        }

        for voice in &mut self.voices {
            voice.refresh_effects();
        }

        out.clear();
        let ctx = RenderCtx::new(self.sample_rate, &self.current_frame).with_pitch_ratio(self.pitch_ratio);
        let total = out.num_samples();

        let mut start = 0;
        while start < total {
            let len = (total - start).min(MAX_BLOCK_SIZE);
            for voice in &mut self.voices {
                if let Some(retired) = voice.render_block(out, start, len, &ctx) {
                    self.frames.retire(retired);
                }
            }
            start += len;
        }

        self.frame_counter += total as u64;
    }

    fn handle_messages(&mut self) {
        while let Ok(msg) = self.rx.pop() {
            match msg {
                SynthMessage::NoteOn { note, velocity } => self.note_on(note, velocity),
                SynthMessage::NoteOff { note } => {
                    let tail_off = self.tail_off;
                    if let Some(voice) = self.find_voice(note) {
                        voice.stop_note(tail_off);
                    }
                }
                SynthMessage::AllNotesOff => {
                    for voice in &mut self.voices {
                        if voice.is_active() {
                            voice.stop_note(self.tail_off);
                        }
                    }
                }
                SynthMessage::PitchBend { cents } => {
                    if cents.is_finite() {
                        self.pitch_ratio = cents_to_ratio(cents);
                    }
                }
                SynthMessage::SetEnvelope(params) => {
                    for voice in &mut self.voices {
                        voice.set_envelope(params);
                    }
                }
                SynthMessage::SetTailOff(tail_off) => self.tail_off = tail_off,
            }
        }
    }

    fn note_on(&mut self, note: u8, velocity: f32) {
        let age = self.frame_counter;
        let frame = self.current_frame.clone();

        // Retrigger a voice already on this note, otherwise allocate.
        let index = match self.voices.iter().position(|v| v.is_active() && v.note() == note) {
            Some(index) => Some(index),
            None => self.allocate_voice(),
        };
        let Some(index) = index else {
            return;
        };

        let voice = &mut self.voices[index];
        let previous = voice.start_note(midi_note_to_freq(note), velocity, frame);
        voice.assign(note, age);
        self.frames.retire(previous);
    }

    fn allocate_voice(&self) -> Option<usize> {
        // First pass: find free voice index
        if let Some(idx) = self.voices.iter().position(|v| v.is_free()) {
            return Some(idx);
        }

        // Second pass: steal oldest releasing voice
        self.voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.state() == VoiceState::Releasing)
            .min_by_key(|(_, v)| v.age())
            .map(|(idx, _)| idx)
    }

    fn find_voice(&mut self, note: u8) -> Option<&mut Voice> {
        self.voices
            .iter_mut()
            .find(|v| v.note() == note && v.state() == VoiceState::Active)
    }

    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn current_frame(&self) -> &Arc<Frame> {
        &self.current_frame
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn tail_off(&self) -> bool {
        self.tail_off
    }
}
