use std::sync::Arc;

use crate::{
    dsp::{
        envelope::{DahdsrParams, Envelope},
        traversal::PathTraversal,
    },
    effect::VoiceEffects,
    io::ScopeBuffer,
    shape::{Frame, Point},
    synth::context::RenderCtx,
    MAX_BLOCK_SIZE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Free,      // Available for allocation
    Active,    // Playing, envelope in delay/attack/hold/decay/sustain
    Releasing, // Key released, envelope in release phase
}

/// One note drawing the current frame.
///
/// Per sample: walk the path, run the voice's effects, apply envelope and
/// velocity. The block is built in the voice's own scratch buffer and then
/// added into the shared output.
pub struct Voice {
    note: u8,
    velocity: f32,
    frequency: f32,
    state: VoiceState,
    age: u64,

    traversal: PathTraversal,
    effects: VoiceEffects,
    envelope: Envelope,
    scratch: Vec<Point>,
}

impl Voice {
    pub fn new(frame: Arc<Frame>, effects: VoiceEffects, envelope: DahdsrParams) -> Self {
        Self {
            note: 0,
            velocity: 0.0,
            frequency: 0.0,
            state: VoiceState::Free,
            age: 0,
            traversal: PathTraversal::new(frame),
            effects,
            envelope: Envelope::new(envelope),
            scratch: vec![Point::ORIGIN; MAX_BLOCK_SIZE],
        }
    }

    /// Start drawing `frame` at `frequency` Hz.
    ///
    /// Traversal, effect state and LFO phases restart; the envelope retriggers
    /// from its current level. Returns the frame the voice was holding so the
    /// caller can retire it.
    pub fn start_note(&mut self, frequency: f32, velocity: f32, frame: Arc<Frame>) -> Arc<Frame> {
        self.frequency = if frequency.is_finite() {
            frequency.max(0.0)
        } else {
            0.0
        };
        self.velocity = if velocity.is_finite() {
            velocity.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.state = VoiceState::Active;

        self.effects.reset();
        self.effects.refresh();
        self.envelope.note_on();
        self.traversal.reset(frame)
    }

    /// Release the note. Without tail-off the voice goes silent at once.
    pub fn stop_note(&mut self, allow_tail_off: bool) {
        if self.state == VoiceState::Free {
            return;
        }

        self.envelope.note_off(allow_tail_off);
        if allow_tail_off && self.envelope.is_active() {
            self.state = VoiceState::Releasing;
        } else {
            self.free();
        }
    }

    /// Read shared effect state for the coming block.
    pub fn refresh_effects(&mut self) {
        if self.is_active() {
            self.effects.refresh();
        }
    }

    /// Add `num_samples` samples into `out` starting at `start_sample`.
    ///
    /// If the envelope finishes partway, the rest of this voice's block is
    /// silent and the voice is freed. Returns the frame the voice let go of
    /// when it switched to `ctx.frame`, if it did.
    pub fn render_block(
        &mut self,
        out: &mut ScopeBuffer,
        start_sample: usize,
        num_samples: usize,
        ctx: &RenderCtx,
    ) -> Option<Arc<Frame>> {
        if !self.is_active() {
            return None;
        }

        let num_samples = num_samples
            .min(self.scratch.len())
            .min(out.num_samples().saturating_sub(start_sample));
        let frequency = self.frequency * ctx.pitch_ratio;
        let mut retired = None;
        let mut rendered = num_samples;

        for i in 0..num_samples {
            let (point, old) = self.traversal.next_point(frequency, ctx.sample_rate, ctx.frame);
            if old.is_some() {
                retired = old;
            }

            let point = self.effects.process(
                start_sample + i,
                point,
                ctx.sample_rate,
                frequency,
            );
            let gain = self.envelope.next_sample(ctx.sample_rate) * self.velocity;
            self.scratch[i] = point * gain;

            if !self.envelope.is_active() {
                rendered = i + 1;
                break;
            }
        }

        out.accumulate(start_sample, &self.scratch[..rendered]);

        if !self.envelope.is_active() {
            self.free();
        }
        retired
    }

    pub fn is_free(&self) -> bool {
        self.state == VoiceState::Free
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, VoiceState::Active | VoiceState::Releasing)
    }

    pub fn free(&mut self) {
        self.state = VoiceState::Free;
        self.envelope.reset();
        self.note = 0;
        self.velocity = 0.0;
    }

    pub fn set_envelope(&mut self, params: DahdsrParams) {
        self.envelope.set_params(params);
    }

    pub fn envelope_level(&self) -> f32 {
        self.envelope.value()
    }

    pub(crate) fn assign(&mut self, note: u8, age: u64) {
        self.note = note;
        self.age = age;
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn traversal(&self) -> &PathTraversal {
        &self.traversal
    }
}
