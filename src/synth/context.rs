use std::sync::Arc;

use crate::shape::Frame;

/// A4 = 440 Hz = MIDI note 69
#[inline]
pub fn midi_note_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

/// Frequency ratio for a pitch offset in cents.
#[inline]
pub fn cents_to_ratio(cents: f32) -> f32 {
    2.0_f32.powf(cents / 1200.0)
}

/// Everything a voice needs from outside to render one block.
///
/// Built once per block by the synth and passed down explicitly; voices hold
/// no references to global state.
#[derive(Debug, Clone, Copy)]
pub struct RenderCtx<'a> {
    pub sample_rate: f32,
    /// Multiplier applied to every voice's note frequency (pitch bend).
    pub pitch_ratio: f32,
    /// Newest frame this block. Voices switch to it at their next lap.
    pub frame: &'a Arc<Frame>,
}

impl<'a> RenderCtx<'a> {
    pub fn new(sample_rate: f32, frame: &'a Arc<Frame>) -> Self {
        Self {
            sample_rate,
            pitch_ratio: 1.0,
            frame,
        }
    }

    pub fn with_pitch_ratio(mut self, pitch_ratio: f32) -> Self {
        self.pitch_ratio = pitch_ratio;
        self
    }
}
