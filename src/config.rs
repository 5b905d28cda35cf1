#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::envelope::DahdsrParams,
    error::{Result, ScopeError},
};

/// Everything needed to build a [`PolySynth`](crate::synth::poly::PolySynth).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthConfig {
    pub sample_rate: f32,
    pub max_voices: usize,
    /// 2 for XY, 3 for XY plus brightness.
    pub channels: usize,
    /// Frames that may be queued between producer and audio thread.
    pub frame_queue_capacity: usize,
    pub envelope: DahdsrParams,
    /// Release through the envelope on note-off instead of cutting.
    pub tail_off: bool,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            max_voices: 16,
            channels: 2,
            frame_queue_capacity: 4,
            envelope: DahdsrParams::default(),
            tail_off: true,
        }
    }
}

impl SynthConfig {
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_voices(mut self, max_voices: usize) -> Self {
        self.max_voices = max_voices;
        self
    }

    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_envelope(mut self, envelope: DahdsrParams) -> Self {
        self.envelope = envelope;
        self
    }

    /// Check the config can build a working synth.
    pub fn validate(&self) -> Result<()> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(ScopeError::InvalidSampleRate(self.sample_rate));
        }
        if self.max_voices == 0 {
            return Err(ScopeError::NoVoices);
        }
        if !(2..=3).contains(&self.channels) {
            return Err(ScopeError::UnsupportedChannels(self.channels));
        }
        if self.frame_queue_capacity == 0 {
            return Err(ScopeError::ZeroCapacity);
        }
        Ok(())
    }
}
