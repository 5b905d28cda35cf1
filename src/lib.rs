pub mod config;
pub mod dsp; // Traversal, envelope, LFO and delay primitives
pub mod effect; // Parameters, effect strategies and per-voice chains
pub mod error;
pub mod frame; // Frame sources and the producer → audio thread handoff
pub mod io;
pub mod shape; // Geometric primitives and frames
pub mod synth; // Voice management and polyphony

pub use config::SynthConfig;
pub use error::{Result, ScopeError};
pub use shape::{Frame, Point, Shape};

pub const MAX_BLOCK_SIZE: usize = 2048;

/// Smallest arc length a voice advances per sample.
///
/// Keeps traversal moving on degenerate frames and at zero frequency.
pub const MIN_LENGTH_INCREMENT: f32 = 0.000_001;

/// Longest delay any built-in effect can hold, in samples (2 s at 48 kHz).
pub const MAX_DELAY_SAMPLES: usize = 96_000;
