//! Low-level DSP primitives used by voices and effects.
//!
//! These components are allocation-free and realtime-safe once constructed,
//! making them safe to embed directly inside voice structs. They stay
//! focused on the signal math; voices and effect chains layer on
//! orchestration and parameter handling.

/// Ring buffer of past points for delay-type effects.
pub mod delay;
/// Delay/attack/hold/decay/sustain/release envelope generator.
pub mod envelope;
/// Parameter LFO waveforms and phase accumulation.
pub mod lfo;
/// Arc-length cursor that walks a frame at audio rate.
pub mod traversal;

pub use envelope::{DahdsrParams, EnvelopeStage};
pub use lfo::LfoWaveform;
pub use traversal::PathTraversal;
