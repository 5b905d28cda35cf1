//! Real-world scenario benchmarks.
//!
//! These model the demo binary's usage: whole voices drawing a frame through
//! an effect chain, and a polyphonic synth mixing several of them.

mod poly;
mod voices;

pub use poly::bench_poly;
pub use voices::bench_voices;
