//! Benchmarks for low-level DSP primitives.

mod effects;
mod envelope;
mod traversal;

pub use effects::bench_effects;
pub use envelope::bench_envelope;
pub use traversal::bench_traversal;
