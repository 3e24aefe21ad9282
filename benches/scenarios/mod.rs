//! Real-world scenario benchmarks.
//!
//! These benchmarks model actual usage: complete voices as built on a
//! note-on and the engine's per-buffer pull.

mod voices;

pub use voices::bench_voices;
