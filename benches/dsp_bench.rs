//! Benchmarks for DSP primitives and a full voice.
//!
//! Run with: cargo bench
//!
//! These benchmarks measure the cost of the per-sample signal path to make
//! sure a buffer renders well within its real-time deadline.
//!
//! Reference timing at the default 22 050 Hz sample rate:
//!   - 64 samples  = 2.90ms deadline
//!   - 128 samples = 5.80ms deadline
//!   - 256 samples = 11.61ms deadline
//!   - 512 samples = 23.22ms deadline
//!
//! Benchmark groups:
//!   - dsp/*        Primitives (oscillator, envelope, post filter, mixing)
//!   - scenarios/*  Complete voices and the engine's buffer pull

use criterion::{criterion_group, criterion_main};

mod dsp;
mod scenarios;

/// Common buffer sizes used in audio applications.
pub const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512];

/// Sample rate every benchmark renders at.
pub const SAMPLE_RATE: f32 = 22_050.0;

criterion_group!(
    benches,
    // DSP primitives
    dsp::bench_oscillator,
    dsp::bench_envelope,
    dsp::bench_filter,
    dsp::bench_mix,
    // Complete voices
    scenarios::bench_voices,
);
criterion_main!(benches);
