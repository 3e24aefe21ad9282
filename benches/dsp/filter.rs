//! Benchmarks for the Butterworth post filter.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use monosynth::dsp::filter::{FilterParams, PostFilter};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    for &size in BLOCK_SIZES {
        // Generate a test signal (sawtooth-like ramp)
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();

        // Fully wet
        let mut filter = PostFilter::new(FilterParams::new(1_000.0, 1.0), SAMPLE_RATE).unwrap();
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("lowpass", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.process(black_box(&mut buffer));
            })
        });

        // Wet/dry blend adds a copy and a crossfade
        let mut filter = PostFilter::new(FilterParams::new(1_000.0, 0.5), SAMPLE_RATE).unwrap();
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("lowpass_blend", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.process(black_box(&mut buffer));
            })
        });

        // Off - should cost nothing
        let mut filter = PostFilter::off(SAMPLE_RATE).unwrap();
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("off", size), &size, |b, _| {
            b.iter(|| {
                filter.process(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
