//! Benchmarks for oscillator waveform generation.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use monosynth::dsp::oscillator::{Oscillator, Waveform};
use monosynth::graph::lfo::lfo;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Sine and square share the sin() phase accumulator; sawtooth and
        // triangle use the period counter
        for waveform in Waveform::ALL {
            let mut osc = Oscillator::new(waveform, 440.0, SAMPLE_RATE).unwrap();
            group.bench_with_input(BenchmarkId::new(waveform.name(), size), &size, |b, _| {
                b.iter(|| {
                    osc.render(black_box(&mut buffer));
                })
            });
        }

        // LFO - remapped output range
        let mut osc = lfo(Waveform::Sine, 5.0, SAMPLE_RATE).unwrap();
        group.bench_with_input(BenchmarkId::new("lfo", size), &size, |b, _| {
            b.iter(|| {
                osc.render(black_box(&mut buffer));
            })
        });

        // Live frequency change every sample, as modulation does
        let mut osc = Oscillator::sawtooth(440.0, SAMPLE_RATE).unwrap();
        group.bench_with_input(BenchmarkId::new("sawtooth_retuned", size), &size, |b, _| {
            b.iter(|| {
                for (i, sample) in buffer.iter_mut().enumerate() {
                    osc.set_frequency(440.0 + (i % 8) as f32);
                    *sample = osc.next_sample();
                }
                black_box(&buffer);
            })
        });
    }

    group.finish();
}
