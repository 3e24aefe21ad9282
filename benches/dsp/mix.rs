//! Benchmarks for signal mixing operations.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use monosynth::dsp::mix;
use monosynth::dsp::oscillator::Oscillator;
use monosynth::graph::{
    chain::Chain,
    mix::{MixMode, Mixer},
    node::GraphNode,
};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_mix(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/mix");

    for &size in BLOCK_SIZES {
        // Generate test signals
        let signal_a: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();
        let signal_b: Vec<f32> = (0..size).map(|i| (i as f32 * 0.15).cos()).collect();

        // Dry/wet mixing (the post filter's blend)
        let dry = signal_a.clone();
        let mut wet = signal_b.clone();
        group.bench_with_input(BenchmarkId::new("dry_wet", size), &size, |b, _| {
            b.iter(|| {
                wet.copy_from_slice(&signal_b);
                mix::apply_dry_wet(black_box(&dry), black_box(&mut wet), black_box(0.3));
            })
        });

        let mut buffer = vec![0.0f32; size];

        // Mean of three chains, mono
        let chain = |freq: f32| Chain::new(Oscillator::sawtooth(freq, SAMPLE_RATE).unwrap());
        let mut mixer = Mixer::new(MixMode::Mono)
            .with_source(chain(220.0))
            .with_source(chain(330.0))
            .with_source(chain(440.0));
        group.bench_with_input(BenchmarkId::new("mixer_mono_3", size), &size, |b, _| {
            b.iter(|| {
                mixer.render_block(black_box(&mut buffer));
            })
        });

        // Same sources folded to stereo frames
        let mut mixer = Mixer::new(MixMode::Stereo)
            .with_source(chain(220.0))
            .with_source(chain(330.0))
            .with_source(chain(440.0));
        group.bench_with_input(BenchmarkId::new("mixer_stereo_3", size), &size, |b, _| {
            b.iter(|| {
                for sample in buffer.iter_mut() {
                    let (l, r) = mixer.next_frame().to_stereo();
                    *sample = l + r;
                }
                black_box(&buffer);
            })
        });
    }

    group.finish();
}
