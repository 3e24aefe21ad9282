//! Benchmarks for complete voices.
//!
//! These test the signal path a note-on builds, from the plain enveloped
//! oscillator to the LFO-modulated patch, plus the engine around it.

use std::collections::VecDeque;
use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use monosynth::{
    dsp::{filter::FilterParams, oscillator::Waveform},
    graph::{mix::MixMode, node::GraphNode},
    synth::{MonoSynth, SynthMessage, Voice},
    Patch, SynthConfig,
};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // === PLAIN VOICE ===
        // sawtooth → envelope, no LFO
        // This is a baseline for what a typical voice costs
        let patch = Patch {
            waveform: Waveform::Sawtooth,
            ..Patch::default()
        };
        let mut plain = Voice::new(&patch, 110.0, SAMPLE_RATE, MixMode::Mono).unwrap();
        group.bench_with_input(BenchmarkId::new("plain", size), &size, |b, _| {
            b.iter(|| {
                plain.render_block(black_box(&mut buffer));
            })
        });

        // === MODULATED VOICE ===
        // sine LFO driving amplitude and frequency every sample
        let patch = Patch {
            waveform: Waveform::Sawtooth,
            lfo_rate: 5.0,
            ..Patch::default()
        };
        let mut modulated = Voice::new(&patch, 110.0, SAMPLE_RATE, MixMode::Mono).unwrap();
        group.bench_with_input(BenchmarkId::new("lfo_modulated", size), &size, |b, _| {
            b.iter(|| {
                modulated.render_block(black_box(&mut buffer));
            })
        });

        // === ENGINE PULL ===
        // queue drain + voice + post filter, as the audio callback runs it
        let mut config = SynthConfig::default();
        config.engine.buffer_size = size;
        config.patch = Patch {
            lfo_rate: 5.0,
            filter: FilterParams::new(1_500.0, 0.8),
            ..patch
        };
        let mut synth = MonoSynth::new(&config, VecDeque::<SynthMessage>::new()).unwrap();
        synth
            .receiver_mut()
            .push_back(SynthMessage::NoteOn { frequency: 110.0 });
        group.bench_with_input(BenchmarkId::new("engine_filtered", size), &size, |b, _| {
            b.iter(|| {
                synth.render_block(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
