//! Audio device setup and the callback that feeds it from the engine.

use std::{
    io::stdout,
    sync::{Arc, Mutex},
};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    SampleFormat, SizedSample, StreamConfig,
};
use crossterm::{
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute,
    terminal::supports_keyboard_enhancement,
};
use monosynth::{
    dsp::mix::fold_to_mono,
    io::sample_to_i16,
    synth::{channel, MonoSynth, SynthMessage},
    SynthConfig,
};
use rtrb::{Consumer, Producer, RingBuffer};
use tracing::{error, info, warn};

use super::{
    keyboard::Controls,
    midi::{self, MidiSource},
    ui::UiApp,
};

/// Mono samples queued for the scope; new ones are dropped while it is full.
const SCOPE_QUEUE_SIZE: usize = 8192;

/// Open the device, start the engine and hand the terminal to the UI.
pub fn run(mut config: SynthConfig, midi_source: Option<MidiSource>) -> EyreResult<()> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| eyre!("no default output device available"))?;
    let (stream_config, format) = pick_config(&device, config.engine.sample_rate)?;

    let device_rate = stream_config.sample_rate.0 as f32;
    if device_rate != config.engine.sample_rate {
        warn!(
            requested = config.engine.sample_rate,
            device = device_rate,
            "sample rate not supported, using the device default"
        );
        config.engine.sample_rate = device_rate;
        config
            .validate()
            .wrap_err("configuration does not fit the device sample rate")?;
    }
    info!(
        channels = stream_config.channels,
        sample_rate = device_rate,
        ?format,
        "output device ready"
    );

    let (handle, synth) = channel(&config)?;
    let (scope_tx, scope_rx) = RingBuffer::new(SCOPE_QUEUE_SIZE);
    let feeder = Feeder::new(synth, scope_tx);

    let stream = match format {
        SampleFormat::F32 => build_stream(&device, &stream_config, feeder, |s: f32| s),
        SampleFormat::I16 => build_stream(&device, &stream_config, feeder, sample_to_i16),
        other => Err(eyre!("unsupported sample format {other}")),
    }?;
    stream.play().wrap_err("failed to start output stream")?;

    let handle = Arc::new(Mutex::new(handle));
    let midi_in = midi_source
        .map(|source| midi::connect(&source, Arc::clone(&handle)))
        .transpose()?;

    let controls = Controls::new(handle, config.patch, device_rate);
    let mut app = UiApp::new(scope_rx, controls, config.engine);

    let mut terminal = ratatui::init();
    // key release events, where the terminal can report them
    let enhanced = supports_keyboard_enhancement().unwrap_or(false)
        && execute!(
            stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )
        .is_ok();
    let result = app.run(&mut terminal);
    if enhanced {
        let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
    }
    ratatui::restore();

    if let Some(conn) = midi_in {
        conn.close();
    }
    drop(stream);
    info!("stopped");
    result
}

/// Device config at the requested rate, preferring f32 output. Falls back to
/// the device default when no range covers the rate.
fn pick_config(device: &cpal::Device, sample_rate: f32) -> EyreResult<(StreamConfig, SampleFormat)> {
    let wanted = cpal::SampleRate(sample_rate.round() as u32);
    let ranges: Vec<_> = device
        .supported_output_configs()
        .wrap_err("failed to query output configs")?
        .collect();

    let matching = [SampleFormat::F32, SampleFormat::I16].into_iter().find_map(|format| {
        ranges
            .iter()
            .find(|range| {
                range.sample_format() == format
                    && range.min_sample_rate() <= wanted
                    && wanted <= range.max_sample_rate()
            })
            .cloned()
    });

    let supported = match matching {
        Some(range) => range.with_sample_rate(wanted),
        None => device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?,
    };
    Ok((supported.config(), supported.sample_format()))
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut feeder: Feeder,
    convert: fn(f32) -> T,
) -> EyreResult<cpal::Stream>
where
    T: SizedSample + Send + 'static,
{
    let channels = config.channels as usize;
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| feeder.fill(data, channels, convert),
            |err| error!(%err, "audio stream error"),
            None,
        )
        .wrap_err("failed to build output stream")
}

/// Adapts the engine's fixed buffer size to whatever the device asks for.
///
/// The engine renders exactly `buffer_size` frames at a time into `block`;
/// the callback drains it frame by frame and pulls the next block when it
/// runs dry.
struct Feeder {
    synth: MonoSynth<Consumer<SynthMessage>>,
    block: Vec<f32>,
    cursor: usize,
    channels: usize,
    scope: Producer<f32>,
}

impl Feeder {
    fn new(synth: MonoSynth<Consumer<SynthMessage>>, scope: Producer<f32>) -> Self {
        let channels = synth.engine().channels();
        let block = vec![0.0; synth.engine().buffer_size * channels];
        Self {
            cursor: block.len(),
            synth,
            block,
            channels,
            scope,
        }
    }

    fn fill<T: Copy>(&mut self, data: &mut [T], device_channels: usize, convert: fn(f32) -> T) {
        for frame in data.chunks_mut(device_channels) {
            if self.cursor == self.block.len() {
                self.refill();
            }
            let src = &self.block[self.cursor..self.cursor + self.channels];
            self.cursor += self.channels;

            match *src {
                [mono] => frame.fill(convert(mono)),
                [left, right] if frame.len() == 1 => frame[0] = convert(fold_to_mono(left, right)),
                [left, right] => {
                    for (i, out) in frame.iter_mut().enumerate() {
                        *out = convert(if i % 2 == 0 { left } else { right });
                    }
                }
                _ => frame.fill(convert(0.0)),
            }
        }
    }

    fn refill(&mut self) {
        self.synth.render_block(&mut self.block);
        self.cursor = 0;
        for frame in self.synth.last_buffer().chunks_exact(self.channels) {
            let sample = match *frame {
                [left, right] => fold_to_mono(left, right),
                _ => frame[0],
            };
            // the scope is best effort
            if self.scope.push(sample).is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monosynth::graph::mix::MixMode;

    fn feeder(mode: MixMode) -> (Feeder, Consumer<f32>, monosynth::synth::SynthHandle) {
        let mut config = SynthConfig::default();
        config.engine.mix_mode = mode;
        config.engine.buffer_size = 64;
        let (handle, synth) = channel(&config).unwrap();
        let (tx, rx) = RingBuffer::new(SCOPE_QUEUE_SIZE);
        (Feeder::new(synth, tx), rx, handle)
    }

    #[test]
    fn odd_device_buffers_drain_whole_engine_blocks() {
        let (mut feeder, mut scope, mut handle) = feeder(MixMode::Mono);
        handle.note_on(440.0).unwrap();

        let mut data = vec![0.0f32; 100 * 2];
        feeder.fill(&mut data, 2, |s| s);
        for frame in data.chunks_exact(2) {
            assert_eq!(frame[0], frame[1]);
        }
        assert!(data.iter().any(|&s| s != 0.0));
        // two blocks of 64 were rendered to cover 100 frames
        let mut seen = 0;
        while scope.pop().is_ok() {
            seen += 1;
        }
        assert_eq!(seen, 128);
    }

    #[test]
    fn stereo_engine_folds_to_a_mono_device() {
        let (mut feeder, _scope, mut handle) = feeder(MixMode::Stereo);
        handle.note_on(220.0).unwrap();

        let mut mono = vec![0i16; 64];
        feeder.fill(&mut mono, 1, sample_to_i16);
        assert!(mono.iter().any(|&s| s != 0));
        assert_eq!(feeder.cursor, feeder.block.len());
    }
}
