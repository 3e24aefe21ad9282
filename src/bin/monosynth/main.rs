//! monosynth - play the engine from the computer keyboard or a MIDI input
//!
//! Run with: cargo run -- --help

mod app;
mod keyboard;
mod midi;
mod ui;

use std::{fs::File, path::PathBuf, sync::Mutex};

use clap::Parser;
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use monosynth::{
    dsp::{filter::FilterParams, oscillator::Waveform},
    graph::mix::MixMode,
    SynthConfig,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "monosynth")]
#[command(author, version, about = "Monophonic terminal synthesizer")]
struct Args {
    /// JSON config file; flags below override its fields
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Output sample rate in Hz
    #[arg(long, short = 'r')]
    sample_rate: Option<f32>,

    /// Samples per channel rendered per pull
    #[arg(long, short = 'b')]
    buffer_size: Option<usize>,

    /// Carrier waveform (sine, square, sawtooth, triangle)
    #[arg(long, short = 'w')]
    waveform: Option<Waveform>,

    #[arg(long)]
    lfo_waveform: Option<Waveform>,

    /// LFO rate in Hz, 0 disables the LFO
    #[arg(long)]
    lfo_rate: Option<f32>,

    /// Low-pass cutoff in Hz, 0 turns the filter off
    #[arg(long)]
    cutoff: Option<f32>,

    /// Wet share of the filter blend, in (0, 1]
    #[arg(long)]
    intensity: Option<f32>,

    /// Render two interleaved channels
    #[arg(long)]
    stereo: bool,

    /// Also play from the MIDI input whose name contains this text
    #[arg(long, value_name = "PORT")]
    midi: Option<String>,

    /// MIDI channel to follow
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=16))]
    midi_channel: u8,

    #[arg(long, default_value = "monosynth.log")]
    log_file: PathBuf,
}

impl Args {
    fn midi_source(&self) -> Option<midi::MidiSource> {
        self.midi.as_ref().map(|port| midi::MidiSource {
            port: port.clone(),
            channel: self.midi_channel,
        })
    }

    fn load_config(&self) -> EyreResult<SynthConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .wrap_err_with(|| format!("failed to read {}", path.display()))?;
                serde_json::from_str(&text)
                    .wrap_err_with(|| format!("failed to parse {}", path.display()))?
            }
            None => SynthConfig::default(),
        };

        if let Some(rate) = self.sample_rate {
            config.engine.sample_rate = rate;
        }
        if let Some(size) = self.buffer_size {
            config.engine.buffer_size = size;
        }
        if self.stereo {
            config.engine.mix_mode = MixMode::Stereo;
        }

        let patch = &mut config.patch;
        if let Some(waveform) = self.waveform {
            patch.waveform = waveform;
        }
        if let Some(waveform) = self.lfo_waveform {
            patch.lfo_waveform = waveform;
        }
        if let Some(rate) = self.lfo_rate {
            patch.lfo_rate = rate;
        }
        patch.filter = FilterParams::new(
            self.cutoff.unwrap_or(patch.filter.cutoff),
            self.intensity.unwrap_or(patch.filter.intensity),
        );

        config.validate().wrap_err("invalid configuration")?;
        Ok(config)
    }
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    let args = Args::parse();

    // the terminal belongs to the UI, so logs go to a file
    let log = File::create(&args.log_file)
        .wrap_err_with(|| format!("failed to create {}", args.log_file.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(log))
        .with_ansi(false)
        .init();

    let config = args.load_config()?;
    info!(?config, "starting monosynth");

    app::run(config, args.midi_source())
}
