#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::{envelope::EnvelopeParams, filter::FilterParams, oscillator::Waveform},
    error::{Result, SynthError},
    graph::{mix::MixMode, modulate::FreqMod},
    MAX_BLOCK_SIZE,
};

/// How the engine talks to the output device.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: f32,
    /// Samples per channel in one pull.
    pub buffer_size: usize,
    pub mix_mode: MixMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22_050.0,
            buffer_size: 256,
            mix_mode: MixMode::Mono,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(SynthError::InvalidSampleRate(self.sample_rate));
        }
        if !(1..=MAX_BLOCK_SIZE).contains(&self.buffer_size) {
            return Err(SynthError::InvalidBufferSize {
                size: self.buffer_size,
                max: MAX_BLOCK_SIZE,
            });
        }
        Ok(())
    }

    pub fn channels(&self) -> usize {
        self.mix_mode.channels()
    }
}

/// Timbre of the voice built on every note-on.
///
/// An `lfo_rate` of 0 disables the LFO: the carrier plays unmodulated and
/// only the envelope shapes it. Above 0 the LFO drives both amplitude and
/// frequency of the carrier.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Patch {
    pub waveform: Waveform,
    pub lfo_waveform: Waveform,
    /// Hz
    pub lfo_rate: f32,
    pub envelope: EnvelopeParams,
    pub freq_mod: FreqMod,
    pub filter: FilterParams,
}

impl Patch {
    pub fn validate(&self, sample_rate: f32) -> Result<()> {
        if !(self.lfo_rate.is_finite() && self.lfo_rate >= 0.0) {
            return Err(SynthError::InvalidLfoRate(self.lfo_rate));
        }
        self.envelope.validate()?;
        self.filter.validate(sample_rate)
    }

    pub fn has_lfo(&self) -> bool {
        self.lfo_rate > 0.0
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SynthConfig {
    pub engine: EngineConfig,
    pub patch: Patch,
}

impl SynthConfig {
    pub fn validate(&self) -> Result<()> {
        self.engine.validate()?;
        self.patch.validate(self.engine.sample_rate)
    }
}
