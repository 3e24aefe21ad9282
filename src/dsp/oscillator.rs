use std::{f64::consts::TAU, fmt, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthError};

/*
Periodic Oscillators
====================

Every oscillator is a lazy, endless stream of samples. Two families share the
work:

  phase accumulator   Sine and Square. `position` advances by `step` radians
                      per sample, where step = 2π·frequency / sample_rate.
                      Square reads the same sine phase and snaps to the top or
                      bottom of the output range depending on `threshold`.

  period counter      Sawtooth and Triangle. `position` counts samples and
                      the period is sample_rate / frequency samples long.

                        div  = (i + offset) / period
                        saw  = 2 · (div − round(div))        in [-1, 1)
                        tri  = (|saw| − 0.5) · 2             in [-1, 1]

                      The phase offset is measured in samples:
                        offset = ((phase° + 90) / 360) · period

Live vs. base values
--------------------

Each oscillator remembers the frequency/amplitude/phase it was built with
(base values) and the live values modulation writes every tick. Changing a
live value recomputes step, period and offset immediately but never touches
`position`, so pitch and phase stay continuous under modulation. `arm()`
restores the base values and rewinds `position` to zero for a clean note
start.

Output range
------------

The raw bipolar sample is linearly remapped into (min, max) when the range is
anything other than (-1, 1), then scaled by the live amplitude. Square skips
the remap and emits min or max directly.
*/

/// Lowest frequency a modulated oscillator is allowed to run at.
pub const MIN_FREQUENCY: f32 = 1.0e-3;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Sawtooth,
        Waveform::Triangle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Triangle => "triangle",
        }
    }

    /// The waveform after this one, wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|&w| w == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        let idx = Self::ALL.iter().position(|&w| w == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Waveform {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|w| w.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SynthError::InvalidWaveform(s.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct Oscillator {
    waveform: Waveform,
    sample_rate: f32,
    range: (f32, f32),
    threshold: f32,

    // Values the oscillator was built with, restored by `arm()`
    base_frequency: f32,
    base_amplitude: f32,
    base_phase: f32, // degrees

    // Live values, written by modulation
    frequency: f32,
    amplitude: f32,
    phase: f32, // degrees

    // Derived from the live values
    step: f64,         // radians per sample (sine, square)
    period: f64,       // samples per cycle (sawtooth, triangle)
    phase_offset: f64, // radians or samples, matching `position`

    position: f64,
}

impl Oscillator {
    pub fn new(waveform: Waveform, frequency: f32, sample_rate: f32) -> Result<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(SynthError::InvalidSampleRate(sample_rate));
        }
        validate_frequency(frequency)?;

        let mut osc = Self {
            waveform,
            sample_rate,
            range: (-1.0, 1.0),
            threshold: 0.0,
            base_frequency: frequency,
            base_amplitude: 1.0,
            base_phase: 0.0,
            frequency,
            amplitude: 1.0,
            phase: 0.0,
            step: 0.0,
            period: 1.0,
            phase_offset: 0.0,
            position: 0.0,
        };
        osc.arm();
        Ok(osc)
    }

    pub fn sine(frequency: f32, sample_rate: f32) -> Result<Self> {
        Self::new(Waveform::Sine, frequency, sample_rate)
    }

    pub fn square(frequency: f32, sample_rate: f32) -> Result<Self> {
        Self::new(Waveform::Square, frequency, sample_rate)
    }

    pub fn sawtooth(frequency: f32, sample_rate: f32) -> Result<Self> {
        Self::new(Waveform::Sawtooth, frequency, sample_rate)
    }

    pub fn triangle(frequency: f32, sample_rate: f32) -> Result<Self> {
        Self::new(Waveform::Triangle, frequency, sample_rate)
    }

    /// Set the base amplitude (restored on every `arm()`).
    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.base_amplitude = amplitude;
        self.arm();
        self
    }

    /// Set the base phase in degrees.
    pub fn with_phase(mut self, degrees: f32) -> Self {
        self.base_phase = degrees;
        self.arm();
        self
    }

    /// Remap output into `(min, max)` instead of `(-1, 1)`.
    pub fn with_range(mut self, min: f32, max: f32) -> Result<Self> {
        if !(min.is_finite() && max.is_finite() && min <= max) {
            return Err(SynthError::InvalidRange { min, max });
        }
        self.range = (min, max);
        Ok(self)
    }

    /// Square only: sine values below `threshold` map to the range minimum.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Restore base values and rewind to the start of the cycle.
    pub fn arm(&mut self) {
        self.frequency = self.base_frequency;
        self.amplitude = self.base_amplitude;
        self.phase = self.base_phase;
        self.recompute();
        self.position = 0.0;
    }

    /// Change the live frequency without resetting position.
    ///
    /// Non-positive or non-finite values hold at [`MIN_FREQUENCY`].
    pub fn set_frequency(&mut self, hz: f32) {
        self.frequency = if hz.is_finite() && hz > 0.0 {
            hz
        } else {
            MIN_FREQUENCY
        };
        self.recompute();
    }

    pub fn set_amplitude(&mut self, amplitude: f32) {
        self.amplitude = amplitude;
    }

    /// Change the live phase (degrees) without resetting position.
    pub fn set_phase(&mut self, degrees: f32) {
        self.phase = degrees;
        self.recompute();
    }

    /// Replace the base frequency and re-arm. Used when a note starts.
    pub fn retune(&mut self, hz: f32) -> Result<()> {
        validate_frequency(hz)?;
        self.base_frequency = hz;
        self.arm();
        Ok(())
    }

    fn recompute(&mut self) {
        let frequency = self.frequency as f64;
        let sample_rate = self.sample_rate as f64;
        let phase = self.phase as f64;

        match self.waveform {
            Waveform::Sine | Waveform::Square => {
                self.step = TAU * frequency / sample_rate;
                self.phase_offset = phase / 360.0 * TAU;
            }
            Waveform::Sawtooth | Waveform::Triangle => {
                self.period = sample_rate / frequency;
                self.phase_offset = (phase + 90.0) / 360.0 * self.period;
            }
        }
    }

    #[inline]
    fn remap(&self, value: f64) -> f64 {
        let (min, max) = self.range;
        if (min, max) == (-1.0, 1.0) {
            value
        } else {
            ((value + 1.0) / 2.0) * (max as f64 - min as f64) + min as f64
        }
    }

    /// Produce the next sample and advance.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let value = match self.waveform {
            Waveform::Sine => {
                let v = (self.position + self.phase_offset).sin();
                self.advance_phase();
                self.remap(v)
            }
            Waveform::Square => {
                let v = (self.position + self.phase_offset).sin();
                self.advance_phase();
                if v < self.threshold as f64 {
                    self.range.0 as f64
                } else {
                    self.range.1 as f64
                }
            }
            Waveform::Sawtooth | Waveform::Triangle => {
                let div = (self.position + self.phase_offset) / self.period;
                let mut v = 2.0 * (div - (0.5 + div).floor());
                if self.waveform == Waveform::Triangle {
                    v = (v.abs() - 0.5) * 2.0;
                }
                self.position += 1.0;
                self.remap(v)
            }
        };

        (value * self.amplitude as f64) as f32
    }

    #[inline]
    fn advance_phase(&mut self) {
        self.position = (self.position + self.step).rem_euclid(TAU);
    }

    /// Fill a buffer with consecutive samples.
    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample();
        }
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn range(&self) -> (f32, f32) {
        self.range
    }

    pub fn base_frequency(&self) -> f32 {
        self.base_frequency
    }

    pub fn base_amplitude(&self) -> f32 {
        self.base_amplitude
    }

    pub fn base_phase(&self) -> f32 {
        self.base_phase
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }
}

fn validate_frequency(hz: f32) -> Result<()> {
    if hz.is_finite() && hz > 0.0 {
        Ok(())
    } else {
        Err(SynthError::InvalidFrequency(hz))
    }
}
