use std::f64::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::mix::apply_dry_wet,
    error::{Result, SynthError},
    MAX_BLOCK_SIZE,
};

/*
Post Filter
===========

A 5th-order Butterworth low-pass applied to a whole buffer at once, then
blended with the unfiltered buffer:

    output = intensity · filtered + (1 − intensity) · raw

Design
------

The analog prototype is discretised with the bilinear transform, with the
cutoff prewarped so the −3 dB point lands exactly on `cutoff`:

    K = tan(π · cutoff / sample_rate)

An order-N Butterworth factors into N/2 second-order sections plus one
first-order section when N is odd. Section k of the pole pairs has

    Q_k = 1 / (2 · sin(π · (2k + 1) / (2N)))

    norm = 1 / (1 + K/Q + K²)
    b0 = K² · norm       b1 = 2 · b0          b2 = b0
    a1 = 2 · (K² − 1) · norm                  a2 = (1 − K/Q + K²) · norm

and the real pole gives the first-order section

    norm = 1 / (1 + K)
    b0 = b1 = K · norm   a1 = (K − 1) · norm

Every section has unity gain at DC. The cascade runs in direct form II
transposed with f64 state.

No state between buffers
------------------------

Each call starts every section from zero state. Consecutive buffers are
filtered independently, which leaves a small discontinuity at each buffer
boundary while the filter settles again.

Off
---

cutoff ≤ 0 turns the filter off: the buffer passes through untouched,
whatever the intensity.
*/

/// Order of the Butterworth prototype.
pub const FILTER_ORDER: usize = 5;

const SECTIONS: usize = FILTER_ORDER.div_ceil(2);

/// Cutoff (Hz, ≤ 0 for off) and wet/dry intensity.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    pub cutoff: f32,
    pub intensity: f32,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            cutoff: 0.0,
            intensity: 1.0,
        }
    }
}

impl FilterParams {
    pub fn new(cutoff: f32, intensity: f32) -> Self {
        Self { cutoff, intensity }
    }

    pub fn is_off(&self) -> bool {
        self.cutoff <= 0.0
    }

    pub fn validate(&self, sample_rate: f32) -> Result<()> {
        if !(self.intensity.is_finite() && self.intensity > 0.0 && self.intensity <= 1.0) {
            return Err(SynthError::InvalidIntensity(self.intensity));
        }
        let nyquist = sample_rate / 2.0;
        if self.cutoff.is_nan() || self.cutoff >= nyquist {
            return Err(SynthError::InvalidCutoff {
                cutoff: self.cutoff,
                nyquist,
            });
        }
        Ok(())
    }
}

/// One biquad in direct form II transposed. First-order sections leave
/// `b2`/`a2` at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Section {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Section {
    fn second_order(k: f64, q: f64) -> Self {
        let k2 = k * k;
        let norm = 1.0 / (1.0 + k / q + k2);
        let b0 = k2 * norm;
        Self {
            b0,
            b1: 2.0 * b0,
            b2: b0,
            a1: 2.0 * (k2 - 1.0) * norm,
            a2: (1.0 - k / q + k2) * norm,
        }
    }

    fn first_order(k: f64) -> Self {
        let norm = 1.0 / (1.0 + k);
        Self {
            b0: k * norm,
            b1: k * norm,
            b2: 0.0,
            a1: (k - 1.0) * norm,
            a2: 0.0,
        }
    }

    /// Filter in place from zero state.
    fn run(&self, samples: &mut [f32]) {
        let mut z1 = 0.0f64;
        let mut z2 = 0.0f64;
        for sample in samples.iter_mut() {
            let x = *sample as f64;
            let y = self.b0 * x + z1;
            z1 = self.b1 * x - self.a1 * y + z2;
            z2 = self.b2 * x - self.a2 * y;
            *sample = y as f32;
        }
    }
}

fn design(cutoff: f32, sample_rate: f32) -> [Section; SECTIONS] {
    let mut sections = [Section::default(); SECTIONS];
    if cutoff <= 0.0 {
        return sections;
    }

    let k = (PI * cutoff as f64 / sample_rate as f64).tan();
    let order = FILTER_ORDER as f64;
    for (i, section) in sections.iter_mut().take(FILTER_ORDER / 2).enumerate() {
        let q = 1.0 / (2.0 * (PI * (2 * i + 1) as f64 / (2.0 * order)).sin());
        *section = Section::second_order(k, q);
    }
    if FILTER_ORDER % 2 == 1 {
        sections[SECTIONS - 1] = Section::first_order(k);
    }
    sections
}

#[derive(Debug, Clone)]
pub struct PostFilter {
    params: FilterParams,
    sample_rate: f32,
    sections: [Section; SECTIONS],
    dry: Vec<f32>,
}

impl PostFilter {
    pub fn new(params: FilterParams, sample_rate: f32) -> Result<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(SynthError::InvalidSampleRate(sample_rate));
        }
        params.validate(sample_rate)?;
        Ok(Self {
            params,
            sample_rate,
            sections: design(params.cutoff, sample_rate),
            dry: Vec::with_capacity(MAX_BLOCK_SIZE),
        })
    }

    /// A filter in the off state.
    pub fn off(sample_rate: f32) -> Result<Self> {
        Self::new(FilterParams::default(), sample_rate)
    }

    /// Replace cutoff and intensity; the old settings stay on error.
    pub fn set_params(&mut self, params: FilterParams) -> Result<()> {
        params.validate(self.sample_rate)?;
        self.params = params;
        self.sections = design(params.cutoff, self.sample_rate);
        Ok(())
    }

    pub fn params(&self) -> FilterParams {
        self.params
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn is_bypassed(&self) -> bool {
        self.params.is_off()
    }

    /// Filter and blend one buffer in place.
    pub fn process(&mut self, buffer: &mut [f32]) {
        if self.is_bypassed() || buffer.is_empty() {
            return;
        }

        let blend = self.params.intensity < 1.0;
        if blend {
            self.dry.clear();
            self.dry.extend_from_slice(buffer);
        }

        for section in &self.sections {
            section.run(buffer);
        }

        if blend {
            apply_dry_wet(&self.dry, buffer, self.params.intensity);
        }
    }
}
