#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthError};

/*
ADSR Envelope Implementation
============================

A linear ADSR envelope. The output (gain) multiplies the carrier so a note
fades in, settles, and fades out instead of clicking on and off.

Vocabulary
----------

  gain        The envelope's current output, always within [0.0, 1.0].

  stage       Attack, Decay, Sustain, Release or Ended.

  step        How much gain changes per sample:
                attack   +1 / (attack · sample_rate)
                decay    −(1 − sustain) / (decay · sample_rate)
                release  −sustain / (release · sample_rate)


The Shape
---------

    Gain
    1.0 ┐     ╱╲
        │    ╱  ╲___________
    S   │   ╱               ╲
        │  ╱                 ╲
    0.0 └─╱───────────────────╲──→ Time
        Attack Decay  Sustain  Release  (Ended)


Stepping
--------

Each stage counts samples since it began and derives gain from that count
(start + n · step) rather than accumulating, so long stages do not drift.

  Attack   starts at exactly 0.0. The first value that would exceed 1.0 is
           not emitted; that sample comes from the Decay stepper instead,
           which starts at exactly 1.0. No sample is dropped.

  Decay    ramps down; the first value at or below `sustain` is clamped to
           `sustain` and the envelope enters Sustain.

  Release  starts from whatever gain was current at note-off (not from the
           sustain level), so releasing mid-attack does not jump. When the
           ramp reaches zero the gain is clamped to 0.0 and `ended` latches
           until the next note-on.

Zero durations are legal: a zero-length stage hands over to the next stage
within the same sample. With sustain = 0 the release step would be zero, so
the ramp is measured against the starting gain instead.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Attack,
    Decay,
    Sustain,
    Release,
    Ended,
}

/// ADSR durations (seconds) and sustain level.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeParams {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self {
            attack: 0.05,
            decay: 0.2,
            sustain: 0.7,
            release: 0.3,
        }
    }
}

impl EnvelopeParams {
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (stage, seconds) in [
            ("attack", self.attack),
            ("decay", self.decay),
            ("release", self.release),
        ] {
            if !(seconds.is_finite() && seconds >= 0.0) {
                return Err(SynthError::InvalidDuration { stage, seconds });
            }
        }
        if !(0.0..=1.0).contains(&self.sustain) {
            return Err(SynthError::InvalidSustain(self.sustain));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Envelope {
    params: EnvelopeParams,
    sample_rate: f32,

    stage: EnvelopeState,
    level: f32,
    elapsed: u64, // samples since the current stage began
    release_start: f32,
    ended: bool,
}

impl Envelope {
    /// Build an envelope, armed at the start of its attack.
    pub fn new(params: EnvelopeParams, sample_rate: f32) -> Result<Self> {
        params.validate()?;
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(SynthError::InvalidSampleRate(sample_rate));
        }

        let mut env = Self {
            params,
            sample_rate,
            stage: EnvelopeState::Attack,
            level: 0.0,
            elapsed: 0,
            release_start: 0.0,
            ended: false,
        };
        env.note_on();
        Ok(env)
    }

    pub fn adsr(
        sample_rate: f32,
        attack: f32,
        decay: f32,
        sustain: f32,
        release: f32,
    ) -> Result<Self> {
        Self::new(EnvelopeParams::new(attack, decay, sustain, release), sample_rate)
    }

    /// Gate high: restart the attack from zero, from any stage.
    pub fn note_on(&mut self) {
        self.level = 0.0;
        self.elapsed = 0;
        self.ended = false;
        self.stage = EnvelopeState::Attack;
    }

    /// Gate low: release from the current gain.
    pub fn note_off(&mut self) {
        if self.stage == EnvelopeState::Ended {
            return;
        }
        self.release_start = self.level;
        self.elapsed = 0;
        self.stage = EnvelopeState::Release;
    }

    /// Advance one sample and return the new gain.
    pub fn next_sample(&mut self) -> f32 {
        self.level = self.step();
        debug_assert!((0.0..=1.0).contains(&self.level));
        self.level
    }

    fn step(&mut self) -> f32 {
        let rate = self.sample_rate as f64;

        if self.stage == EnvelopeState::Attack {
            if self.params.attack > 0.0 {
                let step = 1.0 / (self.params.attack as f64 * rate);
                let value = self.elapsed as f64 * step;
                self.elapsed += 1;
                if value <= 1.0 {
                    return value as f32;
                }
            }
            self.enter(EnvelopeState::Decay);
        }

        if self.stage == EnvelopeState::Decay {
            let sustain = self.params.sustain as f64;
            if self.params.decay > 0.0 {
                let step = (1.0 - sustain) / (self.params.decay as f64 * rate);
                let value = 1.0 - self.elapsed as f64 * step;
                self.elapsed += 1;
                if value > sustain {
                    return value as f32;
                }
            }
            self.enter(EnvelopeState::Sustain);
            return self.params.sustain;
        }

        match self.stage {
            EnvelopeState::Sustain => self.params.sustain,
            EnvelopeState::Release => self.release_step(rate),
            _ => 0.0,
        }
    }

    fn release_step(&mut self, rate: f64) -> f32 {
        let start = self.release_start as f64;
        if self.params.release <= 0.0 || start <= 0.0 {
            return self.finish();
        }

        let span = if self.params.sustain > 0.0 {
            self.params.sustain as f64
        } else {
            start
        };
        let step = span / (self.params.release as f64 * rate);
        let value = start - self.elapsed as f64 * step;
        self.elapsed += 1;

        if value <= 0.0 {
            self.finish()
        } else {
            value as f32
        }
    }

    fn finish(&mut self) -> f32 {
        self.stage = EnvelopeState::Ended;
        self.ended = true;
        0.0
    }

    fn enter(&mut self, stage: EnvelopeState) {
        self.stage = stage;
        self.elapsed = 0;
    }

    /// Render a block of gain values.
    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample();
        }
    }

    /// Full attack + decay + hold + release trace for display.
    ///
    /// Runs on a private copy; the live envelope is untouched. The trace is
    /// `round((attack + decay + hold + release) · sample_rate)` samples long.
    pub fn shape(&self, note_on_duration: f32) -> Vec<f32> {
        let rate = self.sample_rate as f64;
        let p = &self.params;
        let seconds = |s: f64| (s * rate).round() as usize;

        let total = seconds(
            p.attack as f64 + p.decay as f64 + note_on_duration.max(0.0) as f64 + p.release as f64,
        );
        let gated = seconds(p.attack as f64 + p.decay as f64)
            + seconds(note_on_duration.max(0.0) as f64);

        let mut env = Self {
            params: self.params,
            sample_rate: self.sample_rate,
            stage: EnvelopeState::Attack,
            level: 0.0,
            elapsed: 0,
            release_start: 0.0,
            ended: false,
        };

        let mut trace = Vec::with_capacity(total);
        for i in 0..total {
            if i == gated {
                env.note_off();
            }
            trace.push(env.next_sample());
        }
        trace
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn state(&self) -> EnvelopeState {
        self.stage
    }

    pub fn params(&self) -> EnvelopeParams {
        self.params
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}
