use crate::{
    dsp::oscillator::{Oscillator, Waveform},
    error::Result,
};

/*
LFO (Low Frequency Oscillator)
==============================

An LFO is an ordinary oscillator running at a sub-audio rate whose output
drives a parameter instead of being heard.

Unlike an audio oscillator it is unipolar: its output is remapped into
(0.2, 1.0). Fed to the default amplitude modulation (gain × base amplitude)
that gives a tremolo which never fully silences the carrier; fed to the
default frequency modulation it swings the pitch a little below and above
the base frequency, centred on the 0.7 sustain reference:

    freq = base + (lfo − 0.7) · base · 0.1
    lfo = 0.2  →  base · 0.95
    lfo = 1.0  →  base · 1.03

Common LFO uses
---------------

  Tremolo:  LFO → amplitude (slot 0)
  Vibrato:  LFO → frequency (slot 1, or slot 0 when it is the only modulator)
  Phasing:  LFO → phase     (slot 2, or the last modulator)
*/

/// Output range of a modulation LFO.
pub const LFO_RANGE: (f32, f32) = (0.2, 1.0);

/// Build an LFO oscillator at `rate` Hz.
pub fn lfo(waveform: Waveform, rate: f32, sample_rate: f32) -> Result<Oscillator> {
    Oscillator::new(waveform, rate, sample_rate)?.with_range(LFO_RANGE.0, LFO_RANGE.1)
}
