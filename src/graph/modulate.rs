#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::oscillator::Oscillator,
    error::{Result, SynthError},
    graph::node::{all_ended, GraphNode},
};

/*
Modulation Router
=================

Binds a carrier oscillator to up to three modulator streams. Every tick:

  1. pull one sample from EVERY modulator, used or not, so each keeps
     advancing in lockstep with the carrier
  2. write the modulated amplitude / frequency / phase into the carrier's
     live values (never re-arming it, so the waveform stays continuous)
  3. pull and return the carrier's sample

Slot Selection
--------------

Which modulator drives which parameter is fixed:

  parameter   modulators = 1   modulators = 2   modulators = 3
  ---------   --------------   --------------   --------------
  amplitude   slot 0           slot 0           slot 0
  frequency   slot 0           slot 1           slot 0
  phase       slot 0           slot 1 (last)    slot 2

Slot 0 is the amplitude slot, slot 1 the frequency slot and slot 2 (or the
last one) the phase slot; with fewer modulators the duties collapse onto
what is there. With no modulators the carrier runs untouched.

Each modulation function receives the carrier's BASE value and the
modulator's sample and returns the new live value:

    amplitude   amp_mod:   modulator × base_amplitude
    frequency   FreqMod:   base + (modulator − sustain_reference) · base · depth

Release and End
---------------

note_off cascades to every modulator and to the carrier. `ended` is the AND
of the components that have an end state (typically an envelope used as a
modulator); components without one are left out of the reduction, and a
router where nothing can end reports no end state at all.
*/

/// Most modulators a single carrier can be bound to.
pub const MAX_MODULATORS: usize = 3;

/// `(base value, modulator sample) -> live value`
pub type ModFn = Box<dyn Fn(f32, f32) -> f32 + Send>;

/// Default amplitude modulation: the modulator scales the base amplitude.
pub fn amp_mod() -> ModFn {
    Box::new(|base_amplitude, value| value * base_amplitude)
}

/// Default frequency modulation around a reference modulator level.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreqMod {
    /// Fraction of the base frequency one unit of modulation moves it.
    pub depth: f32,
    /// Modulator level at which the base frequency is left unchanged.
    pub sustain_reference: f32,
}

impl Default for FreqMod {
    fn default() -> Self {
        Self {
            depth: 0.1,
            sustain_reference: 0.7,
        }
    }
}

impl FreqMod {
    #[inline]
    pub fn apply(&self, base_frequency: f32, value: f32) -> f32 {
        base_frequency + (value - self.sustain_reference) * base_frequency * self.depth
    }

    pub fn into_fn(self) -> ModFn {
        Box::new(move |base, value| self.apply(base, value))
    }
}

pub struct ModulatedOscillator {
    carrier: Oscillator,
    modulators: Vec<Box<dyn GraphNode>>,
    mod_values: [f32; MAX_MODULATORS],
    amp_mod: Option<ModFn>,
    freq_mod: Option<ModFn>,
    phase_mod: Option<ModFn>,
}

impl ModulatedOscillator {
    /// A carrier with no modulators; it plays unmodulated.
    pub fn new(carrier: Oscillator) -> Self {
        Self {
            carrier,
            modulators: Vec::with_capacity(MAX_MODULATORS),
            mod_values: [0.0; MAX_MODULATORS],
            amp_mod: None,
            freq_mod: None,
            phase_mod: None,
        }
    }

    /// Append a modulator in the next free slot.
    pub fn with_modulator<M: GraphNode + 'static>(mut self, modulator: M) -> Result<Self> {
        if self.modulators.len() >= MAX_MODULATORS {
            return Err(SynthError::TooManyModulators {
                count: self.modulators.len() + 1,
                max: MAX_MODULATORS,
            });
        }
        self.modulators.push(Box::new(modulator));
        Ok(self)
    }

    pub fn with_amp_mod(mut self, f: ModFn) -> Self {
        self.amp_mod = Some(f);
        self
    }

    pub fn with_freq_mod(mut self, f: ModFn) -> Self {
        self.freq_mod = Some(f);
        self
    }

    pub fn with_phase_mod(mut self, f: ModFn) -> Self {
        self.phase_mod = Some(f);
        self
    }

    pub fn carrier(&self) -> &Oscillator {
        &self.carrier
    }

    pub fn carrier_mut(&mut self) -> &mut Oscillator {
        &mut self.carrier
    }

    pub fn modulator_count(&self) -> usize {
        self.modulators.len()
    }

    fn modulate(&mut self) {
        let count = self.modulators.len();
        if count == 0 {
            return;
        }
        let values = &self.mod_values[..count];

        if let Some(f) = &self.amp_mod {
            let amplitude = f(self.carrier.base_amplitude(), values[0]);
            self.carrier.set_amplitude(amplitude);
        }

        if let Some(f) = &self.freq_mod {
            let value = if count == 2 { values[1] } else { values[0] };
            let frequency = f(self.carrier.base_frequency(), value);
            self.carrier.set_frequency(frequency);
        }

        if let Some(f) = &self.phase_mod {
            let value = if count == 3 { values[2] } else { values[count - 1] };
            let phase = f(self.carrier.base_phase(), value);
            self.carrier.set_phase(phase);
        }
    }
}

impl GraphNode for ModulatedOscillator {
    fn next_sample(&mut self) -> f32 {
        for (value, modulator) in self.mod_values.iter_mut().zip(self.modulators.iter_mut()) {
            *value = modulator.next_sample();
        }
        self.modulate();
        self.carrier.next_sample()
    }

    fn note_on(&mut self) {
        self.carrier.arm();
        for modulator in &mut self.modulators {
            modulator.note_on();
        }
    }

    fn note_off(&mut self) {
        for modulator in &mut self.modulators {
            modulator.note_off();
        }
        GraphNode::note_off(&mut self.carrier);
    }

    fn ended(&self) -> Option<bool> {
        all_ended(
            self.modulators
                .iter()
                .map(|m| m.ended())
                .chain(std::iter::once(GraphNode::ended(&self.carrier))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::envelope::Envelope;

    const SAMPLE_RATE: f32 = 22_050.0;

    /// Emits a fixed value every tick.
    struct Constant(f32);

    impl Constant {
        fn new(value: f32) -> Self {
            Self(value)
        }
    }

    impl GraphNode for Constant {
        fn next_sample(&mut self) -> f32 {
            self.0
        }
    }

    fn carrier() -> Oscillator {
        Oscillator::sine(440.0, SAMPLE_RATE).unwrap()
    }

    #[test]
    fn freq_mod_uses_slot_one_with_two_modulators() {
        let mut osc = ModulatedOscillator::new(carrier())
            .with_modulator(Constant::new(0.4))
            .unwrap()
            .with_modulator(Constant::new(0.9))
            .unwrap()
            .with_amp_mod(amp_mod())
            .with_freq_mod(FreqMod::default().into_fn());

        osc.next_sample();

        let expected = FreqMod::default().apply(440.0, 0.9);
        assert!((osc.carrier().frequency() - expected).abs() < 1e-4);
        assert!((osc.carrier().frequency() - FreqMod::default().apply(440.0, 0.4)).abs() > 1.0);
        assert!((osc.carrier().amplitude() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn single_modulator_drives_every_duty() {
        let mut osc = ModulatedOscillator::new(carrier())
            .with_modulator(Constant::new(0.5))
            .unwrap()
            .with_amp_mod(amp_mod())
            .with_freq_mod(FreqMod::default().into_fn())
            .with_phase_mod(Box::new(|base, value| base + value * 180.0));

        osc.next_sample();

        assert!((osc.carrier().amplitude() - 0.5).abs() < 1e-6);
        assert!((osc.carrier().frequency() - FreqMod::default().apply(440.0, 0.5)).abs() < 1e-4);
        assert!((osc.carrier().phase() - 90.0).abs() < 1e-4);
    }

    #[test]
    fn phase_mod_uses_slot_two_with_three_modulators() {
        let mut osc = ModulatedOscillator::new(carrier())
            .with_modulator(Constant::new(0.1))
            .unwrap()
            .with_modulator(Constant::new(0.2))
            .unwrap()
            .with_modulator(Constant::new(0.3))
            .unwrap()
            .with_freq_mod(FreqMod::default().into_fn())
            .with_phase_mod(Box::new(|_, value| value * 100.0));

        osc.next_sample();

        assert!((osc.carrier().phase() - 30.0).abs() < 1e-4);
        // three modulators: frequency falls back to slot 0
        assert!((osc.carrier().frequency() - FreqMod::default().apply(440.0, 0.1)).abs() < 1e-4);
    }

    #[test]
    fn no_modulation_functions_leave_the_carrier_alone() {
        let mut osc = ModulatedOscillator::new(carrier())
            .with_modulator(Constant::new(0.5))
            .unwrap()
            .with_modulator(Constant::new(0.5))
            .unwrap();

        let mut block = vec![0.0; 16];
        osc.render_block(&mut block);
        assert_eq!(osc.carrier().frequency(), 440.0);
        assert_eq!(osc.carrier().amplitude(), 1.0);
        assert_eq!(osc.modulator_count(), 2);
    }

    #[test]
    fn modulation_keeps_the_waveform_continuous() {
        let mut plain = carrier();
        let mut modulated = ModulatedOscillator::new(carrier())
            .with_modulator(Constant::new(0.7))
            .unwrap()
            .with_freq_mod(FreqMod::default().into_fn());

        // at the sustain reference frequency is unchanged, so output matches
        for _ in 0..256 {
            let a = plain.next_sample();
            let b = modulated.next_sample();
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn rejects_a_fourth_modulator() {
        let result = ModulatedOscillator::new(carrier())
            .with_modulator(Constant::new(0.0))
            .and_then(|m| m.with_modulator(Constant::new(0.0)))
            .and_then(|m| m.with_modulator(Constant::new(0.0)))
            .and_then(|m| m.with_modulator(Constant::new(0.0)));
        assert!(matches!(
            result,
            Err(SynthError::TooManyModulators { count: 4, max: 3 })
        ));
    }

    #[test]
    fn release_cascades_and_end_reduces_over_envelopes() {
        let env = Envelope::adsr(1_000.0, 0.0, 0.0, 0.5, 0.005).unwrap();
        let mut osc = ModulatedOscillator::new(carrier())
            .with_modulator(Constant::new(1.0))
            .unwrap()
            .with_modulator(env)
            .unwrap();

        assert_eq!(osc.ended(), Some(false));

        osc.note_off();
        for _ in 0..20 {
            osc.next_sample();
        }
        // Constant has no end state and does not block the reduction
        assert_eq!(osc.ended(), Some(true));

        osc.note_on();
        assert_eq!(osc.ended(), Some(false));
    }

    #[test]
    fn flagless_router_has_no_end_state() {
        let osc = ModulatedOscillator::new(carrier())
            .with_modulator(Constant::new(1.0))
            .unwrap();
        assert_eq!(osc.ended(), None);
    }
}
