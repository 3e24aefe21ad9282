use crate::{
    config::Patch,
    dsp::{envelope::Envelope, oscillator::Oscillator},
    error::Result,
    graph::{
        chain::{Chain, Modifier},
        lfo::lfo,
        mix::{MixMode, Mixer},
        modulate::{amp_mod, ModulatedOscillator},
        node::{Frame, GraphNode},
    },
};

/*
Voice
=====

One note's worth of signal graph. It is built once per patch and
retriggered in place for every note after that:

    LFO ─────┐ (only when lfo_rate > 0)
             ▼
    [Oscillator] → ModulatedOscillator → Chain ─→ Mixer ─→ out
                                           │
                               ModulatedVolume(Envelope)

Without an LFO the router carries no modulators and no modulation
functions, so the carrier plays at its base pitch and level and only the
envelope shapes it. With an LFO, the LFO is the single modulator and drives
both the amplitude (amp_mod) and the frequency (FreqMod) of the carrier.

The mixer holds exactly one chain here; it gives the voice its mono or
stereo shape.
*/

pub type VoiceChain = Chain<ModulatedOscillator>;

pub struct Voice {
    frequency: f32,
    mixer: Mixer<VoiceChain>,
}

impl Voice {
    /// Build and arm a voice playing `frequency` Hz.
    pub fn new(patch: &Patch, frequency: f32, sample_rate: f32, mode: MixMode) -> Result<Self> {
        let carrier = Oscillator::new(patch.waveform, frequency, sample_rate)?;

        let router = if patch.has_lfo() {
            ModulatedOscillator::new(carrier)
                .with_modulator(lfo(patch.lfo_waveform, patch.lfo_rate, sample_rate)?)?
                .with_amp_mod(amp_mod())
                .with_freq_mod(patch.freq_mod.into_fn())
        } else {
            ModulatedOscillator::new(carrier)
        };

        let envelope = Envelope::new(patch.envelope, sample_rate)?;
        let chain = Chain::new(router).amplify(envelope);

        let mut voice = Self {
            frequency,
            mixer: Mixer::new(mode).with_source(chain),
        };
        voice.note_on();
        Ok(voice)
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Restart this voice at a new pitch without rebuilding it.
    ///
    /// The carrier is retuned and every component re-armed. Nothing is
    /// allocated, so this is safe to call from the audio thread. An invalid
    /// frequency leaves the voice untouched.
    pub fn retrigger(&mut self, frequency: f32) -> Result<()> {
        if let Some(chain) = self.mixer.sources_mut().first_mut() {
            chain.generator_mut().carrier_mut().retune(frequency)?;
        }
        self.frequency = frequency;
        self.note_on();
        Ok(())
    }

    fn chain(&self) -> Option<&VoiceChain> {
        self.mixer.sources().first()
    }

    pub fn carrier(&self) -> Option<&Oscillator> {
        self.chain().map(|chain| chain.generator().carrier())
    }

    /// Envelope gain applied on the last tick.
    pub fn gain(&self) -> f32 {
        self.chain()
            .and_then(|chain| {
                chain.modifiers().iter().find_map(|m| match m {
                    Modifier::ModulatedVolume(mv) => Some(mv.gain()),
                    _ => None,
                })
            })
            .unwrap_or(0.0)
    }

    pub fn mode(&self) -> MixMode {
        self.mixer.mode()
    }
}

impl GraphNode for Voice {
    #[inline]
    fn next_sample(&mut self) -> f32 {
        self.mixer.next_sample()
    }

    #[inline]
    fn next_frame(&mut self) -> Frame {
        self.mixer.next_frame()
    }

    fn note_on(&mut self) {
        self.mixer.note_on();
    }

    fn note_off(&mut self) {
        self.mixer.note_off();
    }

    fn ended(&self) -> Option<bool> {
        self.mixer.ended()
    }
}
