use crate::{
    config::Patch,
    error::Result,
    graph::{mix::MixMode, node::GraphNode},
    synth::voice::Voice,
};

/// Builds the voice for each note-on.
///
/// This is the "instrument design" layer: the sound is configured once and
/// `MonoSynth` asks the factory for a fresh voice at every new pitch.
pub trait VoiceFactory: Send {
    type Voice: GraphNode;

    fn create_voice(&self, frequency: f32) -> Result<Self::Voice>;

    /// Restart an existing voice at `frequency`.
    ///
    /// The default rebuilds it through `create_voice`. Factories whose voices
    /// can be retuned in place override this to stay allocation-free.
    fn retrigger(&self, voice: &mut Self::Voice, frequency: f32) -> Result<()> {
        let mut fresh = self.create_voice(frequency)?;
        fresh.note_on();
        *voice = fresh;
        Ok(())
    }

    /// Apply a new patch to voices created from now on.
    fn update_patch(&mut self, _patch: Patch) {}
}

impl<F, T> VoiceFactory for F
where
    F: Fn(f32) -> Result<T> + Send,
    T: GraphNode,
{
    type Voice = T;

    fn create_voice(&self, frequency: f32) -> Result<Self::Voice> {
        self(frequency)
    }
}

/// Voices built from a [`Patch`].
#[derive(Debug, Clone)]
pub struct PatchVoices {
    patch: Patch,
    sample_rate: f32,
    mode: MixMode,
}

impl PatchVoices {
    pub fn new(patch: Patch, sample_rate: f32, mode: MixMode) -> Self {
        Self {
            patch,
            sample_rate,
            mode,
        }
    }

    pub fn patch(&self) -> &Patch {
        &self.patch
    }
}

impl VoiceFactory for PatchVoices {
    type Voice = Voice;

    fn create_voice(&self, frequency: f32) -> Result<Voice> {
        Voice::new(&self.patch, frequency, self.sample_rate, self.mode)
    }

    fn retrigger(&self, voice: &mut Voice, frequency: f32) -> Result<()> {
        voice.retrigger(frequency)
    }

    fn update_patch(&mut self, patch: Patch) {
        self.patch = patch;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::oscillator::{Oscillator, Waveform};

    #[test]
    fn patch_updates_apply_to_the_next_voice() {
        let mut factory = PatchVoices::new(Patch::default(), 22_050.0, MixMode::Mono);
        let first = factory.create_voice(440.0).unwrap();
        assert_eq!(first.carrier().unwrap().waveform(), Waveform::Sine);

        factory.update_patch(Patch {
            waveform: Waveform::Square,
            ..Patch::default()
        });
        let second = factory.create_voice(440.0).unwrap();
        assert_eq!(second.carrier().unwrap().waveform(), Waveform::Square);
        assert_eq!(first.carrier().unwrap().waveform(), Waveform::Sine);
    }

    #[test]
    fn closures_are_factories() {
        let factory = |frequency: f32| Oscillator::triangle(frequency, 22_050.0);
        let osc = factory.create_voice(110.0).unwrap();
        assert_eq!(osc.frequency(), 110.0);
        assert!(factory.create_voice(-1.0).is_err());

        let mut voice = factory.create_voice(110.0).unwrap();
        factory.retrigger(&mut voice, 220.0).unwrap();
        assert_eq!(voice.frequency(), 220.0);
        assert!(factory.retrigger(&mut voice, 0.0).is_err());
        assert_eq!(voice.frequency(), 220.0);
    }

    #[test]
    fn patch_voices_retune_in_place() {
        let factory = PatchVoices::new(Patch::default(), 22_050.0, MixMode::Mono);
        let mut voice = factory.create_voice(440.0).unwrap();
        factory.retrigger(&mut voice, 660.0).unwrap();
        assert_eq!(voice.frequency(), 660.0);
        assert_eq!(voice.carrier().unwrap().frequency(), 660.0);
    }
}
