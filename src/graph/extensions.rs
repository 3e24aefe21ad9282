use crate::{
    dsp::oscillator::Oscillator,
    error::Result,
    graph::{
        chain::{Chain, Modifier},
        mix::{MixMode, Mixer},
        modulate::ModulatedOscillator,
        node::GraphNode,
    },
};

pub trait NodeExt: GraphNode + Sized {
    /// Wrap in a chain with no modifiers yet.
    fn chain(self) -> Chain<Self> {
        Chain::new(self)
    }

    fn then(self, modifier: Modifier) -> Chain<Self> {
        Chain::new(self).then(modifier)
    }

    fn with_volume(self, gain: f32) -> Chain<Self> {
        Chain::new(self).with_volume(gain)
    }

    /// Scale by another stream's output, e.g. an envelope.
    fn amplify<M: GraphNode + 'static>(self, modulator: M) -> Chain<Self> {
        Chain::new(self).amplify(modulator)
    }

    /// Average with another node of the same type.
    fn mix_with(self, other: Self, mode: MixMode) -> Mixer<Self> {
        Mixer::new(mode).with_source(self).with_source(other)
    }
}

impl<T: GraphNode> NodeExt for T {}

pub trait CarrierExt {
    /// Bind this oscillator as the carrier of a modulation router.
    fn modulated_by<M: GraphNode + 'static>(self, modulator: M) -> Result<ModulatedOscillator>;

    fn unmodulated(self) -> ModulatedOscillator;
}

impl CarrierExt for Oscillator {
    fn modulated_by<M: GraphNode + 'static>(self, modulator: M) -> Result<ModulatedOscillator> {
        ModulatedOscillator::new(self).with_modulator(modulator)
    }

    fn unmodulated(self) -> ModulatedOscillator {
        ModulatedOscillator::new(self)
    }
}
