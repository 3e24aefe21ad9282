use crate::graph::node::{all_ended, Frame, GraphNode};

/*
Signal Chain
============

A chain wraps a generator with an ordered list of modifiers:

  [Generator] ──→ [Modifier 0] ──→ [Modifier 1] ──→ ... ──→ output

Each tick:
  1. pull one sample (or frame) from the generator
  2. pull one sample from every modifier that is itself a stream, so its
     state advances once per tick no matter where it sits in the list
  3. apply each modifier's transform to the sample, in order

Modifiers
---------

  Volume(gain)           fixed multiplier, no state
  ModulatedVolume(node)  the node's pulled sample this tick becomes the
                         multiplier. An envelope here is the classic
                         envelope-as-volume: carrier × gain(t)
  Map(fn)                any stateless per-sample function

Release and End
---------------

note_on / note_off cascade to the generator and to every stream modifier.
The chain ends when every component with an end state has ended; stateless
modifiers and endless generators don't take part.

Reaching inside
---------------

The generator and the modifiers are reachable through `generator()` /
`generator_mut()` and `modifiers()`. There is no implicit forwarding of their
properties through the chain.
*/

pub type MapFn = Box<dyn Fn(f32) -> f32 + Send>;

/// Multiplier pulled from a stream every tick.
pub struct ModulatedVolume {
    modulator: Box<dyn GraphNode>,
    gain: f32,
}

impl ModulatedVolume {
    pub fn new<M: GraphNode + 'static>(modulator: M) -> Self {
        Self {
            modulator: Box::new(modulator),
            gain: 0.0,
        }
    }

    /// Gain pulled on the most recent tick.
    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn modulator(&self) -> &dyn GraphNode {
        self.modulator.as_ref()
    }
}

pub enum Modifier {
    Volume(f32),
    ModulatedVolume(ModulatedVolume),
    Map(MapFn),
}

impl Modifier {
    pub fn volume(gain: f32) -> Self {
        Modifier::Volume(gain)
    }

    pub fn modulated_volume<M: GraphNode + 'static>(modulator: M) -> Self {
        Modifier::ModulatedVolume(ModulatedVolume::new(modulator))
    }

    pub fn map<F>(f: F) -> Self
    where
        F: Fn(f32) -> f32 + Send + 'static,
    {
        Modifier::Map(Box::new(f))
    }

    #[inline]
    fn advance(&mut self) {
        if let Modifier::ModulatedVolume(mv) = self {
            mv.gain = mv.modulator.next_sample();
        }
    }

    #[inline]
    fn apply(&self, sample: f32) -> f32 {
        match self {
            Modifier::Volume(gain) => sample * gain,
            Modifier::ModulatedVolume(mv) => sample * mv.gain,
            Modifier::Map(f) => f(sample),
        }
    }

    fn note_on(&mut self) {
        if let Modifier::ModulatedVolume(mv) = self {
            mv.modulator.note_on();
        }
    }

    fn note_off(&mut self) {
        if let Modifier::ModulatedVolume(mv) = self {
            mv.modulator.note_off();
        }
    }

    fn ended(&self) -> Option<bool> {
        match self {
            Modifier::ModulatedVolume(mv) => mv.modulator.ended(),
            _ => None,
        }
    }
}

pub struct Chain<G> {
    generator: G,
    modifiers: Vec<Modifier>,
}

impl<G: GraphNode> Chain<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            modifiers: Vec::new(),
        }
    }

    /// Append a modifier after the existing ones.
    pub fn then(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    pub fn with_volume(self, gain: f32) -> Self {
        self.then(Modifier::volume(gain))
    }

    /// Append a stream whose samples scale the chain's output.
    pub fn amplify<M: GraphNode + 'static>(self, modulator: M) -> Self {
        self.then(Modifier::modulated_volume(modulator))
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn generator_mut(&mut self) -> &mut G {
        &mut self.generator
    }

    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    #[inline]
    fn transform(&self, sample: f32) -> f32 {
        self.modifiers.iter().fold(sample, |s, m| m.apply(s))
    }

    #[inline]
    fn advance_modifiers(&mut self) {
        for modifier in &mut self.modifiers {
            modifier.advance();
        }
    }
}

impl<G: GraphNode> GraphNode for Chain<G> {
    fn next_sample(&mut self) -> f32 {
        let sample = self.generator.next_sample();
        self.advance_modifiers();
        self.transform(sample)
    }

    fn next_frame(&mut self) -> Frame {
        let frame = self.generator.next_frame();
        self.advance_modifiers();
        match frame {
            Frame::Mono(s) => Frame::Mono(self.transform(s)),
            Frame::Stereo(l, r) => Frame::Stereo(self.transform(l), self.transform(r)),
        }
    }

    fn note_on(&mut self) {
        self.generator.note_on();
        for modifier in &mut self.modifiers {
            modifier.note_on();
        }
    }

    fn note_off(&mut self) {
        self.generator.note_off();
        for modifier in &mut self.modifiers {
            modifier.note_off();
        }
    }

    fn ended(&self) -> Option<bool> {
        all_ended(
            std::iter::once(self.generator.ended())
                .chain(self.modifiers.iter().map(Modifier::ended)),
        )
    }
}
