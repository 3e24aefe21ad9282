#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::mix::mean,
    graph::node::{all_ended, Frame, GraphNode},
};

/*
Voice Mixer
===========

Pulls one frame from each of N independent sources per tick and combines
them into one output frame.

1. Normalize every source frame to the engine's channel shape:

     mode     source yields    becomes
     ------   -------------    ---------------------------
     Mono     Stereo(l, r)     Mono((l + r) / 2)
     Stereo   Mono(s)          Stereo(s, s)

2. Take the arithmetic MEAN across sources, per channel.

The mean keeps the output level independent of how many sources are
playing: three sources at a constant 0.3 give 0.3, not 0.9.

    Sum:   [0.3] + [0.3] + [0.3]        = 0.9   (grows with voice count)
    Mean: ([0.3] + [0.3] + [0.3]) / 3   = 0.3   (doesn't)

An empty mixer is silent.

The per-channel scratch buffers are sized when a source is added, so a tick
never allocates.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MixMode {
    #[default]
    Mono,
    Stereo,
}

impl MixMode {
    pub fn channels(self) -> usize {
        match self {
            MixMode::Mono => 1,
            MixMode::Stereo => 2,
        }
    }
}

pub struct Mixer<N = Box<dyn GraphNode>> {
    sources: Vec<N>,
    mode: MixMode,
    left: Vec<f32>,
    right: Vec<f32>,
}

impl<N: GraphNode> Mixer<N> {
    pub fn new(mode: MixMode) -> Self {
        Self {
            sources: Vec::new(),
            mode,
            left: Vec::new(),
            right: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: N) -> Self {
        self.push(source);
        self
    }

    pub fn push(&mut self, source: N) {
        self.sources.push(source);
        self.left.resize(self.sources.len(), 0.0);
        self.right.resize(self.sources.len(), 0.0);
    }

    pub fn sources(&self) -> &[N] {
        &self.sources
    }

    pub fn sources_mut(&mut self) -> &mut [N] {
        &mut self.sources
    }

    pub fn mode(&self) -> MixMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: MixMode) {
        self.mode = mode;
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl<N: GraphNode> GraphNode for Mixer<N> {
    fn next_sample(&mut self) -> f32 {
        self.next_frame().to_mono()
    }

    fn next_frame(&mut self) -> Frame {
        match self.mode {
            MixMode::Mono => {
                for (slot, source) in self.left.iter_mut().zip(self.sources.iter_mut()) {
                    *slot = source.next_frame().to_mono();
                }
                Frame::Mono(mean(&self.left))
            }
            MixMode::Stereo => {
                for ((l, r), source) in self
                    .left
                    .iter_mut()
                    .zip(self.right.iter_mut())
                    .zip(self.sources.iter_mut())
                {
                    (*l, *r) = source.next_frame().to_stereo();
                }
                Frame::Stereo(mean(&self.left), mean(&self.right))
            }
        }
    }

    fn note_on(&mut self) {
        for source in &mut self.sources {
            source.note_on();
        }
    }

    fn note_off(&mut self) {
        for source in &mut self.sources {
            source.note_off();
        }
    }

    fn ended(&self) -> Option<bool> {
        all_ended(self.sources.iter().map(|s| s.ended()))
    }
}
