use std::collections::VecDeque;

#[cfg(feature = "rtrb")]
use rtrb::Consumer;

use crate::{config::Patch, dsp::filter::FilterParams};

/// Control events sent from the event source to the engine.
///
/// They are applied at the next buffer boundary, never mid-buffer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SynthMessage {
    /// Replace the voice with a fresh one at `frequency` Hz.
    NoteOn { frequency: f32 },
    /// Release the current voice.
    NoteOff,
    AllNotesOff,
    /// Used by the next note-on; the sounding voice is left alone.
    UpdatePatch(Patch),
    SetFilter(FilterParams),
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<SynthMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<SynthMessage> {
    fn pop(&mut self) -> Option<SynthMessage> {
        Consumer::pop(self).ok()
    }
}

/// Single-threaded receiver, for offline rendering and tests.
impl MessageReceiver for VecDeque<SynthMessage> {
    fn pop(&mut self) -> Option<SynthMessage> {
        self.pop_front()
    }
}
