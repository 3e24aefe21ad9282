// Purpose - external interfaces, format conversions

pub mod converter;
pub mod midi;

pub use converter::{midi_note_to_freq, midi_to_synth, sample_to_i16};
pub use midi::MidiEvent;
