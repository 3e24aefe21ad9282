use crate::{io::midi::MidiEvent, synth::message::SynthMessage};

/// Map a MIDI event on `channel_filter` to an engine message.
///
/// Note-on with velocity 0 is a note-off. Note-off does not check the key:
/// the engine has a single voice and any release ends it.
pub fn midi_to_synth(midi: MidiEvent, channel_filter: u8) -> Option<SynthMessage> {
    match midi {
        MidiEvent::NoteOn {
            channel,
            velocity: 0,
            ..
        } if channel == channel_filter => Some(SynthMessage::NoteOff),
        MidiEvent::NoteOn { channel, key, .. } if channel == channel_filter => {
            Some(SynthMessage::NoteOn {
                frequency: midi_note_to_freq(key),
            })
        }
        MidiEvent::NoteOff { channel, .. } if channel == channel_filter => {
            Some(SynthMessage::NoteOff)
        }
        MidiEvent::ControlChange {
            channel,
            controller: 123,
            ..
        } if channel == channel_filter => Some(SynthMessage::AllNotesOff),
        _ => None,
    }
}

pub fn midi_note_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

/// Float sample to 16-bit PCM, clamped to full scale.
#[inline]
pub fn sample_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_is_440() {
        assert!((midi_note_to_freq(69) - 440.0).abs() < 1e-4);
        assert!((midi_note_to_freq(81) - 880.0).abs() < 1e-3);
        assert!((midi_note_to_freq(60) - 261.6256).abs() < 1e-3);
    }

    #[test]
    fn maps_midi_to_messages() {
        let on = MidiEvent::NoteOn { channel: 0, key: 69, velocity: 90 };
        match midi_to_synth(on, 0) {
            Some(SynthMessage::NoteOn { frequency }) => assert!((frequency - 440.0).abs() < 1e-4),
            other => panic!("unexpected {other:?}"),
        }

        let silent_on = MidiEvent::NoteOn { channel: 0, key: 69, velocity: 0 };
        assert_eq!(midi_to_synth(silent_on, 0), Some(SynthMessage::NoteOff));

        let other_channel = MidiEvent::NoteOn { channel: 3, key: 69, velocity: 90 };
        assert_eq!(midi_to_synth(other_channel, 0), None);

        let all_off = MidiEvent::ControlChange { channel: 0, controller: 123, value: 0 };
        assert_eq!(midi_to_synth(all_off, 0), Some(SynthMessage::AllNotesOff));
    }

    #[test]
    fn converts_to_pcm() {
        assert_eq!(sample_to_i16(1.0), 32_767);
        assert_eq!(sample_to_i16(-1.0), -32_767);
        assert_eq!(sample_to_i16(0.0), 0);
        assert_eq!(sample_to_i16(3.0), 32_767);
        assert_eq!(sample_to_i16(0.5), 16_383);
    }
}
