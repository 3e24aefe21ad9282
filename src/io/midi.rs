/// Channel voice messages the engine understands. Channels are 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    PitchBend { channel: u8, value: i16 },
    ProgramChange { channel: u8, program: u8 },
}

impl MidiEvent {
    /// Decode one raw MIDI message. Running status, system and unknown
    /// messages yield `None`.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let (&status, data) = bytes.split_first()?;
        let channel = status & 0x0f;
        let data_byte = |i: usize| data.get(i).copied().filter(|b| b & 0x80 == 0);

        match status & 0xf0 {
            0x80 => Some(MidiEvent::NoteOff {
                channel,
                key: data_byte(0)?,
                velocity: data_byte(1)?,
            }),
            0x90 => Some(MidiEvent::NoteOn {
                channel,
                key: data_byte(0)?,
                velocity: data_byte(1)?,
            }),
            0xb0 => Some(MidiEvent::ControlChange {
                channel,
                controller: data_byte(0)?,
                value: data_byte(1)?,
            }),
            0xc0 => Some(MidiEvent::ProgramChange {
                channel,
                program: data_byte(0)?,
            }),
            0xe0 => {
                let lsb = data_byte(0)? as i16;
                let msb = data_byte(1)? as i16;
                Some(MidiEvent::PitchBend {
                    channel,
                    value: ((msb << 7) | lsb) - 8192,
                })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_note_messages() {
        assert_eq!(
            MidiEvent::parse(&[0x92, 60, 100]),
            Some(MidiEvent::NoteOn { channel: 2, key: 60, velocity: 100 })
        );
        assert_eq!(
            MidiEvent::parse(&[0x80, 60, 0]),
            Some(MidiEvent::NoteOff { channel: 0, key: 60, velocity: 0 })
        );
    }

    #[test]
    fn pitch_bend_is_centred() {
        assert_eq!(
            MidiEvent::parse(&[0xe0, 0x00, 0x40]),
            Some(MidiEvent::PitchBend { channel: 0, value: 0 })
        );
        assert_eq!(
            MidiEvent::parse(&[0xe0, 0x7f, 0x7f]),
            Some(MidiEvent::PitchBend { channel: 0, value: 8191 })
        );
    }

    #[test]
    fn rejects_truncated_and_unknown_messages() {
        assert_eq!(MidiEvent::parse(&[]), None);
        assert_eq!(MidiEvent::parse(&[0x90, 60]), None);
        assert_eq!(MidiEvent::parse(&[0x90, 0x80, 10]), None);
        assert_eq!(MidiEvent::parse(&[0xf8]), None);
    }
}
