//! Computer keyboard as the event source.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use monosynth::{io::midi_note_to_freq, synth::SynthHandle, Patch, SynthError};
use tracing::warn;

/*
Key Layout
==========

One and a half octaves on the home rows, laid out like a piano:

   w e   t y u   o p
  a s d f g h j k l ; '
  C D E F G A B C D E F

  z / x        octave down / up
  space        note off
  tab ↑ ↓      select a dial
  ← →          turn the selected dial
  q / esc      quit

When the terminal reports key releases, letting go of the sounding key
releases the note. Otherwise the note holds until space or the next key.
*/

const PIANO_KEYS: [(char, u8); 18] = [
    ('a', 0),
    ('w', 1),
    ('s', 2),
    ('e', 3),
    ('d', 4),
    ('f', 5),
    ('t', 6),
    ('g', 7),
    ('y', 8),
    ('h', 9),
    ('u', 10),
    ('j', 11),
    ('k', 12),
    ('o', 13),
    ('l', 14),
    ('p', 15),
    (';', 16),
    ('\'', 17),
];

const MIN_OCTAVE: i8 = 0;
const MAX_OCTAVE: i8 = 8;
const MAX_LFO_RATE: f32 = 20.0;
const MAX_STAGE_SECONDS: f32 = 5.0;

fn semitone(key: char) -> Option<u8> {
    PIANO_KEYS
        .iter()
        .find(|(k, _)| *k == key.to_ascii_lowercase())
        .map(|&(_, s)| s)
}

/// A patch parameter the arrow keys can turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dial {
    Waveform,
    LfoWaveform,
    LfoRate,
    Attack,
    Decay,
    Sustain,
    Release,
    Cutoff,
    Intensity,
}

impl Dial {
    pub const ALL: [Dial; 9] = [
        Dial::Waveform,
        Dial::LfoWaveform,
        Dial::LfoRate,
        Dial::Attack,
        Dial::Decay,
        Dial::Sustain,
        Dial::Release,
        Dial::Cutoff,
        Dial::Intensity,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Dial::Waveform => "waveform",
            Dial::LfoWaveform => "lfo wave",
            Dial::LfoRate => "lfo rate",
            Dial::Attack => "attack",
            Dial::Decay => "decay",
            Dial::Sustain => "sustain",
            Dial::Release => "release",
            Dial::Cutoff => "cutoff",
            Dial::Intensity => "intensity",
        }
    }

    pub fn value(self, patch: &Patch) -> String {
        match self {
            Dial::Waveform => patch.waveform.to_string(),
            Dial::LfoWaveform => patch.lfo_waveform.to_string(),
            Dial::LfoRate if patch.lfo_rate == 0.0 => "off".into(),
            Dial::LfoRate => format!("{:.1} Hz", patch.lfo_rate),
            Dial::Attack => format!("{:.2} s", patch.envelope.attack),
            Dial::Decay => format!("{:.2} s", patch.envelope.decay),
            Dial::Sustain => format!("{:.2}", patch.envelope.sustain),
            Dial::Release => format!("{:.2} s", patch.envelope.release),
            Dial::Cutoff if patch.filter.is_off() => "off".into(),
            Dial::Cutoff => format!("{:.0} Hz", patch.filter.cutoff),
            Dial::Intensity => format!("{:.2}", patch.filter.intensity),
        }
    }

    fn is_filter(self) -> bool {
        matches!(self, Dial::Cutoff | Dial::Intensity)
    }

    /// Turn the dial one step; `up` is clockwise.
    fn turn(self, patch: &mut Patch, up: bool, nyquist: f32) {
        let sign = if up { 1.0 } else { -1.0 };
        let env = &mut patch.envelope;
        match self {
            Dial::Waveform => {
                patch.waveform = if up { patch.waveform.next() } else { patch.waveform.previous() };
            }
            Dial::LfoWaveform => {
                patch.lfo_waveform = if up {
                    patch.lfo_waveform.next()
                } else {
                    patch.lfo_waveform.previous()
                };
            }
            Dial::LfoRate => patch.lfo_rate = (patch.lfo_rate + sign * 0.5).clamp(0.0, MAX_LFO_RATE),
            Dial::Attack => env.attack = (env.attack + sign * 0.01).clamp(0.0, MAX_STAGE_SECONDS),
            Dial::Decay => env.decay = (env.decay + sign * 0.05).clamp(0.0, MAX_STAGE_SECONDS),
            Dial::Sustain => env.sustain = (env.sustain + sign * 0.05).clamp(0.0, 1.0),
            Dial::Release => env.release = (env.release + sign * 0.05).clamp(0.0, MAX_STAGE_SECONDS),
            Dial::Cutoff => {
                // geometric steps; below 50 Hz the filter switches off
                let cutoff = patch.filter.cutoff;
                let next = match (cutoff > 0.0, up) {
                    (false, true) => 50.0,
                    (false, false) => 0.0,
                    (true, true) => cutoff * 1.25,
                    (true, false) if cutoff / 1.25 < 50.0 => 0.0,
                    (true, false) => cutoff / 1.25,
                };
                patch.filter.cutoff = next.min(nyquist * 0.95);
            }
            Dial::Intensity => {
                patch.filter.intensity = (patch.filter.intensity + sign * 0.05).clamp(0.05, 1.0);
            }
        }
    }
}

/// Engine handle shared by the keyboard and the MIDI input.
pub type SharedHandle = Arc<Mutex<SynthHandle>>;

/// Lock the shared handle. A panic on another thread cannot leave the
/// queue half written, so a poisoned lock is still usable.
pub fn lock(handle: &SharedHandle) -> MutexGuard<'_, SynthHandle> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

/// What the UI loop should do after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
}

/// Keyboard state: octave, held key, the dial under the cursor and the
/// patch as last sent to the engine.
pub struct Controls {
    handle: SharedHandle,
    patch: Patch,
    nyquist: f32,
    octave: i8,
    held: Option<char>,
    selected: usize,
    last_error: Option<SynthError>,
}

impl Controls {
    pub fn new(handle: SharedHandle, patch: Patch, sample_rate: f32) -> Self {
        Self {
            handle,
            patch,
            nyquist: sample_rate / 2.0,
            octave: 4,
            held: None,
            selected: 0,
            last_error: None,
        }
    }

    pub fn patch(&self) -> &Patch {
        &self.patch
    }

    pub fn octave(&self) -> i8 {
        self.octave
    }

    pub fn held(&self) -> Option<char> {
        self.held
    }

    pub fn selected(&self) -> Dial {
        Dial::ALL[self.selected]
    }

    pub fn last_error(&self) -> Option<&SynthError> {
        self.last_error.as_ref()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.kind == KeyEventKind::Release {
            if let KeyCode::Char(c) = key.code {
                if self.held == Some(c.to_ascii_lowercase()) {
                    self.held = None;
                    self.report(|h| h.note_off());
                }
            }
            return Action::None;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.report(|h| h.all_notes_off());
                return Action::Quit;
            }
            KeyCode::Char(' ') => {
                self.held = None;
                self.report(|h| h.note_off());
            }
            KeyCode::Char('z') => self.octave = (self.octave - 1).max(MIN_OCTAVE),
            KeyCode::Char('x') => self.octave = (self.octave + 1).min(MAX_OCTAVE),
            KeyCode::Char(c) => {
                // auto-repeat re-sends the held key; only a new key retriggers
                if key.kind == KeyEventKind::Repeat || self.held == Some(c.to_ascii_lowercase()) {
                    return Action::None;
                }
                if let Some(note) = self.note_for(c) {
                    self.held = Some(c.to_ascii_lowercase());
                    let frequency = midi_note_to_freq(note);
                    self.report(|h| h.note_on(frequency));
                }
            }
            KeyCode::Tab | KeyCode::Down => self.selected = (self.selected + 1) % Dial::ALL.len(),
            KeyCode::BackTab | KeyCode::Up => {
                self.selected = (self.selected + Dial::ALL.len() - 1) % Dial::ALL.len();
            }
            KeyCode::Right => self.turn(true),
            KeyCode::Left => self.turn(false),
            _ => {}
        }
        Action::None
    }

    fn note_for(&self, key: char) -> Option<u8> {
        let semitone = semitone(key)? as i16;
        let note = (self.octave as i16 + 1) * 12 + semitone;
        u8::try_from(note).ok()
    }

    fn turn(&mut self, up: bool) {
        let dial = self.selected();
        let mut patch = self.patch;
        dial.turn(&mut patch, up, self.nyquist);
        if patch == self.patch {
            return;
        }

        let sent = if dial.is_filter() {
            lock(&self.handle).set_filter(patch.filter)
        } else {
            lock(&self.handle).update_patch(patch)
        };
        match sent {
            Ok(()) => {
                self.patch = patch;
                self.last_error = None;
            }
            Err(err) => self.fail(err),
        }
    }

    fn report(&mut self, send: impl FnOnce(&mut SynthHandle) -> Result<(), SynthError>) {
        let sent = send(&mut *lock(&self.handle));
        match sent {
            Ok(()) => self.last_error = None,
            Err(err) => self.fail(err),
        }
    }

    fn fail(&mut self, err: SynthError) {
        warn!(%err, "control message rejected");
        self.last_error = Some(err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use monosynth::{
        dsp::{filter::FilterParams, oscillator::Waveform},
        synth::{channel, MonoSynth, SynthMessage},
        SynthConfig,
    };
    use rtrb::Consumer;

    fn controls() -> (Controls, MonoSynth<Consumer<SynthMessage>>) {
        let config = SynthConfig::default();
        let (handle, synth) = channel(&config).unwrap();
        let shared = Arc::new(Mutex::new(handle));
        (Controls::new(shared, config.patch, config.engine.sample_rate), synth)
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn release(code: KeyCode) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Release)
    }

    fn pump(synth: &mut MonoSynth<Consumer<SynthMessage>>) {
        let mut out = vec![0.0; 256];
        synth.render_block(&mut out);
    }

    #[test]
    fn piano_keys_follow_the_octave() {
        let (mut controls, _synth) = controls();
        assert_eq!(controls.note_for('a'), Some(60));
        assert_eq!(controls.note_for('k'), Some(72));
        assert_eq!(controls.note_for('\''), Some(77));
        assert_eq!(controls.note_for('m'), None);

        controls.handle_key(press(KeyCode::Char('z')));
        assert_eq!(controls.note_for('a'), Some(48));
        for _ in 0..20 {
            controls.handle_key(press(KeyCode::Char('x')));
        }
        assert_eq!(controls.octave(), MAX_OCTAVE);
        assert_eq!(controls.note_for('a'), Some(108));
    }

    #[test]
    fn key_release_ends_the_held_note() {
        let (mut controls, mut synth) = controls();
        controls.handle_key(press(KeyCode::Char('a')));
        pump(&mut synth);
        assert_eq!(synth.voice().map(|v| v.frequency()), Some(midi_note_to_freq(60)));
        assert_eq!(controls.held(), Some('a'));

        // releasing some other key leaves the note alone
        controls.handle_key(release(KeyCode::Char('s')));
        assert_eq!(controls.held(), Some('a'));

        controls.handle_key(release(KeyCode::Char('a')));
        assert_eq!(controls.held(), None);
    }

    #[test]
    fn dials_send_patch_and_filter_updates() {
        let (mut controls, mut synth) = controls();
        assert_eq!(controls.selected(), Dial::Waveform);
        controls.handle_key(press(KeyCode::Right));
        assert_eq!(controls.patch().waveform, Waveform::Square);

        controls.handle_key(press(KeyCode::Up));
        assert_eq!(controls.selected(), Dial::Intensity);
        controls.handle_key(press(KeyCode::Up));
        assert_eq!(controls.selected(), Dial::Cutoff);
        controls.handle_key(press(KeyCode::Right));
        assert_eq!(controls.patch().filter, FilterParams::new(50.0, 1.0));

        pump(&mut synth);
        assert_eq!(synth.filter().params(), FilterParams::new(50.0, 1.0));
        assert_eq!(synth.factory().patch().waveform, Waveform::Square);
    }

    #[test]
    fn dials_stop_at_their_limits() {
        let (mut controls, _synth) = controls();
        while controls.selected() != Dial::Sustain {
            controls.handle_key(press(KeyCode::Tab));
        }
        for _ in 0..40 {
            controls.handle_key(press(KeyCode::Right));
        }
        assert_eq!(controls.patch().envelope.sustain, 1.0);
        assert!(controls.last_error().is_none());
    }

    #[test]
    fn quit_silences_the_engine() {
        let (mut controls, mut synth) = controls();
        controls.handle_key(press(KeyCode::Char('a')));
        pump(&mut synth);
        assert_eq!(controls.handle_key(press(KeyCode::Esc)), Action::Quit);
        pump(&mut synth);
        assert!(synth.voice().is_none());
    }
}
