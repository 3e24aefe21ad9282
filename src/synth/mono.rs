#[cfg(feature = "rtrb")]
use rtrb::{Consumer, Producer, RingBuffer};
use tracing::info;
#[cfg(feature = "rtrb")]
use tracing::{debug, warn};

use crate::{
    config::{EngineConfig, SynthConfig},
    dsp::filter::{FilterParams, PostFilter},
    error::{Result, SynthError},
    graph::{mix::MixMode, node::GraphNode},
    synth::{
        factory::{PatchVoices, VoiceFactory},
        message::{MessageReceiver, SynthMessage},
    },
    MAX_BLOCK_SIZE,
};

#[cfg(feature = "rtrb")]
use crate::config::Patch;

/// Capacity of the control → audio message queue.
pub const MESSAGE_QUEUE_SIZE: usize = 64;

/*
Monophonic Engine
=================

The engine is pulled once per output buffer by the audio driver:

  1. drain every queued control message (note on/off, patch and filter
     updates). This is the ONLY point where the voice changes, so a buffer is
     never rendered half by the old note and half by the new one
  2. pull one frame per sample from the voice, or silence when no note is
     active or the voice has ended
  3. run the post filter over each channel of the buffer
  4. keep a copy of the finished buffer for display

Voice lifetime
--------------

One voice is built up front and reused. A note-on retunes and re-arms it in
place, so note-on, note-off, all-notes-off and filter changes never touch
the allocator on the audio thread.

A patch update is the one exception. It builds the next voice straight
away and parks it until the next note-on, where it replaces the sounding
one. Until then the current note keeps its old patch.

Rejected messages
-----------------

Messages that fail validation (a note at 0 Hz, a cutoff above nyquist) are
dropped without touching the engine. They are counted, and the most recent
error is kept for the control side to read; nothing is logged from here.

Buffer layout
-------------

  mono     [s0, s1, s2, ...]
  stereo   [l0, r0, l1, r1, ...]   (interleaved)

Buffers longer than MAX_BLOCK_SIZE frames are rendered in MAX_BLOCK_SIZE
pieces, each filtered on its own. A trailing partial stereo frame is zeroed.
*/

/// Pitch the idle voice is built at before the first note.
const IDLE_FREQUENCY: f32 = 440.0;

pub struct MonoSynth<R, F = PatchVoices>
where
    F: VoiceFactory,
{
    rx: R,
    factory: F,
    voice: Option<F::Voice>,
    /// Built from the latest patch, waiting for the next note-on.
    pending: Option<F::Voice>,
    /// The patch changed but no replacement voice could be built.
    stale: bool,
    active: bool,
    filter: PostFilter,
    engine: EngineConfig,
    left: Vec<f32>,
    right: Vec<f32>,
    last_buffer: Vec<f32>,
    rejected: u64,
    last_rejection: Option<SynthError>,
}

impl<R: MessageReceiver> MonoSynth<R, PatchVoices> {
    /// Engine whose voices are built from the configured patch.
    pub fn new(config: &SynthConfig, rx: R) -> Result<Self> {
        config.validate()?;
        let factory = PatchVoices::new(
            config.patch,
            config.engine.sample_rate,
            config.engine.mix_mode,
        );
        Self::with_factory(config.engine, config.patch.filter, factory, rx)
    }
}

impl<R, F> MonoSynth<R, F>
where
    R: MessageReceiver,
    F: VoiceFactory,
{
    pub fn with_factory(engine: EngineConfig, filter: FilterParams, factory: F, rx: R) -> Result<Self> {
        engine.validate()?;
        let filter = PostFilter::new(filter, engine.sample_rate)?;
        // a factory that cannot build the idle voice builds at the first note
        let voice = factory.create_voice(IDLE_FREQUENCY).ok();

        info!(
            sample_rate = engine.sample_rate,
            buffer_size = engine.buffer_size,
            mix_mode = ?engine.mix_mode,
            preallocated = voice.is_some(),
            "monophonic engine ready"
        );

        Ok(Self {
            rx,
            factory,
            voice,
            pending: None,
            stale: false,
            active: false,
            filter,
            engine,
            left: vec![0.0; MAX_BLOCK_SIZE],
            right: vec![0.0; MAX_BLOCK_SIZE],
            last_buffer: Vec::with_capacity(MAX_BLOCK_SIZE * 2),
            rejected: 0,
            last_rejection: None,
        })
    }

    /// Render one output buffer (interleaved when stereo).
    pub fn render_block(&mut self, out: &mut [f32]) {
        while let Some(msg) = self.rx.pop() {
            if let Err(err) = self.apply(msg) {
                self.rejected += 1;
                self.last_rejection = Some(err);
            }
        }

        let channels = self.engine.channels();
        let whole = out.len() - out.len() % channels;
        let (frames, partial) = out.split_at_mut(whole);
        for chunk in frames.chunks_mut(MAX_BLOCK_SIZE * channels) {
            self.render_chunk(chunk);
        }
        partial.fill(0.0);

        self.last_buffer.clear();
        self.last_buffer.extend_from_slice(out);
    }

    fn apply(&mut self, msg: SynthMessage) -> Result<()> {
        match msg {
            SynthMessage::NoteOn { frequency } => self.start_note(frequency)?,
            SynthMessage::NoteOff => {
                if let (true, Some(voice)) = (self.active, self.voice.as_mut()) {
                    voice.note_off();
                }
            }
            SynthMessage::AllNotesOff => self.active = false,
            SynthMessage::UpdatePatch(patch) => {
                self.factory.update_patch(patch);
                let filtered = self.filter.set_params(patch.filter);
                match self.factory.create_voice(IDLE_FREQUENCY) {
                    Ok(voice) => {
                        self.pending = Some(voice);
                        self.stale = false;
                    }
                    Err(err) => {
                        self.pending = None;
                        self.stale = true;
                        return Err(err);
                    }
                }
                filtered?;
            }
            SynthMessage::SetFilter(params) => self.filter.set_params(params)?,
        }
        Ok(())
    }

    fn start_note(&mut self, frequency: f32) -> Result<()> {
        if let Some(mut fresh) = self.pending.take() {
            if let Err(err) = self.factory.retrigger(&mut fresh, frequency) {
                self.pending = Some(fresh);
                return Err(err);
            }
            self.voice = Some(fresh);
        } else if self.voice.is_some() && !self.stale {
            if let Some(voice) = self.voice.as_mut() {
                self.factory.retrigger(voice, frequency)?;
            }
        } else {
            let mut voice = self.factory.create_voice(frequency)?;
            voice.note_on();
            self.voice = Some(voice);
            self.stale = false;
        }
        self.active = true;
        Ok(())
    }

    fn render_chunk(&mut self, out: &mut [f32]) {
        let mode = self.engine.mix_mode;
        let frames = out.len() / mode.channels();
        let left = &mut self.left[..frames];
        let right = &mut self.right[..frames];

        match &mut self.voice {
            Some(voice) if self.active && voice.ended() != Some(true) => match mode {
                MixMode::Mono => {
                    for l in left.iter_mut() {
                        *l = voice.next_frame().to_mono();
                    }
                }
                MixMode::Stereo => {
                    for (l, r) in left.iter_mut().zip(right.iter_mut()) {
                        (*l, *r) = voice.next_frame().to_stereo();
                    }
                }
            },
            _ => {
                left.fill(0.0);
                right.fill(0.0);
            }
        }

        match mode {
            MixMode::Mono => {
                self.filter.process(left);
                out[..frames].copy_from_slice(left);
            }
            MixMode::Stereo => {
                self.filter.process(left);
                self.filter.process(right);
                for ((frame, &l), &r) in out.chunks_exact_mut(2).zip(left.iter()).zip(right.iter()) {
                    frame[0] = l;
                    frame[1] = r;
                }
            }
        }
    }

    /// True while a note is sounding (including its release).
    pub fn is_playing(&self) -> bool {
        self.voice().is_some_and(|voice| voice.ended() != Some(true))
    }

    /// The voice of the current note; `None` before the first note and after
    /// all-notes-off.
    pub fn voice(&self) -> Option<&F::Voice> {
        self.voice.as_ref().filter(|_| self.active)
    }

    /// How many control messages failed validation and were dropped.
    pub fn rejected_messages(&self) -> u64 {
        self.rejected
    }

    pub fn last_rejection(&self) -> Option<&SynthError> {
        self.last_rejection.as_ref()
    }

    /// The most recently rendered buffer, in output layout.
    pub fn last_buffer(&self) -> &[f32] {
        &self.last_buffer
    }

    pub fn filter(&self) -> &PostFilter {
        &self.filter
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    pub fn receiver_mut(&mut self) -> &mut R {
        &mut self.rx
    }
}

/// Control-thread side of the engine. Validates before anything is queued.
#[cfg(feature = "rtrb")]
pub struct SynthHandle {
    tx: Producer<SynthMessage>,
    sample_rate: f32,
}

#[cfg(feature = "rtrb")]
impl SynthHandle {
    pub fn note_on(&mut self, frequency: f32) -> Result<()> {
        if !(frequency.is_finite() && frequency > 0.0) {
            return Err(SynthError::InvalidFrequency(frequency));
        }
        debug!(frequency, "note on");
        self.push(SynthMessage::NoteOn { frequency })
    }

    pub fn note_off(&mut self) -> Result<()> {
        debug!("note off");
        self.push(SynthMessage::NoteOff)
    }

    pub fn all_notes_off(&mut self) -> Result<()> {
        debug!("all notes off");
        self.push(SynthMessage::AllNotesOff)
    }

    pub fn update_patch(&mut self, patch: Patch) -> Result<()> {
        patch.validate(self.sample_rate)?;
        debug!(?patch, "patch update");
        self.push(SynthMessage::UpdatePatch(patch))
    }

    pub fn set_filter(&mut self, params: FilterParams) -> Result<()> {
        params.validate(self.sample_rate)?;
        debug!(cutoff = params.cutoff, intensity = params.intensity, "filter update");
        self.push(SynthMessage::SetFilter(params))
    }

    /// Forward any message through the matching validated method.
    pub fn send(&mut self, msg: SynthMessage) -> Result<()> {
        match msg {
            SynthMessage::NoteOn { frequency } => self.note_on(frequency),
            SynthMessage::NoteOff => self.note_off(),
            SynthMessage::AllNotesOff => self.all_notes_off(),
            SynthMessage::UpdatePatch(patch) => self.update_patch(patch),
            SynthMessage::SetFilter(params) => self.set_filter(params),
        }
    }

    fn push(&mut self, msg: SynthMessage) -> Result<()> {
        self.tx.push(msg).map_err(|_| {
            warn!(?msg, "message queue full, dropping");
            SynthError::QueueFull
        })
    }
}

/// Build a connected control handle and engine.
#[cfg(feature = "rtrb")]
pub fn channel(config: &SynthConfig) -> Result<(SynthHandle, MonoSynth<Consumer<SynthMessage>>)> {
    let (tx, rx) = RingBuffer::new(MESSAGE_QUEUE_SIZE);
    let synth = MonoSynth::new(config, rx)?;
    let handle = SynthHandle {
        tx,
        sample_rate: config.engine.sample_rate,
    };
    Ok((handle, synth))
}
