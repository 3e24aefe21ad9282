//! TUI module for monosynth
//!
//! Scope, spectrum and envelope views of the engine plus the dial panel.

mod envelope;
mod spectrum;
mod status;
mod waveform;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event};
use monosynth::EngineConfig;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::Consumer;
use std::time::Duration;

use super::keyboard::{Action, Controls};
use envelope::{render_envelope, EnvelopeView};
use spectrum::{render_spectrum, SpectrumAnalyzer};
use status::{render_dials, render_status, AudioStats};
use waveform::render_waveform;

/// Audio visualization buffer size
const VIS_BUFFER_SIZE: usize = 1024;

const HELP: &str =
    " [a..'] Play  [Z/X] Octave  [Space] Note off  [Tab/↑↓] Dial  [←→] Turn  [Q] Quit";

pub struct UiApp {
    /// Mono samples from the audio callback
    scope_rx: Consumer<f32>,
    controls: Controls,
    engine: EngineConfig,
    audio_buffer: Vec<f32>,
    spectrum: SpectrumAnalyzer,
    envelope: EnvelopeView,
    should_quit: bool,
}

impl UiApp {
    pub fn new(scope_rx: Consumer<f32>, controls: Controls, engine: EngineConfig) -> Self {
        Self {
            scope_rx,
            controls,
            engine,
            audio_buffer: vec![0.0; VIS_BUFFER_SIZE],
            spectrum: SpectrumAnalyzer::new(VIS_BUFFER_SIZE, engine.sample_rate),
            envelope: EnvelopeView::new(),
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_audio();
            self.envelope.update(&self.controls.patch().envelope);

            terminal.draw(|frame| self.render(frame))?;

            // non-blocking, ~60fps
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if self.controls.handle_key(key) == Action::Quit {
                        self.should_quit = true;
                    }
                }
            }
        }

        Ok(())
    }

    /// Keep the last VIS_BUFFER_SIZE samples from the audio thread
    fn poll_audio(&mut self) {
        let mut fresh = false;
        while let Ok(sample) = self.scope_rx.pop() {
            self.audio_buffer.push(sample);
            fresh = true;
        }

        if fresh {
            if self.audio_buffer.len() > VIS_BUFFER_SIZE {
                let excess = self.audio_buffer.len() - VIS_BUFFER_SIZE;
                self.audio_buffer.drain(0..excess);
            }
            self.spectrum.update(&self.audio_buffer);
        }
    }

    fn render(&self, frame: &mut Frame) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Status bar
                Constraint::Min(8),    // Scope + spectrum
                Constraint::Length(13), // Dials + envelope
                Constraint::Length(1), // Help bar
            ])
            .split(frame.area());

        let stats = AudioStats::from_buffer(&self.audio_buffer);
        render_status(frame, rows[0], &self.engine, &self.controls, &stats);

        let views = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);
        render_waveform(frame, views[0], &self.audio_buffer);
        render_spectrum(frame, views[1], &self.spectrum);

        let patch_row = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(32), Constraint::Min(20)])
            .split(rows[2]);
        render_dials(frame, patch_row[0], &self.controls);
        render_envelope(frame, patch_row[1], &self.envelope);

        let help = Paragraph::new(HELP).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, rows[3]);
    }
}
