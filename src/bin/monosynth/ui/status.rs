//! Status bar and dial panel.

use monosynth::{graph::mix::MixMode, EngineConfig};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::keyboard::{Controls, Dial};

pub struct AudioStats {
    pub peak: f32,
    pub rms: f32,
}

impl AudioStats {
    pub fn from_buffer(buffer: &[f32]) -> Self {
        if buffer.is_empty() {
            return Self { peak: 0.0, rms: 0.0 };
        }
        let peak = buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        let rms = (buffer.iter().map(|&x| x * x).sum::<f32>() / buffer.len() as f32).sqrt();
        Self { peak, rms }
    }
}

pub fn render_status(
    frame: &mut Frame,
    area: Rect,
    engine: &EngineConfig,
    controls: &Controls,
    stats: &AudioStats,
) {
    let block = Block::default().title(" monosynth ").borders(Borders::ALL);

    let (note, note_color) = match controls.held() {
        Some(key) => (format!("♪ {key}  "), Color::Green),
        None => ("·    ".to_string(), Color::DarkGray),
    };
    let mode = match engine.mix_mode {
        MixMode::Mono => "mono",
        MixMode::Stereo => "stereo",
    };

    let mut spans = vec![
        Span::styled(note, Style::default().fg(note_color)),
        Span::styled(
            format!("Octave {}  ", controls.octave()),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!(
                "{:.1}kHz {} {} frames  ",
                engine.sample_rate / 1000.0,
                mode,
                engine.buffer_size
            ),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("Peak: {:.2}  RMS: {:.2}", stats.peak, stats.rms),
            Style::default().fg(Color::Magenta),
        ),
    ];
    if let Some(err) = controls.last_error() {
        spans.push(Span::styled(format!("  {err}"), Style::default().fg(Color::Red)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

pub fn render_dials(frame: &mut Frame, area: Rect, controls: &Controls) {
    let block = Block::default().title(" Patch ").borders(Borders::ALL);

    let patch = controls.patch();
    let lines: Vec<Line> = Dial::ALL
        .iter()
        .map(|&dial| {
            let selected = dial == controls.selected();
            let style = if selected {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(if selected { "▸ " } else { "  " }, style),
                Span::styled(format!("{:<10}", dial.label()), style),
                Span::styled(dial.value(patch), style),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
