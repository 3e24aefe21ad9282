//! Oscilloscope of the most recent output.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

/// Render the scope, trimmed to start on a rising zero crossing so a steady
/// tone stands still between frames.
pub fn render_waveform(frame: &mut Frame, area: Rect, audio_buffer: &[f32]) {
    let block = Block::default().title(" Scope ").borders(Borders::ALL);

    let start = audio_buffer
        .windows(2)
        .take(audio_buffer.len() / 2)
        .position(|w| w[0] <= 0.0 && w[1] > 0.0)
        .unwrap_or(0);
    let visible = &audio_buffer[start..];

    let data: Vec<(f64, f64)> = visible
        .iter()
        .enumerate()
        .map(|(i, &sample)| (i as f64 / visible.len() as f64, sample as f64))
        .collect();

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([0.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([-1.0, 1.0])
                .labels(["-1", "0", "1"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
