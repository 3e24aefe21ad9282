//! Envelope shape of the current patch.

use monosynth::dsp::envelope::{Envelope, EnvelopeParams};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

/// Points per second of the drawn trace.
const TRACE_RATE: f32 = 200.0;
/// Seconds held at sustain between decay and release.
const HOLD: f32 = 0.2;

/// Cached trace, rebuilt only when the parameters change.
pub struct EnvelopeView {
    params: Option<EnvelopeParams>,
    /// (seconds, gain)
    points: Vec<(f64, f64)>,
}

impl EnvelopeView {
    pub fn new() -> Self {
        Self {
            params: None,
            points: Vec::new(),
        }
    }

    pub fn update(&mut self, params: &EnvelopeParams) {
        if self.params.as_ref() == Some(params) {
            return;
        }
        self.params = Some(*params);
        self.points = Envelope::new(*params, TRACE_RATE)
            .map(|env| env.shape(HOLD))
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, gain)| (i as f64 / TRACE_RATE as f64, gain as f64))
            .collect();
    }

    fn duration(&self) -> f64 {
        self.points.last().map_or(0.0, |&(t, _)| t).max(0.1)
    }
}

pub fn render_envelope(frame: &mut Frame, area: Rect, view: &EnvelopeView) {
    let block = Block::default().title(" Envelope ").borders(Borders::ALL);

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Yellow))
        .data(&view.points);

    let duration = view.duration();
    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([0.0, duration])
                .labels(["0 s".to_string(), format!("{duration:.2} s")])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, 1.0])
                .labels(["0", "1"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
