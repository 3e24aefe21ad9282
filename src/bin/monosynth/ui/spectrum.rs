//! Spectrum analyzer widget
//!
//! FFT of the scope buffer, sampled at log-spaced frequencies from 20 Hz to
//! nyquist and drawn against log frequency.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Number of frequency bins to display
const SPECTRUM_BINS: usize = 64;
const MIN_FREQ: f64 = 20.0;
const FLOOR_DB: f64 = -100.0;

pub struct SpectrumAnalyzer {
    /// Hann window coefficients
    window: Vec<f32>,
    /// FFT bin index for each displayed point
    bin_indices: Vec<usize>,
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    /// (log10 frequency, magnitude dB)
    spectrum: Vec<(f64, f64)>,
    max_freq: f64,
}

impl SpectrumAnalyzer {
    /// `buffer_len` is the FFT size; `update` ignores buffers of other sizes.
    pub fn new(buffer_len: usize, sample_rate: f32) -> Self {
        let fft = FftPlanner::new().plan_fft_forward(buffer_len);

        let denom = buffer_len.saturating_sub(1).max(1) as f32;
        let window = (0..buffer_len)
            .map(|i| 0.5 * (1.0 - (std::f32::consts::TAU * i as f32 / denom).cos()))
            .collect();

        let max_freq = (sample_rate as f64 / 2.0).max(MIN_FREQ * 2.0);
        let ratio = max_freq / MIN_FREQ;
        let last_bin = (buffer_len / 2).saturating_sub(1);

        let mut bin_indices = Vec::with_capacity(SPECTRUM_BINS);
        let mut spectrum = Vec::with_capacity(SPECTRUM_BINS);
        for i in 0..SPECTRUM_BINS {
            let t = i as f64 / (SPECTRUM_BINS - 1) as f64;
            let freq = MIN_FREQ * ratio.powf(t);
            let index = (freq * buffer_len as f64 / sample_rate as f64).round() as usize;
            bin_indices.push(index.min(last_bin));
            spectrum.push((freq.log10(), FLOOR_DB));
        }

        Self {
            window,
            bin_indices,
            fft,
            scratch: vec![Complex::new(0.0, 0.0); buffer_len],
            spectrum,
            max_freq,
        }
    }

    pub fn update(&mut self, buffer: &[f32]) {
        if buffer.len() != self.window.len() {
            return;
        }

        for ((slot, &sample), &w) in self.scratch.iter_mut().zip(buffer).zip(&self.window) {
            *slot = Complex::new(sample * w, 0.0);
        }
        self.fft.process(&mut self.scratch);

        // normalize so a full-scale sine reads near 0 dB
        let scale = 2.0 / self.window.iter().sum::<f32>().max(1.0);
        for (point, &index) in self.spectrum.iter_mut().zip(&self.bin_indices) {
            let magnitude = (self.scratch[index].norm() * scale).max(1e-6) as f64;
            point.1 = (20.0 * magnitude.log10()).max(FLOOR_DB);
        }
    }

    pub fn data(&self) -> &[(f64, f64)] {
        &self.spectrum
    }

    fn log_bounds(&self) -> [f64; 2] {
        [MIN_FREQ.log10(), self.max_freq.log10()]
    }
}

pub fn render_spectrum(frame: &mut Frame, area: Rect, analyzer: &SpectrumAnalyzer) {
    let block = Block::default().title(" Spectrum ").borders(Borders::ALL);

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(analyzer.data());

    let top = format!("{:.0}k", analyzer.max_freq / 1000.0);
    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds(analyzer.log_bounds())
                .labels(["20".to_string(), "1k".to_string(), top])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([FLOOR_DB, 0.0])
                .labels(["-100", "-50", "0"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
