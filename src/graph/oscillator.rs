use crate::dsp::oscillator::Oscillator;
use crate::graph::node::GraphNode;

/*
Audio Oscillator
================

The oscillator is the sound source of a voice: a repeating waveform at the
note's pitch. Its character comes from the harmonics it carries.

Sine:     fundamental only. Smooth, hollow, flute-like.
Square:   odd harmonics at 1/n. Hollow, woody, clarinet-like.
Sawtooth: all harmonics at 1/n. Bright, buzzy, brassy.
Triangle: odd harmonics at 1/n². Soft, between sine and square.

As a graph node the oscillator has no release stage and never ends, so it
keeps the default `note_off` and `ended`; note-on arms it.

Example usage:
  let osc = Oscillator::sawtooth(220.0, 22_050.0)?;
  let voice = osc.amplify(Envelope::adsr(22_050.0, 0.05, 0.2, 0.7, 0.3)?);
*/

impl GraphNode for Oscillator {
    #[inline]
    fn next_sample(&mut self) -> f32 {
        Oscillator::next_sample(self)
    }

    fn render_block(&mut self, out: &mut [f32]) {
        self.render(out);
    }

    fn note_on(&mut self) {
        self.arm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::Frame;
    use std::f32::consts::TAU;

    #[test]
    fn valid_sine() {
        let sample_rate = 48_000.0;
        let mut synth = Oscillator::sine(440.0, sample_rate).unwrap();

        let mut buffer = vec![0.0f32; 128];
        synth.render_block(&mut buffer);

        // sample n should be sin(2pi f n / sr)
        let sample_index = 12;
        let expected = (TAU * 440.0 * sample_index as f32 / sample_rate).sin();
        let actual = buffer[sample_index];
        assert!(
            (actual - expected).abs() < 1e-5,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn note_on_rewinds() {
        let mut osc = Oscillator::square(1_000.0, 48_000.0).unwrap();
        let mut first = vec![0.0; 64];
        osc.render_block(&mut first);

        GraphNode::note_on(&mut osc);
        let mut second = vec![0.0; 64];
        osc.render_block(&mut second);

        assert_eq!(first, second);
    }

    #[test]
    fn never_ends_and_is_mono() {
        let mut osc = Oscillator::triangle(110.0, 48_000.0).unwrap();
        GraphNode::note_off(&mut osc);
        assert_eq!(GraphNode::ended(&osc), None);
        assert!(matches!(osc.next_frame(), Frame::Mono(_)));
    }
}
