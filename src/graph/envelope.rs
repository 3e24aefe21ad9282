use crate::{dsp::envelope::Envelope, graph::node::GraphNode};

// An envelope pulled as a stream yields its gain. Used as a modulator it feeds
// amplitude/frequency modulation; wrapped in a `ModulatedVolume` it shapes the
// chain's level. Either way it is the component that reports release and end.
impl GraphNode for Envelope {
    #[inline]
    fn next_sample(&mut self) -> f32 {
        Envelope::next_sample(self)
    }

    fn render_block(&mut self, out: &mut [f32]) {
        self.render(out);
    }

    fn note_on(&mut self) {
        Envelope::note_on(self);
    }

    fn note_off(&mut self) {
        Envelope::note_off(self);
    }

    fn ended(&self) -> Option<bool> {
        Some(self.is_ended())
    }
}
