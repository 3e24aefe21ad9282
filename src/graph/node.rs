use crate::dsp::mix::fold_to_mono;

/// One tick of output: a single sample or a stereo pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Frame {
    Mono(f32),
    Stereo(f32, f32),
}

impl Frame {
    pub const SILENCE: Frame = Frame::Mono(0.0);

    /// Average the two channels of a stereo pair.
    #[inline]
    pub fn to_mono(self) -> f32 {
        match self {
            Frame::Mono(s) => s,
            Frame::Stereo(l, r) => fold_to_mono(l, r),
        }
    }

    /// Duplicate a mono sample to both channels.
    #[inline]
    pub fn to_stereo(self) -> (f32, f32) {
        match self {
            Frame::Mono(s) => (s, s),
            Frame::Stereo(l, r) => (l, r),
        }
    }
}

/// Core trait for per-sample signal nodes.
///
/// A node is pulled once per tick. Note hooks cascade through composite
/// nodes; nodes without a release stage or an end state keep the defaults,
/// which is how they opt out of release propagation and of the `ended`
/// reduction.
pub trait GraphNode: Send {
    /// Advance one tick and return a mono sample.
    fn next_sample(&mut self) -> f32;

    /// Advance one tick, keeping stereo output if the node has any.
    ///
    /// Call either this or `next_sample` per tick, never both.
    fn next_frame(&mut self) -> Frame {
        Frame::Mono(self.next_sample())
    }

    fn render_block(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = self.next_sample();
        }
    }

    /// Arm for a new note: rewind oscillators, restart envelopes.
    fn note_on(&mut self) {}

    /// Start the release stage.
    fn note_off(&mut self) {}

    /// `None` when the node has no notion of ending.
    fn ended(&self) -> Option<bool> {
        None
    }
}

/// Allow boxed graph nodes to be used as graph nodes (for dynamic dispatch)
impl GraphNode for Box<dyn GraphNode> {
    fn next_sample(&mut self) -> f32 {
        (**self).next_sample()
    }

    fn next_frame(&mut self) -> Frame {
        (**self).next_frame()
    }

    fn render_block(&mut self, out: &mut [f32]) {
        (**self).render_block(out)
    }

    fn note_on(&mut self) {
        (**self).note_on()
    }

    fn note_off(&mut self) {
        (**self).note_off()
    }

    fn ended(&self) -> Option<bool> {
        (**self).ended()
    }
}

/// AND-reduce the end flags of a set of components.
///
/// Components reporting `None` are skipped rather than counted as false. A set
/// where no component has an end state has none either.
pub fn all_ended<I>(flags: I) -> Option<bool>
where
    I: IntoIterator<Item = Option<bool>>,
{
    flags
        .into_iter()
        .flatten()
        .fold(None, |acc, ended| Some(acc.unwrap_or(true) && ended))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_fold_and_spread() {
        assert_eq!(Frame::Stereo(0.25, 0.75).to_mono(), 0.5);
        assert_eq!(Frame::Mono(0.3).to_stereo(), (0.3, 0.3));
        assert_eq!(Frame::Stereo(0.1, 0.2).to_stereo(), (0.1, 0.2));
    }

    #[test]
    fn flagless_components_are_skipped() {
        assert_eq!(all_ended([None, Some(true)]), Some(true));
        assert_eq!(all_ended([None, Some(false), Some(true)]), Some(false));
        assert_eq!(all_ended([Some(true), Some(false)]), Some(false));
        assert_eq!(all_ended([None, None]), None);
        assert_eq!(all_ended(std::iter::empty()), None);
    }
}
