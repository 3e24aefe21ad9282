//! Composable building blocks for constructing a voice.
//!
//! Graph nodes wrap the low-level DSP primitives with what a voice needs:
//! per-sample pulling, note events, modulation routing and mixing. The
//! `extensions` module adds fluent helpers so voices can be authored with a
//! chainable API.

/// Generator plus ordered per-sample modifiers.
pub mod chain;
/// Envelope as a pullable stream with an end state.
pub mod envelope;
/// Fluent combinators (`.amplify()`, `.with_volume()`, `.modulated_by()`).
pub mod extensions;
/// Low frequency oscillators for parameter modulation.
pub mod lfo;
/// Mean mixing of independent sources, mono or stereo.
pub mod mix;
/// Route modulator streams into a carrier's amplitude, frequency and phase.
pub mod modulate;
/// Core trait shared by all graph nodes.
pub mod node;
/// Oscillators as graph nodes.
pub mod oscillator;

pub use chain::{Chain, Modifier};
pub use extensions::{CarrierExt, NodeExt};
pub use mix::{MixMode, Mixer};
pub use modulate::{FreqMod, ModulatedOscillator};
pub use node::{Frame, GraphNode};
