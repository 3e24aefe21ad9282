//! Low-level DSP primitives used by the graph nodes and the engine.
//!
//! Oscillators and envelopes are pulled one sample at a time and never
//! allocate after construction. The post filter runs over whole buffers.

/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// Butterworth low-pass applied to each rendered buffer.
pub mod filter;
/// Dry/wet blending and channel folding.
pub mod mix;
/// Periodic waveforms with a mapped output range.
pub mod oscillator;

pub use envelope::EnvelopeState;
