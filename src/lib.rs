pub mod config;
pub mod dsp; // Oscillator, envelope and filter primitives
pub mod error;
pub mod graph; // Per-sample signal graph: routing, chains, mixing
pub mod io;
pub mod synth; // Voice construction and the monophonic engine

pub use config::{EngineConfig, Patch, SynthConfig};
pub use error::SynthError;

/// Largest buffer the engine will render in one pull.
pub const MAX_BLOCK_SIZE: usize = 2048;
