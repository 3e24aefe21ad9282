use thiserror::Error;

/// Configuration errors raised at construction time.
///
/// Per-sample rendering never fails; everything that can go wrong is caught
/// when a component is built or a patch is validated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SynthError {
    #[error("invalid waveform `{0}` (expected sine, square, sawtooth or triangle)")]
    InvalidWaveform(String),

    #[error("sample rate must be positive, got {0}")]
    InvalidSampleRate(f32),

    #[error("frequency must be positive and finite, got {0} Hz")]
    InvalidFrequency(f32),

    #[error("sustain level must be within [0, 1], got {0}")]
    InvalidSustain(f32),

    #[error("{stage} duration must be non-negative, got {seconds} s")]
    InvalidDuration { stage: &'static str, seconds: f32 },

    #[error("output range must be ordered, got ({min}, {max})")]
    InvalidRange { min: f32, max: f32 },

    #[error("filter intensity must be within (0, 1], got {0}")]
    InvalidIntensity(f32),

    #[error("filter cutoff {cutoff} Hz must stay below nyquist ({nyquist} Hz)")]
    InvalidCutoff { cutoff: f32, nyquist: f32 },

    #[error("buffer size must be within 1..={max}, got {size}")]
    InvalidBufferSize { size: usize, max: usize },

    #[error("LFO rate must be non-negative, got {0} Hz")]
    InvalidLfoRate(f32),

    #[error("at most {max} modulators can drive one carrier, got {count}")]
    TooManyModulators { count: usize, max: usize },

    #[error("message queue is full")]
    QueueFull,
}

pub type Result<T> = std::result::Result<T, SynthError>;
