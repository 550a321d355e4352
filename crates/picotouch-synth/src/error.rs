//! Error types for the voice engine.

use alloc::string::String;

/// Errors raised while building patches, loading waveforms, or allocating
/// voices.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SynthError {
    /// Wave data is not mono 16-bit PCM or is too short for one frame.
    #[error("unsupported wave format: {0}")]
    Format(String),

    /// A wave-select string could not be decoded.
    #[error("invalid wave select {input:?}: {reason}")]
    Parse {
        /// The string that failed to decode.
        input: String,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// A static waveform name is not one of the built-in generators.
    #[error("unknown waveform: {0}")]
    UnknownWaveform(String),

    /// A patch failed validation.
    #[error("invalid patch: {0}")]
    InvalidPatch(&'static str),

    /// The audio sink has no room for another oscillator.
    #[error("no free voices")]
    NoFreeVoices,

    /// Reading wave data from its backing store failed.
    #[error("wave I/O error: {0}")]
    Io(String),
}

impl SynthError {
    /// Creates a parse error for `input`.
    pub(crate) fn parse(input: &str, reason: &'static str) -> Self {
        Self::Parse {
            input: String::from(input),
            reason,
        }
    }
}

/// Result alias for voice-engine operations.
pub type Result<T> = core::result::Result<T, SynthError>;
