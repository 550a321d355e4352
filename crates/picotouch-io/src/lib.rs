//! WAV file layer for picotouch.
//!
//! This crate provides:
//!
//! - **Wavetables**: [`WavFrameSource`] streams frames from a mono 16-bit
//!   WAV file, and [`DirWavetableLoader`] resolves patch wave-selects to
//!   files under a root directory
//! - **Drum kits**: [`load_kit`] fills kit slots from a directory of
//!   slot-numbered WAV files
//! - **Rendering**: [`write_wav`] saves mixer output
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use picotouch_io::DirWavetableLoader;
//! use picotouch_synth::{Instrument, SoftwareMixer, factory_patches};
//!
//! // Patch wave directories such as "/wav" resolve under ./sd
//! let mut loader = DirWavetableLoader::new("sd");
//! let [wtb_a, _, _] = factory_patches();
//! let mut inst = Instrument::new(SoftwareMixer::new(28000.0), wtb_a, &mut loader)?;
//! inst.note_on(36, 127)?;
//! ```

mod kit;
mod wav;

pub use kit::{assign_slots, list_kits, load_kit, slot_index};
pub use wav::{
    DirWavetableLoader, WavFrameSource, WavInfo, find_wav, read_samples, read_wav_info, write_wav,
};

use picotouch_synth::SynthError;

/// Error types for WAV and kit I/O.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file decoded but is not usable by the engine.
    #[error(transparent)]
    Synth(#[from] SynthError),
}

impl From<Error> for SynthError {
    fn from(err: Error) -> Self {
        match err {
            Error::Synth(e) => e,
            Error::Wav(hound::Error::IoError(e)) | Error::Io(e) => SynthError::Io(e.to_string()),
            Error::Wav(e) => SynthError::Format(e.to_string()),
        }
    }
}

/// Convenience result type for WAV and kit I/O.
pub type Result<T> = std::result::Result<T, Error>;
