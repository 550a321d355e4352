//! Picotouch Synth - Voice engine for the picotouch touch synthesizer
//!
//! This crate turns notes into sound parameters: it owns the patch model,
//! wavetable scanning, per-voice envelopes and filter sweeps, and the note
//! lifecycle. Audio itself is produced behind the [`AudioSink`] trait, so
//! the same engine drives a hardware mixer or the host [`SoftwareMixer`].
//!
//! # Core Components
//!
//! ## Patches
//!
//! - [`Patch`] - Typed instrument settings with a validating builder
//! - [`WaveSelect`] - `"wtb:PLAITS02"` / `"osc:SAW/square"` wave source strings
//! - [`factory_patches`] - The three patches on the mode pads
//!
//! ## Waveforms
//!
//! - [`waves`] - Static single-cycle generators (sine, square, saw, ...)
//! - [`Wavetable`] - Fractional scanning over multi-frame tables
//! - [`WaveformBuffer`] - Shared, in-place rewritable sample buffer
//!
//! ## Voices
//!
//! - [`Instrument`] - Note on/off, patch loading and control-rate update
//! - [`Voice`] / [`FilterRamp`] - Per-note state and filter sweep
//! - [`AdsrEnvelope`] / [`EnvelopeParams`] - Linear ADSR with attack level
//!
//! ## Output
//!
//! - [`AudioSink`] / [`SamplePlayer`] - Interface to the audio engine
//! - [`SoftwareMixer`] - Host implementation of both
//! - [`DrumMachine`] / [`DrumKit`] - Sample triggering per pad
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible (it needs `alloc`). Disable the default
//! `std` feature:
//!
//! ```toml
//! [dependencies]
//! picotouch-synth = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use picotouch_synth::{Instrument, MemoryWavetables, SoftwareMixer, factory_patches};
//!
//! let [_, saw_b, _] = factory_patches();
//! let mut loader = MemoryWavetables::new();
//! let mut inst = Instrument::new(SoftwareMixer::new(28000.0), saw_b, &mut loader).unwrap();
//!
//! inst.note_on(48, 127).unwrap();
//! inst.note_on(55, 127).unwrap();
//!
//! let mut block = vec![0.0; 280];
//! for _ in 0..10 {
//!     inst.update(0.01).unwrap();
//!     inst.sink_mut().render(&mut block);
//! }
//! inst.note_off_all();
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod drums;
pub mod envelope;
pub mod error;
pub mod instrument;
pub mod mixer;
pub mod oscillator;
pub mod patch;
pub mod sink;
pub mod voice;
pub mod waves;
pub mod wavetable;

// Re-export main types at crate root
pub use drums::{DrumKit, DrumMachine, Sample, kit_size};
pub use envelope::{AdsrEnvelope, EnvelopeParams, EnvelopeState};
pub use error::{Result, SynthError};
pub use instrument::{FILTER_SWEEP_HZ, Instrument, MemoryWavetables, WavetableLoader};
pub use mixer::SoftwareMixer;
pub use oscillator::TableOscillator;
pub use patch::{
    FilterKind, MAX_LFO_AMOUNT, Patch, PatchBuilder, WaveKind, WaveSelect, factory_patches,
    strip_wav,
};
pub use sink::{AudioSink, FilterSettings, OscId, OscillatorConfig, SamplePlayer};
pub use voice::{FilterRamp, Voice};
pub use wavetable::{DEFAULT_FRAME_SIZE, FrameSource, MemoryFrames, WaveformBuffer, Wavetable};

// Re-export commonly used types from picotouch-core
pub use picotouch_core::{Lfo, LfoShape, midi_to_freq};
