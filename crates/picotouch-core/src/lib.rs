//! Picotouch Core - small DSP primitives shared by the picotouch crates
//!
//! Everything here runs at either control rate (once per scheduler tick) or
//! audio rate inside the host mixer, and never allocates.
//!
//! # Contents
//!
//! - [`Lfo`] - Table-driven low-frequency oscillator with scale/offset and a
//!   one-shot mode, used for the wave-mix LFO and the filter-envelope ramp
//! - [`LfoShape`] - Breakpoint tables (`sine`, ramps, triangles)
//! - [`StateVariableFilter`] - TPT state variable filter with low/high/band
//!   outputs
//! - Math helpers: [`lerp`], [`map_range`], [`midi_to_freq`],
//!   [`flush_denormal`]
//!
//! # no_std Support
//!
//! Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! picotouch-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use picotouch_core::{Lfo, LfoShape};
//!
//! // Unipolar 0.3 Hz sine, as used for wavetable scanning
//! let mut lfo = Lfo::new(LfoShape::Sine, 0.3).with_scale_offset(0.5, 0.5);
//! let value = lfo.advance(0.01);
//! assert!((0.0..=1.0).contains(&value));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod lfo;
pub mod math;
pub mod svf;

pub use lfo::{Lfo, LfoShape};
pub use math::{flush_denormal, lerp, map_range, midi_to_freq};
pub use svf::{StateVariableFilter, SvfOutput};
