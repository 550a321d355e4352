//! Picotouch Platform - Hardware-facing abstractions for the picotouch synth
//!
//! This crate holds everything between the raw device peripherals and the
//! synthesis engine: touch-pad edge detection, the fixed pad layout, LED
//! colour handling, the MIDI byte codec, and the cooperative scheduler that
//! drives all of it from a single thread.
//!
//! # Core Abstractions
//!
//! ## Touch
//!
//! - [`TouchDebouncer`] - Turns sampled pad booleans into press/release edges
//! - [`TouchEvent`] - A single press or release of one pad
//! - [`TouchInput`] - Trait for anything that can sample the pads
//!
//! ## Pads and LEDs
//!
//! - [`PadRole`] - What a pad does (note, modulation zone, mode)
//! - [`Rgb`] / [`hsv`] - Packed LED colours
//! - [`LedBuffer`] / [`LedStrip`] - Frame buffer and output trait
//!
//! ## MIDI
//!
//! - [`MidiMessage`] / [`MidiParser`] - Channel voice messages and a
//!   running-status byte parser
//! - [`MidiTransport`] / [`MidiPort`] - Byte transports and a polled port
//!
//! ## Scheduling
//!
//! - [`Scheduler`] - Round-robin driver of [`Task`] objects over a [`Clock`]
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible (it needs `alloc`). Disable the default
//! `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! picotouch-platform = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use picotouch_platform::{PadRole, TouchDebouncer, pad_role};
//!
//! let mut touch = TouchDebouncer::new(22);
//! let mut sample = [false; 22];
//! sample[4] = true;
//!
//! for event in touch.poll(&sample) {
//!     if let Some(PadRole::Note) = pad_role(event.pad) {
//!         assert!(event.pressed);
//!     }
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod led;
pub mod midi;
pub mod pads;
pub mod scheduler;
pub mod touch;

// Re-export main types at crate root
pub use led::{LedBuffer, LedStrip, Rgb, hsv};
pub use midi::{
    MemoryTransport, MidiMessage, MidiParser, MidiPort, MidiTransport, TransportError, broadcast,
};
pub use pads::{LED_COUNT, ModePad, PAD_COUNT, PadRole, Zone, ZoneAction, pad_role, trigger_slot};
#[cfg(feature = "std")]
pub use scheduler::SystemClock;
pub use scheduler::{Clock, FnTask, ManualClock, Scheduler, Task, TaskId, TaskStats};
pub use touch::{TouchDebouncer, TouchEvent, TouchInput};
