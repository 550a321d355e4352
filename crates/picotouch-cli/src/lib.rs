//! Host side of the picotouch: the synth and drum-machine applications, the
//! scheduler task set that drives them, device configuration and an offline
//! simulator that replaces pads, LEDs and MIDI ports with scripted stand-ins.
//!
//! The `picotouch` binary wraps this crate with a command line.

pub mod app;
pub mod config;
pub mod sim;
pub mod surface;
pub mod tasks;

pub use app::{Device, DirKits, DrumApp, KitSource, ModZones, Renderer, SynthApp};
pub use config::{ConfigError, DeviceConfig, DrumConfig, TaskIntervals};
pub use sim::{RecordingStrip, Script, ScriptError, ScriptedTouch, SimPort, SimReport, simulate};
pub use surface::{Octave, Surface};
pub use tasks::Rig;
