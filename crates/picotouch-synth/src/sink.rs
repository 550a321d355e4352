//! Interface to the audio output engine.
//!
//! The instrument never renders audio itself. It registers oscillators with
//! an [`AudioSink`], updates their filters at control rate and releases them
//! on note-off; the sink owns the release tail. Drum samples go through the
//! separate [`SamplePlayer`] trait.

use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::drums::Sample;
use crate::envelope::{EnvelopeParams, EnvelopeState};
use crate::error::Result;
use crate::patch::FilterKind;
use crate::wavetable::WaveformBuffer;

/// Handle to an oscillator registered with a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OscId(pub u32);

/// Filter applied to one oscillator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSettings {
    /// Response type.
    pub kind: FilterKind,
    /// Cutoff in Hz.
    pub cutoff: f32,
    /// Q.
    pub resonance: f32,
}

/// Everything a sink needs to start one oscillator.
#[derive(Debug, Clone)]
pub struct OscillatorConfig {
    /// Pitch in Hz.
    pub frequency: f32,
    /// Shared single-cycle waveform.
    pub waveform: Arc<WaveformBuffer>,
    /// Amplitude envelope.
    pub envelope: EnvelopeParams,
    /// Note velocity scaled to 0.0 - 1.0.
    pub velocity: f32,
}

/// Audio output engine that plays oscillators.
pub trait AudioSink {
    /// Maximum simultaneous oscillators, including release tails.
    fn capacity(&self) -> usize;

    /// Oscillators currently held by the sink, including release tails.
    fn active(&self) -> usize;

    /// Starts all of `oscillators` with their envelopes gated on.
    ///
    /// All-or-nothing: fails with
    /// [`SynthError::NoFreeVoices`](crate::SynthError::NoFreeVoices) and
    /// starts none if they cannot all be placed.
    fn press(&mut self, oscillators: &[OscillatorConfig]) -> Result<Vec<OscId>>;

    /// Gates off the envelopes of `ids`. Unknown ids are ignored.
    ///
    /// The sink keeps each oscillator, and its waveform, until its
    /// envelope has finished releasing.
    fn release(&mut self, ids: &[OscId]);

    /// Sets the filter of oscillator `id`.
    fn set_filter(&mut self, id: OscId, filter: FilterSettings);

    /// Changes the pitch of oscillator `id`.
    fn set_frequency(&mut self, id: OscId, frequency: f32);

    /// Envelope stage of oscillator `id`, or `None` once it is gone.
    fn envelope_state(&self, id: OscId) -> Option<EnvelopeState>;
}

/// Audio output engine that plays raw samples on numbered channels.
pub trait SamplePlayer {
    /// Starts `sample` on `channel`, replacing anything playing there.
    fn play_sample(&mut self, channel: usize, sample: &Sample, looping: bool);

    /// Stops `channel`. No-op if nothing is playing.
    fn stop_sample(&mut self, channel: usize);

    /// True while `channel` is playing.
    fn is_playing(&self, channel: usize) -> bool;
}
