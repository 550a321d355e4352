//! Per-note voice state.
//!
//! A [`Voice`] is what the instrument keeps for one sounding note: the
//! oscillator handles it registered with the sink, a control-rate copy of
//! the amplitude envelope, the filter sweep and the filter settings last
//! sent to the sink.

use picotouch_core::{Lfo, LfoShape};

use crate::envelope::{AdsrEnvelope, EnvelopeParams};
use crate::sink::{FilterSettings, OscId};

/// One-shot filter sweep, rising 0.0 to 1.0 over the filter attack time
/// and holding at 1.0.
///
/// A zero attack time gives an instant 1.0.
///
/// ```rust
/// use picotouch_synth::FilterRamp;
///
/// let mut ramp = FilterRamp::new(0.5);
/// assert_eq!(ramp.value(), 0.0);
/// ramp.advance(0.25);
/// assert!((ramp.value() - 0.5).abs() < 1e-6);
/// ramp.advance(10.0);
/// assert_eq!(ramp.value(), 1.0);
///
/// assert_eq!(FilterRamp::new(0.0).value(), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct FilterRamp {
    lfo: Option<Lfo>,
}

impl FilterRamp {
    /// Ramp lasting `attack_time` seconds.
    pub fn new(attack_time: f32) -> Self {
        let lfo = (attack_time > 0.0)
            .then(|| Lfo::new(LfoShape::RampUp, 1.0 / attack_time).one_shot());
        Self { lfo }
    }

    /// Current value (0.0 - 1.0).
    pub fn value(&self) -> f32 {
        self.lfo.as_ref().map_or(1.0, Lfo::value)
    }

    /// Advances by `dt` seconds and returns the new value.
    pub fn advance(&mut self, dt: f32) -> f32 {
        match &mut self.lfo {
            Some(lfo) => lfo.advance(dt),
            None => 1.0,
        }
    }

    /// True once the ramp has reached 1.0.
    pub fn is_finished(&self) -> bool {
        self.lfo.as_ref().is_none_or(Lfo::is_finished)
    }
}

/// State of one sounding note.
#[derive(Debug, Clone)]
pub struct Voice {
    note: u8,
    velocity: u8,
    osc1: OscId,
    osc2: Option<OscId>,
    amp_env: AdsrEnvelope,
    filter_ramp: FilterRamp,
    filter: FilterSettings,
}

impl Voice {
    /// New voice with its amplitude envelope gated on.
    pub(crate) fn new(
        note: u8,
        velocity: u8,
        osc1: OscId,
        osc2: Option<OscId>,
        amp_env: EnvelopeParams,
        filter_attack: f32,
        filter: FilterSettings,
    ) -> Self {
        let mut amp_env = AdsrEnvelope::new(amp_env);
        amp_env.gate_on();
        Self {
            note,
            velocity,
            osc1,
            osc2,
            amp_env,
            filter_ramp: FilterRamp::new(filter_attack),
            filter,
        }
    }

    /// MIDI note number.
    pub fn note(&self) -> u8 {
        self.note
    }

    /// Note-on velocity (0-127).
    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    /// Primary oscillator.
    pub fn osc1(&self) -> OscId {
        self.osc1
    }

    /// Detuned oscillator, absent when the patch detune is 0.
    pub fn osc2(&self) -> Option<OscId> {
        self.osc2
    }

    /// Both oscillators, primary first.
    pub fn oscillators(&self) -> impl Iterator<Item = OscId> + '_ {
        core::iter::once(self.osc1).chain(self.osc2)
    }

    /// Control-rate amplitude envelope tracker.
    pub fn amp_env(&self) -> &AdsrEnvelope {
        &self.amp_env
    }

    /// Filter sweep.
    pub fn filter_ramp(&self) -> &FilterRamp {
        &self.filter_ramp
    }

    /// Filter settings last sent to the sink.
    pub fn filter(&self) -> FilterSettings {
        self.filter
    }

    pub(crate) fn set_filter(&mut self, filter: FilterSettings) {
        self.filter = filter;
    }

    pub(crate) fn set_osc2(&mut self, osc2: Option<OscId>) {
        self.osc2 = osc2;
    }

    /// Advances envelope and sweep by `dt` seconds. Returns the sweep value.
    pub(crate) fn advance(&mut self, dt: f32) -> f32 {
        self.amp_env.advance(dt);
        self.filter_ramp.advance(dt)
    }
}
