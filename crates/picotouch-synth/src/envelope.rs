//! ADSR envelope generator for synthesis.
//!
//! Linear attack-decay-sustain-release segments with times in seconds. The
//! attack peaks at a configurable level rather than full scale, so a patch
//! can attack softly and then swell or fall back to its sustain level.
//!
//! The same envelope runs at audio rate inside the mixer and at control
//! rate inside [`Voice`](crate::Voice); callers pass the elapsed time to
//! [`AdsrEnvelope::advance`].

/// ADSR envelope states
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvelopeState {
    /// Envelope is inactive, output is zero.
    #[default]
    Idle,
    /// Output ramps toward the attack level.
    Attack,
    /// Output moves from the attack level toward the sustain level.
    Decay,
    /// Output holds at the sustain level while the gate is held.
    Sustain,
    /// Output falls to zero after gate release.
    Release,
}

/// Envelope shape shared by amplitude and filter envelopes.
///
/// Times are in seconds, levels in 0.0 - 1.0. Values outside those ranges
/// are clamped by [`clamped`](Self::clamped), which every consumer applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeParams {
    /// Time to rise from silence to `attack_level`.
    pub attack_time: f32,
    /// Time to move from `attack_level` to `sustain_level`.
    pub decay_time: f32,
    /// Time to fall from the sustain level to silence.
    pub release_time: f32,
    /// Peak level reached at the end of the attack.
    pub attack_level: f32,
    /// Level held while the gate is on.
    pub sustain_level: f32,
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self {
            attack_time: 0.1,
            decay_time: 0.01,
            release_time: 0.2,
            attack_level: 0.8,
            sustain_level: 0.8,
        }
    }
}

impl EnvelopeParams {
    /// Copy with times non-negative and levels in 0.0 - 1.0.
    ///
    /// NaN times become zero and NaN levels become silence.
    pub fn clamped(self) -> Self {
        Self {
            attack_time: non_negative(self.attack_time),
            decay_time: non_negative(self.decay_time),
            release_time: non_negative(self.release_time),
            attack_level: unit(self.attack_level),
            sustain_level: unit(self.sustain_level),
        }
    }
}

#[inline]
fn non_negative(x: f32) -> f32 {
    if x.is_nan() { 0.0 } else { x.max(0.0) }
}

#[inline]
fn unit(x: f32) -> f32 {
    if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
}

/// ADSR envelope generator.
///
/// # Example
///
/// ```rust
/// use picotouch_synth::{AdsrEnvelope, EnvelopeParams, EnvelopeState};
///
/// let mut env = AdsrEnvelope::new(EnvelopeParams {
///     attack_time: 0.01,
///     decay_time: 0.1,
///     release_time: 0.2,
///     attack_level: 1.0,
///     sustain_level: 0.5,
/// });
///
/// env.gate_on();
/// let dt = 1.0 / 1000.0;
/// for _ in 0..500 {
///     env.advance(dt);
/// }
/// assert_eq!(env.state(), EnvelopeState::Sustain);
///
/// env.gate_off();
/// assert_eq!(env.state(), EnvelopeState::Release);
/// ```
#[derive(Debug, Clone)]
pub struct AdsrEnvelope {
    params: EnvelopeParams,
    state: EnvelopeState,
    level: f32,
    /// Level per second for the current segment (signed).
    slope: f32,
}

impl Default for AdsrEnvelope {
    fn default() -> Self {
        Self::new(EnvelopeParams::default())
    }
}

impl AdsrEnvelope {
    /// Creates an idle envelope with the given shape.
    pub fn new(params: EnvelopeParams) -> Self {
        Self {
            params: params.clamped(),
            state: EnvelopeState::Idle,
            level: 0.0,
            slope: 0.0,
        }
    }

    /// Envelope shape.
    pub fn params(&self) -> &EnvelopeParams {
        &self.params
    }

    /// Replaces the shape. Takes effect at the next segment boundary.
    pub fn set_params(&mut self, params: EnvelopeParams) {
        self.params = params.clamped();
    }

    /// Trigger the envelope (note on).
    ///
    /// Starts the attack from the current level, so retriggering a sounding
    /// envelope does not click.
    pub fn gate_on(&mut self) {
        self.enter(EnvelopeState::Attack);
    }

    /// Release the envelope (note off).
    pub fn gate_off(&mut self) {
        if self.state != EnvelopeState::Idle {
            self.enter(EnvelopeState::Release);
        }
    }

    /// Force envelope to idle state.
    pub fn reset(&mut self) {
        self.state = EnvelopeState::Idle;
        self.level = 0.0;
        self.slope = 0.0;
    }

    /// Get current state.
    pub fn state(&self) -> EnvelopeState {
        self.state
    }

    /// Get current level without advancing.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Check if envelope is active (not idle).
    pub fn is_active(&self) -> bool {
        self.state != EnvelopeState::Idle
    }

    /// Advances by `dt` seconds and returns the new level.
    ///
    /// A step that crosses a segment boundary stops at the boundary; the
    /// next call continues in the following segment.
    #[inline]
    pub fn advance(&mut self, dt: f32) -> f32 {
        let dt = non_negative(dt);
        match self.state {
            EnvelopeState::Idle => self.level = 0.0,
            EnvelopeState::Sustain => self.level = self.params.sustain_level,
            EnvelopeState::Attack => {
                let target = self.params.attack_level;
                if self.step_toward(target, dt) {
                    self.enter(EnvelopeState::Decay);
                }
            }
            EnvelopeState::Decay => {
                let target = self.params.sustain_level;
                if self.step_toward(target, dt) {
                    self.enter(EnvelopeState::Sustain);
                }
            }
            EnvelopeState::Release => {
                if self.step_toward(0.0, dt) {
                    self.enter(EnvelopeState::Idle);
                }
            }
        }
        self.level
    }

    /// Moves `level` along `slope` toward `target`. Returns true on arrival.
    fn step_toward(&mut self, target: f32, dt: f32) -> bool {
        let next = self.level + self.slope * dt;
        let arrived = if self.slope >= 0.0 {
            next >= target
        } else {
            next <= target
        };
        self.level = if arrived { target } else { next };
        arrived
    }

    fn enter(&mut self, state: EnvelopeState) {
        let p = self.params;
        self.state = state;
        let (target, time) = match state {
            EnvelopeState::Idle => {
                self.level = 0.0;
                self.slope = 0.0;
                return;
            }
            EnvelopeState::Sustain => {
                self.level = p.sustain_level;
                self.slope = 0.0;
                return;
            }
            EnvelopeState::Attack => (p.attack_level, p.attack_time),
            EnvelopeState::Decay => (p.sustain_level, p.decay_time),
            EnvelopeState::Release => (0.0, p.release_time),
        };

        // Attack and decay rates are defined over their full span; release
        // falls from wherever the gate was lifted.
        let span = match state {
            EnvelopeState::Attack => p.attack_level,
            EnvelopeState::Decay => p.attack_level - p.sustain_level,
            _ => self.level,
        };

        if time <= 0.0 || span == 0.0 {
            // Zero-length segment: jump and let the next advance move on
            self.level = target;
            self.slope = 0.0;
        } else {
            let direction = if target >= self.level { 1.0 } else { -1.0 };
            self.slope = direction * span.abs() / time;
        }
    }
}
