//! Low Frequency Oscillator for control-rate modulation.
//!
//! Unlike an audio-rate oscillator this LFO is advanced by elapsed time, not
//! by samples, so the same instance can be ticked by a scheduler task at an
//! irregular cadence. Output is `offset + scale * shape(phase)`.

use core::f32::consts::PI;
use libm::sinf;

/// LFO shape, evaluated over one cycle `phase ∈ [0.0, 1.0]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LfoShape {
    /// Bipolar sine, -1.0 to 1.0.
    #[default]
    Sine,
    /// Bipolar triangle starting at zero: 0 → 1 → 0 → -1 → 0.
    Triangle,
    /// Unipolar triangle: 0 → 1 → 0.
    TrianglePositive,
    /// Unipolar rising ramp: 0 → 1.
    RampUp,
    /// Unipolar falling ramp: 1 → 0.
    RampDown,
}

impl LfoShape {
    /// Evaluate the shape at `phase` (clamped to `[0.0, 1.0]`).
    #[inline]
    pub fn eval(self, phase: f32) -> f32 {
        let p = phase.clamp(0.0, 1.0);
        match self {
            LfoShape::Sine => sinf(p * 2.0 * PI),
            LfoShape::Triangle => {
                if p < 0.25 {
                    4.0 * p
                } else if p < 0.75 {
                    2.0 - 4.0 * p
                } else {
                    4.0 * p - 4.0
                }
            }
            LfoShape::TrianglePositive => {
                if p < 0.5 {
                    2.0 * p
                } else {
                    2.0 - 2.0 * p
                }
            }
            LfoShape::RampUp => p,
            LfoShape::RampDown => 1.0 - p,
        }
    }
}

/// Low Frequency Oscillator advanced by wall-clock time.
///
/// ## Parameters
/// - `rate`: cycles per second (0.0 and up, default set by constructor)
/// - `scale` / `offset`: output is `offset + scale * shape(phase)`
///   (defaults 1.0 / 0.0)
/// - `once`: when set the LFO runs a single cycle and then holds the end
///   value of the shape
///
/// # Example
///
/// ```rust
/// use picotouch_core::{Lfo, LfoShape};
///
/// // One-shot ramp that reaches 1.0 after 0.5 s and stays there
/// let mut ramp = Lfo::new(LfoShape::RampUp, 2.0).one_shot();
/// ramp.advance(0.25);
/// assert!((ramp.value() - 0.5).abs() < 1e-6);
/// ramp.advance(1.0);
/// assert_eq!(ramp.value(), 1.0);
/// assert!(ramp.is_finished());
/// ```
#[derive(Debug, Clone)]
pub struct Lfo {
    shape: LfoShape,
    /// Current phase position [0.0, 1.0]
    phase: f32,
    /// Cycles per second
    rate: f32,
    scale: f32,
    offset: f32,
    once: bool,
}

impl Default for Lfo {
    fn default() -> Self {
        Self::new(LfoShape::Sine, 1.0)
    }
}

impl Lfo {
    /// Create a free-running LFO with unit scale and zero offset.
    pub fn new(shape: LfoShape, rate: f32) -> Self {
        Self {
            shape,
            phase: 0.0,
            rate: rate.max(0.0),
            scale: 1.0,
            offset: 0.0,
            once: false,
        }
    }

    /// Builder: set output scale and offset.
    pub fn with_scale_offset(mut self, scale: f32, offset: f32) -> Self {
        self.scale = scale;
        self.offset = offset;
        self
    }

    /// Builder: run a single cycle and hold the final value.
    pub fn one_shot(mut self) -> Self {
        self.once = true;
        self
    }

    /// Set rate in cycles per second.
    pub fn set_rate(&mut self, rate: f32) {
        self.rate = rate.max(0.0);
    }

    /// Current rate in cycles per second.
    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Set output scale.
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    /// Set output offset.
    pub fn set_offset(&mut self, offset: f32) {
        self.offset = offset;
    }

    /// Current shape.
    pub fn shape(&self) -> LfoShape {
        self.shape
    }

    /// Restart the cycle from phase 0.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Current phase (0.0 - 1.0).
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// True once a one-shot LFO has reached the end of its cycle.
    pub fn is_finished(&self) -> bool {
        self.once && self.phase >= 1.0
    }

    /// Current output without advancing.
    #[inline]
    pub fn value(&self) -> f32 {
        self.offset + self.scale * self.shape.eval(self.phase)
    }

    /// Advance by `dt` seconds and return the new output.
    #[inline]
    pub fn advance(&mut self, dt: f32) -> f32 {
        let next = self.phase + self.rate * dt.max(0.0);
        self.phase = if self.once {
            next.min(1.0)
        } else {
            next - libm::floorf(next)
        };
        self.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lfo_phase_accumulation() {
        let mut lfo = Lfo::new(LfoShape::Sine, 1.0);

        // 100 ticks of 10 ms = one full cycle
        for _ in 0..100 {
            lfo.advance(0.01);
        }

        let phase_error = lfo.phase().min((lfo.phase() - 1.0).abs());
        assert!(phase_error < 0.01, "phase {}", lfo.phase());
    }

    #[test]
    fn test_lfo_output_range() {
        for shape in [
            LfoShape::Sine,
            LfoShape::Triangle,
            LfoShape::TrianglePositive,
            LfoShape::RampUp,
            LfoShape::RampDown,
        ] {
            let mut lfo = Lfo::new(shape, 3.7);
            for _ in 0..1000 {
                let value = lfo.advance(0.001);
                assert!(
                    (-1.0..=1.0).contains(&value),
                    "shape {:?} out of range: {}",
                    shape,
                    value
                );
            }
        }
    }

    #[test]
    fn test_lfo_unipolar_scale_offset() {
        let mut lfo = Lfo::new(LfoShape::Sine, 0.3).with_scale_offset(0.5, 0.5);
        assert!((lfo.value() - 0.5).abs() < 1e-6);
        for _ in 0..2000 {
            let v = lfo.advance(0.01);
            assert!((0.0..=1.0).contains(&v), "unipolar value out of range: {v}");
        }
    }

    #[test]
    fn test_one_shot_holds_end_value() {
        let mut lfo = Lfo::new(LfoShape::RampUp, 4.0).one_shot();
        assert_eq!(lfo.value(), 0.0);
        assert!(!lfo.is_finished());

        lfo.advance(0.125);
        assert!((lfo.value() - 0.5).abs() < 1e-6);

        for _ in 0..10 {
            lfo.advance(0.1);
        }
        assert!(lfo.is_finished());
        assert_eq!(lfo.value(), 1.0);
    }

    #[test]
    fn test_reset_restarts_cycle() {
        let mut lfo = Lfo::new(LfoShape::RampUp, 1.0).one_shot();
        lfo.advance(2.0);
        assert!(lfo.is_finished());
        lfo.reset();
        assert_eq!(lfo.phase(), 0.0);
        assert!(!lfo.is_finished());
    }

    #[test]
    fn test_zero_rate_is_static() {
        let mut lfo = Lfo::new(LfoShape::Triangle, 0.0);
        for _ in 0..10 {
            assert_eq!(lfo.advance(0.5), 0.0);
        }
    }

    #[test]
    fn test_shape_breakpoints() {
        assert!((LfoShape::Triangle.eval(0.25) - 1.0).abs() < 1e-6);
        assert!((LfoShape::Triangle.eval(0.75) + 1.0).abs() < 1e-6);
        assert!((LfoShape::TrianglePositive.eval(0.5) - 1.0).abs() < 1e-6);
        assert_eq!(LfoShape::RampDown.eval(0.0), 1.0);
        assert_eq!(LfoShape::RampDown.eval(1.0), 0.0);
    }
}
