//! Audio-rate wavetable oscillator.
//!
//! Plays one cycle of a shared [`WaveformBuffer`] at a given frequency with
//! linear interpolation between samples. The buffer may be rewritten by the
//! control path at any time; the oscillator simply reads whatever is there.

use alloc::sync::Arc;
use libm::floorf;

use crate::wavetable::WaveformBuffer;

/// Full-scale divisor for 16-bit samples.
const I16_SCALE: f32 = 32768.0;

/// Single-cycle table oscillator.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use picotouch_synth::{TableOscillator, WaveformBuffer, waves};
///
/// let saw = Arc::new(WaveformBuffer::from_samples(&waves::make("saw").unwrap()));
/// let mut osc = TableOscillator::new(saw, 28000.0);
/// osc.set_frequency(440.0);
///
/// let first = osc.advance();
/// assert!(first > 0.9);
/// ```
#[derive(Debug, Clone)]
pub struct TableOscillator {
    waveform: Arc<WaveformBuffer>,
    /// Current phase position [0.0, 1.0)
    phase: f32,
    /// Phase increment per sample
    phase_inc: f32,
    sample_rate: f32,
    frequency: f32,
}

impl TableOscillator {
    /// Creates an oscillator at 440 Hz reading `waveform`.
    pub fn new(waveform: Arc<WaveformBuffer>, sample_rate: f32) -> Self {
        let sample_rate = sample_rate.max(1.0);
        Self {
            waveform,
            phase: 0.0,
            phase_inc: 440.0 / sample_rate,
            sample_rate,
            frequency: 440.0,
        }
    }

    /// Set frequency in Hz.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.frequency = freq_hz.max(0.0);
        self.phase_inc = self.frequency / self.sample_rate;
    }

    /// Get current frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Waveform being played.
    pub fn waveform(&self) -> &Arc<WaveformBuffer> {
        &self.waveform
    }

    /// Reset phase to 0.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Returns the current sample (-1.0 to 1.0) and advances the phase.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        let len = self.waveform.len();
        if len == 0 {
            return 0.0;
        }

        let pos = self.phase * len as f32;
        let index = floorf(pos);
        let frac = pos - index;
        let i = index as usize % len;
        let a = f32::from(self.waveform.sample_wrapped(i));
        let b = f32::from(self.waveform.sample_wrapped(i + 1));
        let out = picotouch_core::lerp(a, b, frac) / I16_SCALE;

        self.phase += self.phase_inc;
        if self.phase >= 1.0 {
            self.phase -= floorf(self.phase);
        }
        out
    }
}
