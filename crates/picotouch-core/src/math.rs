//! Scalar helpers shared by the control and audio paths.

/// Linear interpolation between two values.
///
/// # Arguments
/// * `a` - Start value (at t=0)
/// * `b` - End value (at t=1)
/// * `t` - Interpolation factor (0.0 to 1.0)
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    (1.0 - t) * a + t * b
}

/// Re-map `value` from the range `[in_lo, in_hi]` to `[out_lo, out_hi]`.
///
/// Not clamped, so values outside the input range extrapolate. Returns
/// `out_lo` when the input range is empty.
///
/// ```rust
/// use picotouch_core::map_range;
///
/// assert_eq!(map_range(64.0, 0.0, 128.0, 0.0, 1.0), 0.5);
/// ```
#[inline]
pub fn map_range(value: f32, in_lo: f32, in_hi: f32, out_lo: f32, out_hi: f32) -> f32 {
    let span = in_hi - in_lo;
    if span == 0.0 {
        return out_lo;
    }
    out_lo + (value - in_lo) * (out_hi - out_lo) / span
}

/// Convert MIDI note number to frequency in Hz.
///
/// Uses standard tuning: A4 (note 69) = 440 Hz.
#[inline]
pub fn midi_to_freq(note: u8) -> f32 {
    440.0 * libm::powf(2.0, (f32::from(note) - 69.0) / 12.0)
}

/// Flush subnormal floats to zero.
///
/// Applied to filter integrator state so a decaying tail never lands in
/// the subnormal range.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}
