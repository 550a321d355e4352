//! Property-based tests for picotouch-core control and filter primitives.
//!
//! Tests filter stability under cutoff sweeps, LFO output bounds, and
//! interpolation/range-mapping identities using proptest for randomized
//! input generation.

use picotouch_core::{Lfo, LfoShape, StateVariableFilter, SvfOutput, lerp, map_range};
use proptest::prelude::*;

fn svf_mode(index: usize) -> SvfOutput {
    match index % 3 {
        0 => SvfOutput::Lowpass,
        1 => SvfOutput::Highpass,
        _ => SvfOutput::Bandpass,
    }
}

fn lfo_shape(index: usize) -> LfoShape {
    match index % 5 {
        0 => LfoShape::Sine,
        1 => LfoShape::Triangle,
        2 => LfoShape::TrianglePositive,
        3 => LfoShape::RampUp,
        _ => LfoShape::RampDown,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// For any valid cutoff and Q, the SVF produces finite output in every
    /// output mode for random finite input.
    #[test]
    fn svf_stability(
        freq in 20.0f32..13000.0f32,
        q in 0.5f32..10.0f32,
        output_mode in 0usize..3,
        input in prop::array::uniform32(-1.0f32..=1.0f32),
    ) {
        let mut svf = StateVariableFilter::new(28000.0);
        svf.set_cutoff(freq);
        svf.set_resonance(q);
        let mode = svf_mode(output_mode);
        svf.set_output_type(mode);

        for &sample in &input {
            let out = svf.process(sample);
            prop_assert!(
                out.is_finite(),
                "SVF mode {:?} (freq={}, q={}) produced non-finite output {} for input {}",
                mode, freq, q, out, sample
            );
        }
    }

    /// Sweeping the cutoff on every sample, the way the filter envelope
    /// does, never destabilises the filter.
    #[test]
    fn svf_swept_cutoff_stays_finite(
        start in 20.0f32..8000.0f32,
        end in 20.0f32..13000.0f32,
        q in 0.5f32..2.0f32,
        output_mode in 0usize..3,
    ) {
        let mut svf = StateVariableFilter::new(28000.0);
        svf.set_resonance(q);
        svf.set_output_type(svf_mode(output_mode));

        for i in 0..512 {
            let t = i as f32 / 511.0;
            svf.set_cutoff(lerp(start, end, t));
            let input = if i % 64 < 32 { 0.8 } else { -0.8 };
            let out = svf.process(input);
            prop_assert!(out.is_finite(), "non-finite output {} at step {}", out, i);
            prop_assert!(out.abs() < 100.0, "runaway output {} at step {}", out, i);
        }
    }

    /// A free-running LFO with unit scale stays within [-1, 1] for any rate
    /// and tick size.
    #[test]
    fn lfo_output_bounded(
        shape in 0usize..5,
        rate in 0.0f32..50.0f32,
        dt in 0.0f32..0.5f32,
    ) {
        let mut lfo = Lfo::new(lfo_shape(shape), rate);
        for _ in 0..200 {
            let v = lfo.advance(dt);
            prop_assert!((-1.0..=1.0).contains(&v), "value {} out of range", v);
            prop_assert!((0.0..1.0).contains(&lfo.phase()), "phase {}", lfo.phase());
        }
    }

    /// A one-shot LFO eventually finishes and then holds its value.
    #[test]
    fn one_shot_lfo_holds(
        shape in 0usize..5,
        rate in 0.1f32..20.0f32,
    ) {
        let mut lfo = Lfo::new(lfo_shape(shape), rate).one_shot();
        let ticks = (1.0 / rate / 0.01) as usize + 2;
        for _ in 0..ticks {
            lfo.advance(0.01);
        }
        prop_assert!(lfo.is_finished());
        let held = lfo.value();
        lfo.advance(1.0);
        prop_assert_eq!(lfo.value(), held);
    }

    /// `map_range` sends the input endpoints to the output endpoints.
    #[test]
    fn map_range_endpoints(
        in_lo in -100.0f32..0.0f32,
        in_hi in 1.0f32..100.0f32,
        out_lo in -1000.0f32..1000.0f32,
        out_hi in -1000.0f32..1000.0f32,
    ) {
        let lo = map_range(in_lo, in_lo, in_hi, out_lo, out_hi);
        let hi = map_range(in_hi, in_lo, in_hi, out_lo, out_hi);
        prop_assert!((lo - out_lo).abs() < 1e-2, "lo {} vs {}", lo, out_lo);
        prop_assert!((hi - out_hi).abs() < 1e-2, "hi {} vs {}", hi, out_hi);
    }

    /// Interpolating between two values never leaves their span.
    #[test]
    fn lerp_within_span(
        a in -30000.0f32..30000.0f32,
        b in -30000.0f32..30000.0f32,
        t in 0.0f32..=1.0f32,
    ) {
        let v = lerp(a, b, t);
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        prop_assert!(v >= lo - 0.01 && v <= hi + 0.01, "{} outside [{}, {}]", v, lo, hi);
    }
}
