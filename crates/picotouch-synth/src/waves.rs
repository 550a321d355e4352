//! Single-cycle waveform generators.
//!
//! All generators produce signed 16-bit tables, the format oscillators and
//! the audio path consume. [`make`] resolves the short names patches use
//! (`"SAW"`, `"square"`, `"tri"`, ...) case-insensitively.
//!
//! ```rust
//! use picotouch_synth::waves;
//!
//! let saw = waves::make("saw").unwrap();
//! assert_eq!(saw.len(), waves::WAVE_SIZE);
//! assert_eq!(saw[0], waves::WAVE_VOLUME);
//! ```

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::f32::consts::PI;
use libm::sinf;

use crate::error::{Result, SynthError};

/// Default table length for static oscillator waveforms.
pub const WAVE_SIZE: usize = 512;

/// Default peak amplitude, leaving headroom below `i16::MAX`.
pub const WAVE_VOLUME: i16 = 30000;

/// Evenly spaced values from `start` to `end` inclusive, truncated to i16.
fn linspace(start: f32, end: f32, count: usize) -> Vec<i16> {
    match count {
        0 => Vec::new(),
        1 => vec![start as i16],
        _ => {
            let last = count - 1;
            let step = (end - start) / last as f32;
            (0..count)
                .map(|i| (if i == last { end } else { start + step * i as f32 }) as i16)
                .collect()
        }
    }
}

/// One cycle of a sine wave.
pub fn sine(size: usize, volume: i16) -> Vec<i16> {
    let volume = f32::from(volume);
    (0..size)
        .map(|i| (sinf(2.0 * PI * i as f32 / size as f32) * volume) as i16)
        .collect()
}

/// Square wave: `+volume` for the first half, `-volume` for the second.
pub fn square(size: usize, volume: i16) -> Vec<i16> {
    let half = size / 2;
    let mut table = vec![volume; half];
    table.resize(half * 2, volume.saturating_neg());
    table
}

/// Triangle wave rising from `min` to `max` then falling back.
pub fn triangle(size: usize, min: i16, max: i16) -> Vec<i16> {
    let half = size / 2;
    let mut table = linspace(f32::from(min), f32::from(max), half);
    table.extend(linspace(f32::from(max), f32::from(min), half));
    table
}

/// Falling sawtooth from `+volume` to `-volume`.
pub fn saw_down(size: usize, volume: i16) -> Vec<i16> {
    linspace(f32::from(volume), -f32::from(volume), size)
}

/// Rising sawtooth from `-volume` to `+volume`.
pub fn saw_up(size: usize, volume: i16) -> Vec<i16> {
    linspace(-f32::from(volume), f32::from(volume), size)
}

/// All zeros.
pub fn silence(size: usize) -> Vec<i16> {
    vec![0; size]
}

/// White noise from a xorshift generator, repeatable for a given `seed`.
pub fn noise(size: usize, volume: i16, seed: u32) -> Vec<i16> {
    let mut x = seed.max(1);
    let volume = f32::from(volume);
    (0..size)
        .map(|_| {
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            ((x as i32 as f32) / (i32::MAX as f32) * volume) as i16
        })
        .collect()
}

/// Builds the named waveform at the default size and volume.
pub fn make(name: &str) -> Result<Vec<i16>> {
    make_sized(name, WAVE_SIZE, WAVE_VOLUME)
}

/// Builds the named waveform.
///
/// Recognised names (any case): `SIN`/`SINE`, `SQU`/`SQUARE`, `SAW`
/// (falling), `SAWUP`, `TRI`/`TRIANGLE`, `SIL`/`SILENCE`, `NZE`/`NOISE`.
pub fn make_sized(name: &str, size: usize, volume: i16) -> Result<Vec<i16>> {
    let upper = name.trim().to_ascii_uppercase();
    let table = match upper.as_str() {
        "SIN" | "SINE" => sine(size, volume),
        "SQU" | "SQUARE" => square(size, volume),
        "SAW" => saw_down(size, volume),
        "SAWUP" => saw_up(size, volume),
        "TRI" | "TRIANGLE" => triangle(size, volume.saturating_neg(), volume),
        "SIL" | "SILENCE" => silence(size),
        "NZE" | "NOISE" => noise(size, volume, 0x1234_5678),
        _ => return Err(SynthError::UnknownWaveform(String::from(name))),
    };
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saw_endpoints() {
        let saw = saw_down(512, 30000);
        assert_eq!(saw.len(), 512);
        assert_eq!(saw[0], 30000);
        assert_eq!(saw[511], -30000);
        assert!(saw.windows(2).all(|w| w[0] >= w[1]));

        let up = saw_up(512, 30000);
        assert_eq!(up[0], -30000);
        assert_eq!(up[511], 30000);
    }

    #[test]
    fn test_square_halves() {
        let sq = square(512, 30000);
        assert_eq!(sq.len(), 512);
        assert!(sq[..256].iter().all(|&s| s == 30000));
        assert!(sq[256..].iter().all(|&s| s == -30000));
    }

    #[test]
    fn test_triangle_peak_in_middle() {
        let tri = triangle(512, -30000, 30000);
        assert_eq!(tri.len(), 512);
        assert_eq!(tri[0], -30000);
        assert_eq!(tri[255], 30000);
        assert_eq!(tri[256], 30000);
        assert_eq!(tri[511], -30000);
    }

    #[test]
    fn test_sine_quarter_points() {
        let s = sine(512, 30000);
        assert_eq!(s[0], 0);
        assert!((i32::from(s[128]) - 30000).abs() <= 1);
        assert!((i32::from(s[384]) + 30000).abs() <= 1);
    }

    #[test]
    fn test_noise_bounded_and_repeatable() {
        let a = noise(256, 1000, 7);
        let b = noise(256, 1000, 7);
        assert_eq!(a, b);
        assert!(a.iter().all(|&s| (-1000..=1000).contains(&s)));
        assert!(a.iter().any(|&s| s != 0));
    }

    #[test]
    fn test_make_names_case_insensitive() {
        assert_eq!(make("SAW"), make("saw"));
        assert_eq!(make("square"), make("SQU"));
        assert_eq!(make("Triangle"), make("tri"));
        assert_eq!(make("silence").map(|t| t.iter().all(|&s| s == 0)), Ok(true));
    }

    #[test]
    fn test_make_unknown() {
        assert_eq!(
            make("wobble"),
            Err(SynthError::UnknownWaveform(String::from("wobble")))
        );
    }

    #[test]
    fn test_odd_size() {
        assert_eq!(square(5, 10).len(), 4);
        assert_eq!(sine(5, 10).len(), 5);
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(7.0, 1.0, 1), vec![7]);
    }
}
