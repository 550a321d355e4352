//! LED colours and the frame buffer behind the pad LEDs.
//!
//! Colours are kept as 8-bit RGB and packed as `0xRRGGBB`, the format the
//! LED strip driver takes. [`hsv`] converts from hue/saturation/value the
//! same way the zone indicators are specified.

use alloc::vec;
use alloc::vec::Vec;

/// 8-bit RGB colour.
///
/// # Example
///
/// ```rust
/// use picotouch_platform::Rgb;
///
/// let magenta = Rgb::from_packed(0x330033);
/// assert_eq!(magenta, Rgb::new(0x33, 0x00, 0x33));
/// assert_eq!(magenta.pack(), 0x330033);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// All channels off.
    pub const BLACK: Self = Self::new(0, 0, 0);

    /// Creates a colour from its channels.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Unpacks `0xRRGGBB`. Bits above 24 are ignored.
    #[inline]
    pub const fn from_packed(packed: u32) -> Self {
        Self {
            r: (packed >> 16) as u8,
            g: (packed >> 8) as u8,
            b: packed as u8,
        }
    }

    /// Packs as `0xRRGGBB`.
    #[inline]
    pub const fn pack(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Subtracts `amount` from every channel, saturating at zero.
    #[inline]
    pub const fn faded(self, amount: u8) -> Self {
        Self {
            r: self.r.saturating_sub(amount),
            g: self.g.saturating_sub(amount),
            b: self.b.saturating_sub(amount),
        }
    }
}

impl From<u32> for Rgb {
    fn from(packed: u32) -> Self {
        Self::from_packed(packed)
    }
}

/// Converts hue/saturation/value (all 0.0 - 1.0) to RGB.
///
/// Hue wraps; saturation and value are clamped. Uses the six-sector
/// algorithm with channels rounded to the nearest 8-bit step.
///
/// ```rust
/// use picotouch_platform::{Rgb, hsv};
///
/// assert_eq!(hsv(0.0, 1.0, 1.0), Rgb::new(255, 0, 0));
/// assert_eq!(hsv(0.5, 0.0, 0.5), Rgb::new(128, 128, 128));
/// ```
pub fn hsv(hue: f32, saturation: f32, value: f32) -> Rgb {
    let s = saturation.clamp(0.0, 1.0);
    let v = value.clamp(0.0, 1.0);
    let h = (hue - libm::floorf(hue)) * 6.0;
    let sector = libm::floorf(h);
    let frac = h - sector;

    let p = v * (1.0 - s);
    let q = v * (1.0 - s * frac);
    let t = v * (1.0 - s * (1.0 - frac));

    let (r, g, b) = match sector as u8 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    Rgb::new(to_byte(r), to_byte(g), to_byte(b))
}

#[inline]
fn to_byte(channel: f32) -> u8 {
    libm::roundf(channel.clamp(0.0, 1.0) * 255.0) as u8
}

/// Output side of an addressable LED strip.
pub trait LedStrip {
    /// Number of LEDs on the strip.
    fn led_count(&self) -> usize;

    /// Latch `colors` onto the strip, LED 0 first.
    ///
    /// `colors` may be shorter than the strip; remaining LEDs keep their
    /// previous colour.
    fn show(&mut self, colors: &[Rgb]);
}

/// Frame buffer for the pad LEDs.
///
/// Writes go to the buffer; [`flush`](Self::flush) pushes it to a strip.
/// Out-of-range indices are ignored, since the strip is shorter than the
/// pad count.
///
/// # Example
///
/// ```rust
/// use picotouch_platform::{LedBuffer, Rgb};
///
/// let mut leds = LedBuffer::new(20);
/// leds.set(4, Rgb::from_packed(0x330033));
/// leds.set(21, Rgb::from_packed(0xffffff)); // no LED, ignored
/// leds.fade(0x10);
/// assert_eq!(leds.get(4), Some(Rgb::new(0x23, 0x00, 0x23)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedBuffer {
    pixels: Vec<Rgb>,
    dirty: bool,
}

impl LedBuffer {
    /// Creates a buffer of `count` dark LEDs.
    pub fn new(count: usize) -> Self {
        Self {
            pixels: vec![Rgb::BLACK; count],
            dirty: true,
        }
    }

    /// Number of LEDs.
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// True if the buffer holds no LEDs.
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Sets LED `index`. Ignored when out of range.
    pub fn set(&mut self, index: usize, color: Rgb) {
        if let Some(pixel) = self.pixels.get_mut(index) {
            if *pixel != color {
                *pixel = color;
                self.dirty = true;
            }
        }
    }

    /// Colour of LED `index`.
    pub fn get(&self, index: usize) -> Option<Rgb> {
        self.pixels.get(index).copied()
    }

    /// Turns every LED off.
    pub fn clear(&mut self) {
        self.pixels.fill(Rgb::BLACK);
        self.dirty = true;
    }

    /// Dims every LED by `amount` per channel.
    pub fn fade(&mut self, amount: u8) {
        for pixel in &mut self.pixels {
            *pixel = pixel.faded(amount);
        }
        self.dirty = true;
    }

    /// All LED colours, LED 0 first.
    pub fn as_slice(&self) -> &[Rgb] {
        &self.pixels
    }

    /// True if the buffer changed since the last flush.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Pushes the buffer to `strip` if anything changed.
    ///
    /// Returns `true` if the strip was written.
    pub fn flush(&mut self, strip: &mut dyn LedStrip) -> bool {
        if !self.dirty {
            return false;
        }
        strip.show(&self.pixels);
        self.dirty = false;
        true
    }
}
