//! Touch-pad edge detection.
//!
//! Capacitive thresholds are decided upstream, so the input here is already
//! one boolean per pad. [`TouchDebouncer`] compares each new reading against
//! the stored one and emits an event on every confirmed change.
//!
//! With the default confirmation count of 1 this is a plain edge detector
//! with one sample of memory. Raising the count makes a changed reading wait
//! for that many consecutive polls before it is accepted, which suppresses
//! chatter from noisy pads.

use alloc::vec;
use alloc::vec::Vec;

/// A press or release of one pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TouchEvent {
    /// Pad index (0-based).
    pub pad: usize,
    /// `true` for a press, `false` for a release.
    pub pressed: bool,
}

impl TouchEvent {
    /// A press of `pad`.
    #[inline]
    pub const fn press(pad: usize) -> Self {
        Self { pad, pressed: true }
    }

    /// A release of `pad`.
    #[inline]
    pub const fn release(pad: usize) -> Self {
        Self {
            pad,
            pressed: false,
        }
    }
}

/// Source of raw per-pad touch readings.
///
/// Implemented by the capacitive front end on the device and by scripted
/// inputs on the host.
pub trait TouchInput {
    /// Number of pads this input reports.
    fn pad_count(&self) -> usize;

    /// Sample every pad into `out`, one boolean per pad.
    ///
    /// `out` is at least `pad_count()` long; extra entries are left alone.
    fn sample(&mut self, out: &mut [bool]);
}

/// Edge detector over a bank of touch pads.
///
/// ## Parameters
/// - `confirmation`: consecutive polls a changed reading must persist before
///   it is accepted (1 to 255, default 1)
///
/// # Example
///
/// ```rust
/// use picotouch_platform::{TouchDebouncer, TouchEvent};
///
/// let mut touch = TouchDebouncer::new(1);
/// assert!(touch.poll(&[false]).is_empty());
/// assert_eq!(touch.poll(&[true]), vec![TouchEvent::press(0)]);
/// assert!(touch.poll(&[true]).is_empty());
/// assert_eq!(touch.poll(&[false]), vec![TouchEvent::release(0)]);
/// ```
#[derive(Debug, Clone)]
pub struct TouchDebouncer {
    state: Vec<bool>,
    /// Consecutive polls the reading has differed from `state`
    pending: Vec<u8>,
    confirmation: u8,
}

impl TouchDebouncer {
    /// Creates a debouncer for `pad_count` pads, all released.
    pub fn new(pad_count: usize) -> Self {
        Self {
            state: vec![false; pad_count],
            pending: vec![0; pad_count],
            confirmation: 1,
        }
    }

    /// Builder: require `polls` consecutive changed readings per edge.
    ///
    /// Zero is treated as 1.
    pub fn with_confirmation(mut self, polls: u8) -> Self {
        self.confirmation = polls.max(1);
        self
    }

    /// Confirmation count in polls.
    pub fn confirmation(&self) -> u8 {
        self.confirmation
    }

    /// Number of pads tracked.
    pub fn pad_count(&self) -> usize {
        self.state.len()
    }

    /// Adopt `samples` as the current state without emitting events.
    ///
    /// Used once at power-on so pads already touched do not press.
    pub fn seed(&mut self, samples: &[bool]) {
        for (stored, &sample) in self.state.iter_mut().zip(samples) {
            *stored = sample;
        }
        self.pending.fill(0);
    }

    /// Whether `pad` is currently considered pressed.
    pub fn is_pressed(&self, pad: usize) -> bool {
        self.state.get(pad).copied().unwrap_or(false)
    }

    /// Iterator over currently pressed pad indices.
    pub fn pressed_pads(&self) -> impl Iterator<Item = usize> + '_ {
        self.state
            .iter()
            .enumerate()
            .filter_map(|(pad, &down)| down.then_some(pad))
    }

    /// Compare `samples` against stored state and return the edges.
    ///
    /// Readings beyond `pad_count()` are ignored. Events come out in pad
    /// order.
    pub fn poll(&mut self, samples: &[bool]) -> Vec<TouchEvent> {
        let mut events = Vec::new();
        self.poll_into(samples, &mut events);
        events
    }

    /// Like [`poll`](Self::poll) but appends to a caller-owned buffer.
    pub fn poll_into(&mut self, samples: &[bool], events: &mut Vec<TouchEvent>) {
        for (pad, &sample) in samples.iter().enumerate().take(self.state.len()) {
            if sample == self.state[pad] {
                self.pending[pad] = 0;
                continue;
            }
            self.pending[pad] = self.pending[pad].saturating_add(1);
            if self.pending[pad] >= self.confirmation {
                self.state[pad] = sample;
                self.pending[pad] = 0;
                events.push(TouchEvent { pad, pressed: sample });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_pad_press_release_sequence() {
        let mut touch = TouchDebouncer::new(1);
        let readings = [false, true, true, false];
        let events: Vec<(usize, Vec<TouchEvent>)> = readings
            .iter()
            .enumerate()
            .map(|(i, &r)| (i, touch.poll(&[r])))
            .filter(|(_, e)| !e.is_empty())
            .collect();

        assert_eq!(
            events,
            vec![
                (1, vec![TouchEvent::press(0)]),
                (3, vec![TouchEvent::release(0)]),
            ]
        );
    }

    #[test]
    fn test_multiple_pads_in_pad_order() {
        let mut touch = TouchDebouncer::new(4);
        let events = touch.poll(&[true, false, true, false]);
        assert_eq!(events, vec![TouchEvent::press(0), TouchEvent::press(2)]);

        let events = touch.poll(&[false, true, true, false]);
        assert_eq!(events, vec![TouchEvent::release(0), TouchEvent::press(1)]);
    }

    #[test]
    fn test_seed_suppresses_power_on_press() {
        let mut touch = TouchDebouncer::new(3);
        touch.seed(&[false, true, false]);
        assert!(touch.is_pressed(1));
        assert!(touch.poll(&[false, true, false]).is_empty());
        assert_eq!(touch.poll(&[false, false, false]), vec![TouchEvent::release(1)]);
    }

    #[test]
    fn test_confirmation_suppresses_chatter() {
        let mut touch = TouchDebouncer::new(1).with_confirmation(3);
        // Single-poll glitches never make it through
        for reading in [true, false, true, false, false, true, false] {
            assert!(touch.poll(&[reading]).is_empty());
        }
        assert!(touch.poll(&[true]).is_empty());
        assert!(touch.poll(&[true]).is_empty());
        assert_eq!(touch.poll(&[true]), vec![TouchEvent::press(0)]);
        assert!(touch.is_pressed(0));
    }

    #[test]
    fn test_zero_confirmation_acts_as_one() {
        let mut touch = TouchDebouncer::new(1).with_confirmation(0);
        assert_eq!(touch.confirmation(), 1);
        assert_eq!(touch.poll(&[true]), vec![TouchEvent::press(0)]);
    }

    #[test]
    fn test_extra_and_short_readings() {
        let mut touch = TouchDebouncer::new(2);
        assert_eq!(touch.poll(&[true, true, true]).len(), 2);
        // Short reading only touches the pads it covers
        assert_eq!(touch.poll(&[false]), vec![TouchEvent::release(0)]);
        assert!(touch.is_pressed(1));
        assert!(!touch.is_pressed(7));
    }

    #[test]
    fn test_pressed_pads() {
        let mut touch = TouchDebouncer::new(5);
        touch.poll(&[false, true, false, true, false]);
        assert_eq!(touch.pressed_pads().collect::<Vec<_>>(), vec![1, 3]);
    }
}
