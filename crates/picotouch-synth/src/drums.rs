//! Sample-trigger drum machine.
//!
//! A [`DrumKit`] holds one optional [`Sample`] per trigger slot. The
//! [`DrumMachine`] maps notes onto slots and hands samples to a
//! [`SamplePlayer`]; slot `n` always plays on channel `n`, so retriggering a
//! pad cuts its previous hit.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use crate::sink::SamplePlayer;

/// Mono 16-bit sample data with its native rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    /// Sample frames.
    pub data: Arc<[i16]>,
    /// Native sample rate in Hz.
    pub sample_rate: u32,
}

impl Sample {
    /// Wraps sample data.
    pub fn new(data: impl Into<Arc<[i16]>>, sample_rate: u32) -> Self {
        Self {
            data: data.into(),
            sample_rate,
        }
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True for an empty sample.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Usable size of a kit: the index of the last filled slot plus one.
///
/// Gaps below the last filled slot count toward the size; an empty kit has
/// size 0.
///
/// ```rust
/// use picotouch_synth::kit_size;
///
/// assert_eq!(kit_size(&[Some(()), None, Some(()), None]), 3);
/// assert_eq!(kit_size::<()>(&[None, None]), 0);
/// ```
pub fn kit_size<T>(slots: &[Option<T>]) -> usize {
    slots
        .iter()
        .rposition(Option::is_some)
        .map_or(0, |last| last + 1)
}

/// A named set of drum samples, one optional sample per slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrumKit {
    name: String,
    slots: Vec<Option<Sample>>,
}

impl DrumKit {
    /// Kit named `name` with `slots` empty slots.
    pub fn empty(name: impl Into<String>, slots: usize) -> Self {
        Self {
            name: name.into(),
            slots: vec![None; slots],
        }
    }

    /// Kit from pre-filled slots.
    pub fn new(name: impl Into<String>, slots: Vec<Option<Sample>>) -> Self {
        Self {
            name: name.into(),
            slots,
        }
    }

    /// Kit name, usually its directory name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total slots, filled or not.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// See [`kit_size`].
    pub fn size(&self) -> usize {
        kit_size(&self.slots)
    }

    /// Sample in `slot`, if any.
    pub fn get(&self, slot: usize) -> Option<&Sample> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Fills `slot`. Ignored when out of range.
    pub fn set(&mut self, slot: usize, sample: Sample) {
        if let Some(s) = self.slots.get_mut(slot) {
            *s = Some(sample);
        }
    }
}

/// Plays kit slots in response to notes.
///
/// ## Parameters
/// - `base_note`: note mapped to slot 0 (the device uses 24)
/// - `looping`: play samples looped; only looped samples are stopped on
///   note-off, one-shots ring out (default false)
///
/// # Example
///
/// ```rust
/// use picotouch_synth::{DrumKit, DrumMachine, Sample, SamplePlayer, SoftwareMixer};
///
/// let mut kit = DrumKit::empty("kitA", 10);
/// kit.set(0, Sample::new(vec![1000; 64], 11025));
///
/// let mut mixer = SoftwareMixer::new(11025.0);
/// let drums = DrumMachine::new(kit, 24);
///
/// assert!(drums.note_on(24, &mut mixer));
/// assert!(mixer.is_playing(0));
/// // Empty slot: nothing happens
/// assert!(!drums.note_on(25, &mut mixer));
/// ```
#[derive(Debug, Clone)]
pub struct DrumMachine {
    kit: DrumKit,
    base_note: u8,
    looping: bool,
}

impl DrumMachine {
    /// Creates a machine playing `kit` from `base_note` upward.
    pub fn new(kit: DrumKit, base_note: u8) -> Self {
        Self {
            kit,
            base_note,
            looping: false,
        }
    }

    /// Replaces the kit. Samples already playing continue.
    pub fn load_kit(&mut self, kit: DrumKit) {
        #[cfg(feature = "tracing")]
        tracing::info!(kit = kit.name(), size = kit.size(), "drum kit loaded");
        self.kit = kit;
    }

    /// Current kit.
    pub fn kit(&self) -> &DrumKit {
        &self.kit
    }

    /// Name of the current kit.
    pub fn kit_name(&self) -> &str {
        self.kit.name()
    }

    /// Usable size of the current kit.
    pub fn kit_size(&self) -> usize {
        self.kit.size()
    }

    /// Note mapped to slot 0.
    pub fn base_note(&self) -> u8 {
        self.base_note
    }

    /// Sets the note mapped to slot 0.
    pub fn set_base_note(&mut self, note: u8) {
        self.base_note = note;
    }

    /// Whether samples are played looped.
    pub fn looping(&self) -> bool {
        self.looping
    }

    /// Sets looped playback for subsequent hits.
    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Plays `slot` on channel `slot`. Returns false if the slot is empty.
    pub fn play(&self, slot: usize, player: &mut dyn SamplePlayer) -> bool {
        match self.kit.get(slot) {
            Some(sample) => {
                player.play_sample(slot, sample, self.looping);
                true
            }
            None => {
                #[cfg(feature = "tracing")]
                tracing::trace!(slot, "empty drum slot");
                false
            }
        }
    }

    /// Stops `slot` if samples are looped; one-shots are left to finish.
    pub fn stop(&self, slot: usize, player: &mut dyn SamplePlayer) {
        if self.looping {
            player.stop_sample(slot);
        }
    }

    /// Plays the slot for `note`. Notes below the base note are ignored.
    pub fn note_on(&self, note: u8, player: &mut dyn SamplePlayer) -> bool {
        match self.slot_for(note) {
            Some(slot) => self.play(slot, player),
            None => false,
        }
    }

    /// Stops the slot for `note` (see [`stop`](Self::stop)).
    pub fn note_off(&self, note: u8, player: &mut dyn SamplePlayer) {
        if let Some(slot) = self.slot_for(note) {
            self.stop(slot, player);
        }
    }

    fn slot_for(&self, note: u8) -> Option<usize> {
        note.checked_sub(self.base_note).map(usize::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        played: Vec<(usize, bool)>,
        stopped: Vec<usize>,
    }

    impl SamplePlayer for Recorder {
        fn play_sample(&mut self, channel: usize, _sample: &Sample, looping: bool) {
            self.played.push((channel, looping));
        }

        fn stop_sample(&mut self, channel: usize) {
            self.stopped.push(channel);
        }

        fn is_playing(&self, channel: usize) -> bool {
            self.played.iter().any(|&(c, _)| c == channel)
        }
    }

    fn hit() -> Sample {
        Sample::new(vec![100, -100], 11025)
    }

    #[test]
    fn test_kit_size_rule() {
        assert_eq!(kit_size::<u8>(&[]), 0);
        assert_eq!(kit_size(&[Some(1), Some(2), None]), 2);
        assert_eq!(kit_size(&[None, None, Some(3)]), 3);
        assert_eq!(kit_size(&[Some(1), None, None, Some(4), None]), 4);
    }

    #[test]
    fn test_kit_set_and_get() {
        let mut kit = DrumKit::empty("kitB", 4);
        kit.set(2, hit());
        kit.set(9, hit());
        assert_eq!(kit.slot_count(), 4);
        assert_eq!(kit.size(), 3);
        assert!(kit.get(0).is_none());
        assert_eq!(kit.get(2).map(Sample::len), Some(2));
    }

    #[test]
    fn test_missing_slot_is_noop() {
        let mut kit = DrumKit::empty("kitA", 10);
        kit.set(3, hit());
        let drums = DrumMachine::new(kit, 24);
        let mut rec = Recorder::default();

        assert!(!drums.play(0, &mut rec));
        assert!(!drums.play(42, &mut rec));
        assert!(drums.play(3, &mut rec));
        assert_eq!(rec.played, vec![(3, false)]);
    }

    #[test]
    fn test_notes_map_to_slots() {
        let mut kit = DrumKit::empty("kitA", 10);
        kit.set(0, hit());
        kit.set(5, hit());
        let mut drums = DrumMachine::new(kit, 24);
        let mut rec = Recorder::default();

        assert!(drums.note_on(29, &mut rec));
        assert!(!drums.note_on(12, &mut rec));
        drums.set_base_note(36);
        assert!(drums.note_on(36, &mut rec));
        assert_eq!(rec.played, vec![(5, false), (0, false)]);
    }

    #[test]
    fn test_stop_only_when_looping() {
        let mut kit = DrumKit::empty("kitA", 2);
        kit.set(1, hit());
        let mut drums = DrumMachine::new(kit, 24);
        let mut rec = Recorder::default();

        drums.note_off(25, &mut rec);
        assert!(rec.stopped.is_empty());

        drums.set_looping(true);
        drums.note_on(25, &mut rec);
        drums.note_off(25, &mut rec);
        assert_eq!(rec.played, vec![(1, true)]);
        assert_eq!(rec.stopped, vec![1]);
    }

    #[test]
    fn test_load_kit_switches() {
        let mut drums = DrumMachine::new(DrumKit::empty("kitA", 10), 24);
        assert_eq!(drums.kit_size(), 0);
        let mut kit_b = DrumKit::empty("kitB", 10);
        kit_b.set(7, hit());
        drums.load_kit(kit_b);
        assert_eq!(drums.kit_name(), "kitB");
        assert_eq!(drums.kit_size(), 8);
    }
}
