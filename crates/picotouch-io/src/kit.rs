//! Drum-kit directories.
//!
//! A kit is a directory of WAV files whose names start with a two-digit
//! slot number, e.g. `kitA/00_kick.wav`, `kitA/03-hat.WAV`. Hidden files and
//! anything not ending in `.wav` are ignored. When several files claim one
//! slot, the first in sorted order wins.

use std::path::Path;

use picotouch_synth::{DrumKit, Sample};

use crate::Result;
use crate::wav::read_samples;

/// Slot number encoded in a kit file name, if the name qualifies.
///
/// ```rust
/// use picotouch_io::slot_index;
///
/// assert_eq!(slot_index("03_snare.wav"), Some(3));
/// assert_eq!(slot_index("12.WAV"), Some(12));
/// assert_eq!(slot_index("._03_snare.wav"), None);
/// assert_eq!(slot_index("3_snare.wav"), None);
/// assert_eq!(slot_index("03_notes.txt"), None);
/// ```
pub fn slot_index(file_name: &str) -> Option<usize> {
    if file_name.starts_with('.') {
        return None;
    }
    let len = file_name.len();
    if len < 4 || !file_name.is_char_boundary(len - 4) {
        return None;
    }
    if !file_name[len - 4..].eq_ignore_ascii_case(".wav") {
        return None;
    }
    let prefix = file_name.get(..2)?;
    if !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    prefix.parse().ok()
}

/// Picks one file name per slot from a directory listing.
///
/// Names are sorted first so the result does not depend on listing order.
/// Slots at or beyond `slots` are dropped.
pub fn assign_slots<I>(names: I, slots: usize) -> Vec<Option<String>>
where
    I: IntoIterator<Item = String>,
{
    let mut names: Vec<String> = names.into_iter().collect();
    names.sort();

    let mut assigned = vec![None; slots];
    for name in names {
        let free = slot_index(&name)
            .and_then(|i| assigned.get_mut(i))
            .filter(|slot| slot.is_none());
        if let Some(slot) = free {
            *slot = Some(name);
        }
    }
    assigned
}

/// Loads `<root>/<name>` as a kit with `slots` trigger slots.
///
/// A missing kit directory is an error. A slot file that fails to load is
/// logged and left empty.
pub fn load_kit(root: &Path, name: &str, slots: usize) -> Result<DrumKit> {
    let dir = root.join(name);
    let names = std::fs::read_dir(&dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok());

    let mut kit = DrumKit::empty(name, slots);
    for (slot, file) in assign_slots(names, slots).into_iter().enumerate() {
        let Some(file) = file else { continue };
        match read_samples(dir.join(&file)) {
            Ok((data, rate)) => kit.set(slot, Sample::new(data, rate)),
            Err(e) => tracing::warn!(kit = name, file = %file, error = %e, "skipping drum sample"),
        }
    }
    tracing::info!(kit = name, size = kit.size(), "kit loaded");
    Ok(kit)
}

/// Names of the kit directories under `root`, sorted.
pub fn list_kits(root: &Path) -> Result<Vec<String>> {
    let mut kits: Vec<String> = std::fs::read_dir(root)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| !name.starts_with('.'))
        .collect();
    kits.sort();
    Ok(kits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_slot_index_rules() {
        assert_eq!(slot_index("00.wav"), Some(0));
        assert_eq!(slot_index("09kick.Wav"), Some(9));
        assert_eq!(slot_index("99_x.wav"), Some(99));
        assert_eq!(slot_index(".wav"), None);
        assert_eq!(slot_index("ab_kick.wav"), None);
        assert_eq!(slot_index("05_kick.wav.bak"), None);
        assert_eq!(slot_index("é.wav"), None);
    }

    #[test]
    fn test_first_sorted_match_wins() {
        let slots = assign_slots(names(&["01_b.wav", "01_a.wav", "00_kick.wav"]), 4);
        assert_eq!(slots[0].as_deref(), Some("00_kick.wav"));
        assert_eq!(slots[1].as_deref(), Some("01_a.wav"));
        assert_eq!(slots[2], None);
    }

    #[test]
    fn test_out_of_range_and_junk_ignored() {
        let slots = assign_slots(
            names(&["12_far.wav", "._02_mac.wav", "03_readme.txt", "02_hat.WAV"]),
            10,
        );
        assert_eq!(slots.len(), 10);
        assert_eq!(slots[2].as_deref(), Some("02_hat.WAV"));
        assert_eq!(slots.iter().flatten().count(), 1);
    }
}
