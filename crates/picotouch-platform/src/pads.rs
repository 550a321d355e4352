//! Fixed pad layout of the picotouch board.
//!
//! 22 capacitive pads: a piano-style row whose "white keys" along the bottom
//! play notes, the "black keys" along the top edit three modulation zones,
//! and five mode pads on the right.
//!
//! ```text
//!    1  3     6  8  10    13 15            top: zones L | M | R
//!  0  2  4  5  7  9  11 12  14  16         bottom: notes
//!                                   17 18 19 20 21   mode: A B C oct- oct+
//! ```

/// Total number of touch pads.
pub const PAD_COUNT: usize = 22;

/// Number of LEDs on the strip (pads 20 and 21 have none).
pub const LED_COUNT: usize = 20;

/// Bottom row pads, which play notes or trigger drum slots.
pub const BOTTOM_PADS: [usize; 10] = [0, 2, 4, 5, 7, 9, 11, 12, 14, 16];

/// Top row pads, which form the modulation zones.
pub const TOP_PADS: [usize; 7] = [1, 3, 6, 8, 10, 13, 15];

/// Mode pads: patch A/B/C, octave down, octave up.
pub const MODE_PADS: [usize; 5] = [17, 18, 19, 20, 21];

/// One of the three top-row modulation zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    /// Pads 1 and 3.
    Left,
    /// Pads 6, 8 and 10.
    Mid,
    /// Pads 13 and 15.
    Right,
}

/// What holding a zone pad does to the zone's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneAction {
    /// Step the value down.
    Decrease,
    /// Step the value up.
    Increase,
    /// Jump to the centre (mid zone only).
    Center,
}

/// Mode pad function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModePad {
    /// Pad 17: load patch A.
    PatchA,
    /// Pad 18: load patch B.
    PatchB,
    /// Pad 19: load patch C.
    PatchC,
    /// Pad 20: one octave down.
    OctaveDown,
    /// Pad 21: one octave up.
    OctaveUp,
}

impl ModePad {
    /// Patch slot index (0 = A) for the patch-select pads.
    pub const fn patch_index(self) -> Option<usize> {
        match self {
            ModePad::PatchA => Some(0),
            ModePad::PatchB => Some(1),
            ModePad::PatchC => Some(2),
            ModePad::OctaveDown | ModePad::OctaveUp => None,
        }
    }
}

/// Role of a pad in the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PadRole {
    /// Bottom row: plays `base_note + pad`.
    Note,
    /// Top row: edits a modulation zone while held.
    Zone {
        /// Zone the pad belongs to.
        zone: Zone,
        /// Effect of holding the pad.
        action: ZoneAction,
    },
    /// Right-hand mode pad.
    Mode(ModePad),
}

/// Look up the role of `pad`, or `None` if out of range.
///
/// # Example
///
/// ```rust
/// use picotouch_platform::{ModePad, PadRole, Zone, ZoneAction, pad_role};
///
/// assert_eq!(pad_role(0), Some(PadRole::Note));
/// assert_eq!(
///     pad_role(8),
///     Some(PadRole::Zone { zone: Zone::Mid, action: ZoneAction::Center })
/// );
/// assert_eq!(pad_role(21), Some(PadRole::Mode(ModePad::OctaveUp)));
/// assert_eq!(pad_role(22), None);
/// ```
pub const fn pad_role(pad: usize) -> Option<PadRole> {
    const fn zone(zone: Zone, action: ZoneAction) -> Option<PadRole> {
        Some(PadRole::Zone { zone, action })
    }
    match pad {
        0 | 2 | 4 | 5 | 7 | 9 | 11 | 12 | 14 | 16 => Some(PadRole::Note),
        1 => zone(Zone::Left, ZoneAction::Decrease),
        3 => zone(Zone::Left, ZoneAction::Increase),
        6 => zone(Zone::Mid, ZoneAction::Decrease),
        8 => zone(Zone::Mid, ZoneAction::Center),
        10 => zone(Zone::Mid, ZoneAction::Increase),
        13 => zone(Zone::Right, ZoneAction::Decrease),
        15 => zone(Zone::Right, ZoneAction::Increase),
        17 => Some(PadRole::Mode(ModePad::PatchA)),
        18 => Some(PadRole::Mode(ModePad::PatchB)),
        19 => Some(PadRole::Mode(ModePad::PatchC)),
        20 => Some(PadRole::Mode(ModePad::OctaveDown)),
        21 => Some(PadRole::Mode(ModePad::OctaveUp)),
        _ => None,
    }
}

/// Position of `pad` within [`BOTTOM_PADS`], used as a drum trigger slot.
pub fn trigger_slot(pad: usize) -> Option<usize> {
    BOTTOM_PADS.iter().position(|&p| p == pad)
}
