//! Device applications: the polyphonic synth and the drum machine.
//!
//! Each application owns its engine plus a [`Surface`] and reacts to touch
//! edges, MIDI input, a periodic modulation tick and LED refreshes. The
//! scheduler tasks in [`crate::tasks`] drive them through the [`Device`]
//! trait, so the same task set runs either mode.

use std::path::PathBuf;

use picotouch_platform::{
    MidiMessage, PadRole, Rgb, TouchEvent, Zone, ZoneAction, hsv, pad_role, trigger_slot,
};
use picotouch_synth::{
    AudioSink, DrumKit, DrumMachine, Instrument, Patch, SamplePlayer, SoftwareMixer,
    WavetableLoader,
};

use crate::surface::Surface;

/// Velocity of notes played from the pads.
pub const TOUCH_VELOCITY: u8 = 127;
/// Velocity of MIDI notes mirrored from drum pads.
pub const DRUM_MIDI_VELOCITY: u8 = 100;

/// Note pad while its note sounds.
pub const NOTE_ON_LED: Rgb = Rgb::from_packed(0x330033);
/// Note pad after its note ends.
pub const NOTE_OFF_LED: Rgb = Rgb::from_packed(0x010001);
/// Octave indicator.
pub const OCTAVE_LED: Rgb = Rgb::from_packed(0x110000);
/// Patch indicator colour per patch slot A, B, C.
pub const PATCH_LEDS: [Rgb; 3] = [
    Rgb::from_packed(0x110011),
    Rgb::from_packed(0x001111),
    Rgb::from_packed(0x111100),
];
/// Kit indicator colour per kit slot A, B, C.
pub const KIT_LEDS: [Rgb; 3] = [
    Rgb::from_packed(0x080008),
    Rgb::from_packed(0x000808),
    Rgb::from_packed(0x110800),
];
/// Drum pad while held.
pub const HELD_PAD_LED: Rgb = Rgb::from_packed(0x222222);

/// LED of the patch or kit indicator.
pub const MODE_LED: usize = 17;
/// LED left of the octave pads.
pub const OCTAVE_DOWN_LED: usize = 18;
/// LED right of the octave pads.
pub const OCTAVE_UP_LED: usize = 19;

/// Mixer output that can be pulled into a sample buffer.
pub trait Renderer {
    /// Fills `out` with the next mono samples.
    fn render(&mut self, out: &mut [f32]);
}

impl Renderer for SoftwareMixer {
    fn render(&mut self, out: &mut [f32]) {
        SoftwareMixer::render(self, out);
    }
}

/// An application the scheduler tasks can drive.
pub trait Device {
    /// Shared pad, LED and MIDI state.
    fn surface(&self) -> &Surface;

    /// Shared pad, LED and MIDI state, mutably.
    fn surface_mut(&mut self) -> &mut Surface;

    /// Reacts to a confirmed pad edge.
    fn touch(&mut self, event: TouchEvent);

    /// Reacts to an inbound MIDI message.
    fn midi(&mut self, message: MidiMessage);

    /// Periodic control-rate work; `dt` is seconds since the last call.
    fn modulate(&mut self, dt: f32);

    /// Redraws the LED buffer from current state.
    fn refresh_leds(&mut self);

    /// Pulls the next audio block.
    fn render(&mut self, out: &mut [f32]);

    /// Output sample rate in Hz.
    fn sample_rate(&self) -> u32;

    /// One-line status for the diagnostics task.
    fn status(&self) -> String;
}

// ---------------------------------------------------------------------------
// Modulation zones
// ---------------------------------------------------------------------------

/// Values of the three top-row modulation zones.
///
/// Holding a zone pad steps its value by [`ModZones::STEP`] per modulation
/// tick within [`ModZones::MIN`]..=[`ModZones::MAX`]. The mid-zone centre
/// pad jumps to 0.5.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModZones {
    /// Left zone: wave-mix LFO depth, times 2.
    pub left: f32,
    /// Mid zone: filter cutoff, `100 + mid * 4000` Hz.
    pub mid: f32,
    /// Right zone: wave mix.
    pub right: f32,
}

impl Default for ModZones {
    fn default() -> Self {
        Self {
            left: 0.02,
            mid: 0.3,
            right: 0.02,
        }
    }
}

impl ModZones {
    /// Step per modulation tick while held.
    pub const STEP: f32 = 0.02;
    /// Lowest zone value.
    pub const MIN: f32 = 0.02;
    /// Highest zone value.
    pub const MAX: f32 = 0.98;

    /// Value of `zone`.
    pub fn get(&self, zone: Zone) -> f32 {
        match zone {
            Zone::Left => self.left,
            Zone::Mid => self.mid,
            Zone::Right => self.right,
        }
    }

    /// Applies one held-pad action. Returns true if the value changed.
    pub fn apply(&mut self, zone: Zone, action: ZoneAction) -> bool {
        let value = match zone {
            Zone::Left => &mut self.left,
            Zone::Mid => &mut self.mid,
            Zone::Right => &mut self.right,
        };
        let next = match action {
            ZoneAction::Decrease => (*value - Self::STEP).max(Self::MIN),
            ZoneAction::Increase => (*value + Self::STEP).min(Self::MAX),
            ZoneAction::Center => 0.5,
        };
        let changed = next != *value;
        *value = next;
        changed
    }

    /// Writes the zone values into `patch`.
    pub fn apply_to(&self, patch: &mut Patch) {
        patch.set_wave_mix(self.right);
        patch.set_cutoff(100.0 + self.mid * 4000.0);
        patch.set_wave_mix_lfo_amount(self.left * 2.0);
    }
}

/// LED colours for `zone` at `value`: one per zone pad, in pad order.
///
/// The decrease pad dims as the value rises and the increase pad brightens;
/// the mid-zone centre pad stays at half brightness.
pub fn zone_leds(zone: Zone, value: f32) -> Vec<(usize, Rgb)> {
    const SATURATION: f32 = 0.98;
    const BRIGHTNESS: f32 = 0.25;
    let low = |hue| hsv(hue, SATURATION, BRIGHTNESS * (1.0 - value));
    let high = |hue| hsv(hue, SATURATION, BRIGHTNESS * value);
    match zone {
        Zone::Left => vec![(1, low(0.05)), (3, high(0.05))],
        Zone::Mid => vec![
            (6, low(0.30)),
            (8, hsv(0.30, SATURATION, BRIGHTNESS * 0.5)),
            (10, high(0.30)),
        ],
        Zone::Right => vec![(13, low(0.6)), (15, high(0.6))],
    }
}

// ---------------------------------------------------------------------------
// Synth
// ---------------------------------------------------------------------------

/// Polyphonic synth: bottom pads play notes, top pads edit the modulation
/// zones, mode pads pick patch A/B/C and shift octaves.
pub struct SynthApp<S: AudioSink> {
    surface: Surface,
    instrument: Instrument<S>,
    patches: Vec<Patch>,
    patch_index: usize,
    loader: Box<dyn WavetableLoader>,
    mods: ModZones,
    sample_rate: u32,
}

impl<S: AudioSink + Renderer> SynthApp<S> {
    /// Builds the app with `patches[patch_index]` loaded.
    ///
    /// The modulation zones are written into the patch before loading.
    pub fn new(
        surface: Surface,
        sink: S,
        patches: Vec<Patch>,
        patch_index: usize,
        mut loader: Box<dyn WavetableLoader>,
        sample_rate: u32,
    ) -> anyhow::Result<Self> {
        let mods = ModZones::default();
        let mut patch = patches
            .get(patch_index)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no patch in slot {patch_index}"))?;
        mods.apply_to(&mut patch);
        let instrument = Instrument::new(sink, patch, loader.as_mut())?;
        let mut app = Self {
            surface,
            instrument,
            patches,
            patch_index,
            loader,
            mods,
            sample_rate,
        };
        app.clear_note_leds();
        Ok(app)
    }

    /// The instrument.
    pub fn instrument(&self) -> &Instrument<S> {
        &self.instrument
    }

    /// Index of the loaded patch slot.
    pub fn patch_index(&self) -> usize {
        self.patch_index
    }

    /// Current zone values.
    pub fn mods(&self) -> ModZones {
        self.mods
    }

    /// Loads patch slot `index`, stopping every note first.
    ///
    /// On failure the previous patch stays loaded.
    pub fn select_patch(&mut self, index: usize) {
        let Some(mut patch) = self.patches.get(index).cloned() else {
            tracing::warn!(index, "no patch in slot");
            return;
        };
        self.all_notes_off();
        self.mods.apply_to(&mut patch);
        let name = patch.name().to_owned();
        match self.instrument.load_patch(patch, self.loader.as_mut()) {
            Ok(()) => {
                self.patch_index = index;
                tracing::info!(patch = %name, "patch loaded");
            }
            Err(e) => tracing::warn!(patch = %name, error = %e, "patch load failed"),
        }
    }

    fn note_on(&mut self, note: u8, velocity: u8) {
        if let Err(e) = self.instrument.note_on(note, velocity) {
            tracing::warn!(note, error = %e, "note dropped");
            return;
        }
        self.set_note_led(note, NOTE_ON_LED);
    }

    fn note_off(&mut self, note: u8) {
        self.instrument.note_off(note);
        self.set_note_led(note, NOTE_OFF_LED);
    }

    fn all_notes_off(&mut self) {
        self.instrument.note_off_all();
        self.clear_note_leds();
    }

    fn set_note_led(&mut self, note: u8, color: Rgb) {
        let Some(pad) = self.surface.octave().pad_for(note) else {
            return;
        };
        if pad_role(pad) == Some(PadRole::Note) {
            self.surface.leds_mut().set(pad, color);
        }
    }

    fn clear_note_leds(&mut self) {
        for pad in picotouch_platform::pads::BOTTOM_PADS {
            self.surface.leds_mut().set(pad, NOTE_OFF_LED);
        }
    }
}

impl<S: AudioSink + Renderer> Device for SynthApp<S> {
    fn surface(&self) -> &Surface {
        &self.surface
    }

    fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    fn touch(&mut self, event: TouchEvent) {
        match pad_role(event.pad) {
            Some(PadRole::Note) => {
                let Some(note) = self.surface.octave().note_for(event.pad) else {
                    return;
                };
                let message = if event.pressed {
                    self.note_on(note, TOUCH_VELOCITY);
                    MidiMessage::note_on(note, TOUCH_VELOCITY)
                } else {
                    self.note_off(note);
                    MidiMessage::note_off(note, 0)
                };
                self.surface.send(&message);
            }
            Some(PadRole::Mode(mode)) if event.pressed => match mode.patch_index() {
                Some(index) => self.select_patch(index),
                None => {
                    if self.surface.octave_mut().shift(mode) {
                        self.all_notes_off();
                        tracing::debug!(base_note = self.surface.octave().base(), "octave");
                    }
                }
            },
            // Zone pads act while held, in `modulate`
            _ => {}
        }
    }

    fn midi(&mut self, message: MidiMessage) {
        match message {
            MidiMessage::NoteOn { note, velocity, .. } => self.note_on(note, velocity),
            MidiMessage::NoteOff { note, .. } => self.note_off(note),
            MidiMessage::ControlChange { control, value, .. } => {
                let v = f32::from(value) / 127.0;
                let patch = self.instrument.patch_mut();
                match control {
                    71 => patch.set_wave_mix(v),
                    1 => patch.set_wave_mix_lfo_amount(v * 50.0),
                    74 => patch.set_cutoff(v * 8000.0),
                    _ => tracing::trace!(control, value, "unmapped controller"),
                }
            }
            other => tracing::trace!(?other, "ignored midi message"),
        }
    }

    fn modulate(&mut self, dt: f32) {
        let mut changed = false;
        let held: Vec<usize> = self.surface.held_pads().collect();
        for pad in held {
            if let Some(PadRole::Zone { zone, action }) = pad_role(pad) {
                changed |= self.mods.apply(zone, action);
            }
        }
        if changed {
            self.mods.apply_to(self.instrument.patch_mut());
        }
        if let Err(e) = self.instrument.update(dt) {
            tracing::warn!(error = %e, "instrument update failed");
        }
    }

    fn refresh_leds(&mut self) {
        let octave = *self.surface.octave();
        let mods = self.mods;
        let leds = self.surface.leds_mut();

        let (down, up) = match octave.base().cmp(&octave.home()) {
            std::cmp::Ordering::Equal => (OCTAVE_LED, OCTAVE_LED),
            std::cmp::Ordering::Less => (OCTAVE_LED, Rgb::BLACK),
            std::cmp::Ordering::Greater => (Rgb::BLACK, OCTAVE_LED),
        };
        leds.set(OCTAVE_DOWN_LED, down);
        leds.set(OCTAVE_UP_LED, up);
        leds.set(MODE_LED, PATCH_LEDS[self.patch_index % PATCH_LEDS.len()]);

        for zone in [Zone::Left, Zone::Mid, Zone::Right] {
            for (pad, color) in zone_leds(zone, mods.get(zone)) {
                leds.set(pad, color);
            }
        }
    }

    fn render(&mut self, out: &mut [f32]) {
        self.instrument.sink_mut().render(out);
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn status(&self) -> String {
        format!(
            "mods: {:.2} {:.2} {:.2} patch {} voices {}",
            self.mods.left,
            self.mods.mid,
            self.mods.right,
            self.instrument.patch().name(),
            self.instrument.voice_count()
        )
    }
}

// ---------------------------------------------------------------------------
// Drum machine
// ---------------------------------------------------------------------------

/// Opens drum kits by name.
pub trait KitSource {
    /// Loads kit `name` with `slots` trigger slots.
    fn load(&mut self, name: &str, slots: usize) -> picotouch_io::Result<DrumKit>;
}

/// Kits read from sub-directories of a root directory.
#[derive(Debug, Clone)]
pub struct DirKits {
    root: PathBuf,
}

impl DirKits {
    /// Kits under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl KitSource for DirKits {
    fn load(&mut self, name: &str, slots: usize) -> picotouch_io::Result<DrumKit> {
        picotouch_io::load_kit(&self.root, name, slots)
    }
}

/// Sample-trigger drum machine: bottom pads trigger kit slots, mode pads
/// pick kit A/B/C and shift octaves. Pads below 17 also send MIDI notes so
/// the board doubles as a controller.
pub struct DrumApp<P: SamplePlayer> {
    surface: Surface,
    machine: DrumMachine,
    player: P,
    kits: Box<dyn KitSource>,
    kit_names: Vec<String>,
    kit_index: usize,
    sample_rate: u32,
}

impl<P: SamplePlayer + Renderer> DrumApp<P> {
    /// Trigger slots per kit.
    pub const SLOTS: usize = picotouch_platform::pads::BOTTOM_PADS.len();

    /// Pads at or above this index never send MIDI.
    pub const MIDI_PAD_LIMIT: usize = 17;

    /// Builds the app with the first of `kit_names` loaded.
    pub fn new(
        surface: Surface,
        player: P,
        mut kits: Box<dyn KitSource>,
        kit_names: Vec<String>,
        sample_rate: u32,
    ) -> anyhow::Result<Self> {
        let first = kit_names
            .first()
            .ok_or_else(|| anyhow::anyhow!("no kits configured"))?;
        let kit = kits.load(first, Self::SLOTS)?;
        let machine = DrumMachine::new(kit, surface.octave().base());
        Ok(Self {
            surface,
            machine,
            player,
            kits,
            kit_names,
            kit_index: 0,
            sample_rate,
        })
    }

    /// The drum machine.
    pub fn machine(&self) -> &DrumMachine {
        &self.machine
    }

    /// The sample player.
    pub fn player(&self) -> &P {
        &self.player
    }

    /// Loads kit slot `index`. On failure the current kit stays.
    pub fn select_kit(&mut self, index: usize) {
        let Some(name) = self.kit_names.get(index) else {
            tracing::warn!(index, "no kit in slot");
            return;
        };
        match self.kits.load(name, Self::SLOTS) {
            Ok(kit) => {
                self.machine.load_kit(kit);
                self.kit_index = index;
            }
            Err(e) => tracing::warn!(kit = %name, error = %e, "kit load failed"),
        }
    }
}

impl<P: SamplePlayer + Renderer> Device for DrumApp<P> {
    fn surface(&self) -> &Surface {
        &self.surface
    }

    fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    fn touch(&mut self, event: TouchEvent) {
        let pad = event.pad;
        if let Some(slot) = trigger_slot(pad) {
            if event.pressed {
                self.machine.play(slot, &mut self.player);
            } else {
                self.machine.stop(slot, &mut self.player);
            }
        }

        if pad < Self::MIDI_PAD_LIMIT {
            if let Some(note) = self.surface.octave().note_for(pad) {
                let message = if event.pressed {
                    MidiMessage::note_on(note, DRUM_MIDI_VELOCITY)
                } else {
                    MidiMessage::note_off(note, 0)
                };
                self.surface.send(&message);
            }
            return;
        }

        if let Some(PadRole::Mode(mode)) = pad_role(pad).filter(|_| event.pressed) {
            match mode.patch_index() {
                Some(index) => self.select_kit(index),
                None => {
                    self.surface.octave_mut().shift(mode);
                    self.machine.set_base_note(self.surface.octave().base());
                }
            }
        }
    }

    fn midi(&mut self, message: MidiMessage) {
        match message {
            MidiMessage::NoteOn { note, .. } => {
                self.machine.note_on(note, &mut self.player);
            }
            MidiMessage::NoteOff { note, .. } => self.machine.note_off(note, &mut self.player),
            other => tracing::trace!(?other, "ignored midi message"),
        }
    }

    fn modulate(&mut self, _dt: f32) {}

    fn refresh_leds(&mut self) {
        let kit_led = KIT_LEDS[self.kit_index % KIT_LEDS.len()];
        let octave = *self.surface.octave();
        let held: Vec<bool> = (0..Self::MIDI_PAD_LIMIT)
            .map(|pad| self.surface.is_held(pad))
            .collect();
        let leds = self.surface.leds_mut();

        for (pad, held) in held.into_iter().enumerate() {
            leds.set(pad, if held { HELD_PAD_LED } else { kit_led });
        }

        let shifted = |m: i32| Rgb::new((0x08 * m.unsigned_abs()).min(255) as u8, 0, 0);
        let idle = Rgb::from_packed(0x040000);
        let m = octave.offset();
        if octave.base() == octave.home() {
            leds.set(OCTAVE_DOWN_LED, Rgb::from_packed(0x080000));
            leds.set(OCTAVE_UP_LED, Rgb::from_packed(0x080000));
        } else {
            leds.set(OCTAVE_DOWN_LED, if m < 0 { shifted(m) } else { idle });
            leds.set(OCTAVE_UP_LED, if m > 0 { shifted(m) } else { idle });
        }
        leds.set(MODE_LED, kit_led);
    }

    fn render(&mut self, out: &mut [f32]) {
        self.player.render(out);
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn status(&self) -> String {
        format!(
            "kit {} size {} base {}",
            self.machine.kit_name(),
            self.machine.kit_size(),
            self.machine.base_note()
        )
    }
}
