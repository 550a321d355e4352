//! Two-oscillator polyphonic instrument.
//!
//! The [`Instrument`] turns notes into oscillators on an [`AudioSink`] and
//! modulates them at control rate. Every note gets two oscillators (the
//! second detuned by the patch ratio) reading one shared waveform buffer,
//! an amplitude envelope, and a filter that sweeps up from the patch cutoff
//! over the filter attack time.
//!
//! The waveform comes either from static generators, optionally crossfaded
//! A/B by `wave_mix`, or from a [`Wavetable`] scanned by a global LFO:
//!
//! ```text
//! position = lfo * wave_mix_lfo_amount * 10 + wave_mix * frame_count
//! ```
//!
//! Wavetables are opened through a [`WavetableLoader`], so the engine
//! itself never touches a file system.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use picotouch_core::{Lfo, LfoShape, midi_to_freq};

use crate::error::{Result, SynthError};
use crate::patch::{Patch, WaveKind};
use crate::sink::{AudioSink, FilterSettings, OscId, OscillatorConfig};
use crate::voice::Voice;
use crate::wavetable::{DEFAULT_FRAME_SIZE, WaveformBuffer, Wavetable};
use crate::waves;

/// Filter sweep depth in Hz: half of the 8 kHz cutoff ceiling.
pub const FILTER_SWEEP_HZ: f32 = 4000.0;

/// Opens wavetables by directory and file stem.
pub trait WavetableLoader {
    /// Opens `<dir>/<name>` as a wavetable of `frame_size`-sample frames.
    fn load(&mut self, dir: &str, name: &str, frame_size: usize) -> Result<Wavetable>;
}

/// Wavetables held in memory, keyed by stem. The directory is ignored.
///
/// # Example
///
/// ```rust
/// use picotouch_synth::{MemoryWavetables, WavetableLoader};
///
/// let mut tables = MemoryWavetables::new();
/// tables.insert("RAMP", (0..1024).map(|i| i as i16).collect());
///
/// let table = tables.load("/wav", "RAMP", 256).unwrap();
/// assert_eq!(table.frame_count(), 4);
/// assert!(tables.load("/wav", "MISSING", 256).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryWavetables {
    tables: BTreeMap<String, Vec<i16>>,
}

impl MemoryWavetables {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the table `name`.
    pub fn insert(&mut self, name: impl Into<String>, samples: Vec<i16>) {
        self.tables.insert(name.into(), samples);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, samples: Vec<i16>) -> Self {
        self.insert(name, samples);
        self
    }
}

impl WavetableLoader for MemoryWavetables {
    fn load(&mut self, dir: &str, name: &str, frame_size: usize) -> Result<Wavetable> {
        let samples = self
            .tables
            .get(name)
            .ok_or_else(|| SynthError::Io(alloc::format!("{dir}/{name}: no such wavetable")))?;
        Wavetable::from_samples(samples.clone(), frame_size)
    }
}

enum WaveSource {
    /// Static waveforms; `output` holds `a`, or `lerp(a, b, wave_mix)`.
    Static {
        output: Arc<WaveformBuffer>,
        a: Vec<i16>,
        b: Option<Vec<i16>>,
    },
    Table {
        table: Wavetable,
        dir: String,
        name: String,
    },
}

impl WaveSource {
    fn build(patch: &Patch, loader: &mut dyn WavetableLoader) -> Result<Self> {
        match patch.wave_kind() {
            WaveKind::Osc => {
                let a = waves::make(patch.primary_wave())?;
                let b = patch.secondary_wave().map(waves::make).transpose()?;
                let output = Arc::new(WaveformBuffer::from_samples(&a));
                if let Some(b) = &b {
                    output.write_lerp(&a, b, patch.wave_mix());
                }
                Ok(WaveSource::Static { output, a, b })
            }
            WaveKind::Wtb => {
                let table = loader.load(patch.wave_dir(), patch.primary_wave(), DEFAULT_FRAME_SIZE)?;
                Ok(WaveSource::Table {
                    table,
                    dir: String::from(patch.wave_dir()),
                    name: String::from(patch.primary_wave()),
                })
            }
        }
    }

    /// True if this source already serves `patch`'s wavetable.
    fn serves_table(&self, patch: &Patch) -> bool {
        match self {
            WaveSource::Table { dir, name, .. } => {
                patch.wave_kind() == WaveKind::Wtb
                    && dir == patch.wave_dir()
                    && name == patch.primary_wave()
            }
            WaveSource::Static { .. } => false,
        }
    }

    fn output(&self) -> &Arc<WaveformBuffer> {
        match self {
            WaveSource::Static { output, .. } => output,
            WaveSource::Table { table, .. } => table.output(),
        }
    }
}

fn wave_lfo(patch: &Patch) -> Lfo {
    // Unipolar so the scan only moves forward of the wave_mix offset
    Lfo::new(LfoShape::Sine, patch.wave_mix_lfo_rate()).with_scale_offset(0.5, 0.5)
}

/// Polyphonic two-oscillator instrument.
///
/// Holds at most one [`Voice`] per note. A note-on for a note that is
/// already sounding retriggers it: the old oscillators are released and a
/// fresh voice takes their place.
///
/// # Example
///
/// ```rust
/// use picotouch_synth::{AudioSink, Instrument, MemoryWavetables, Patch, SoftwareMixer};
///
/// let mut loader = MemoryWavetables::new();
/// let mut inst = Instrument::new(SoftwareMixer::new(28000.0), Patch::default(), &mut loader)
///     .unwrap();
///
/// inst.note_on(60, 127).unwrap();
/// inst.update(0.01).unwrap();
/// assert_eq!(inst.voice_count(), 1);
/// assert_eq!(inst.sink().active(), 2); // detuned pair
///
/// inst.note_off(60);
/// assert_eq!(inst.voice_count(), 0);
/// ```
pub struct Instrument<S: AudioSink> {
    sink: S,
    patch: Patch,
    voices: BTreeMap<u8, Voice>,
    source: WaveSource,
    wave_lfo: Lfo,
}

impl<S: AudioSink> core::fmt::Debug for Instrument<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Instrument")
            .field("patch", &self.patch.name())
            .field("voices", &self.voices.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl<S: AudioSink> Instrument<S> {
    /// Creates an instrument playing `patch` through `sink`.
    pub fn new(sink: S, patch: Patch, loader: &mut dyn WavetableLoader) -> Result<Self> {
        let source = WaveSource::build(&patch, loader)?;
        Ok(Self {
            sink,
            wave_lfo: wave_lfo(&patch),
            patch,
            voices: BTreeMap::new(),
            source,
        })
    }

    /// Switches to `patch`.
    ///
    /// Sounding voices keep playing on the waveform they started with. The
    /// open wavetable is reused when the new patch names the same one.
    /// Nothing changes if the new wave source cannot be loaded.
    pub fn load_patch(&mut self, patch: Patch, loader: &mut dyn WavetableLoader) -> Result<()> {
        self.apply_patch(patch, loader, false)
    }

    /// Releases every voice and reloads the current patch from scratch.
    pub fn reload_patch(&mut self, loader: &mut dyn WavetableLoader) -> Result<()> {
        self.note_off_all();
        self.apply_patch(self.patch.clone(), loader, true)
    }

    fn apply_patch(
        &mut self,
        patch: Patch,
        loader: &mut dyn WavetableLoader,
        force: bool,
    ) -> Result<()> {
        if force || !self.source.serves_table(&patch) {
            self.source = WaveSource::build(&patch, loader)?;
        }
        self.wave_lfo = wave_lfo(&patch);

        #[cfg(feature = "tracing")]
        tracing::info!(patch = patch.name(), wave = %patch.wave_select(), "patch loaded");

        self.patch = patch;
        Ok(())
    }

    /// Starts `note`.
    ///
    /// Fails with [`SynthError::NoFreeVoices`] when the sink is full; the
    /// note is then dropped entirely.
    pub fn note_on(&mut self, note: u8, velocity: u8) -> Result<()> {
        if let Some(old) = self.voices.remove(&note) {
            self.release_voice(&old);
        }

        let frequency = midi_to_freq(note);
        let waveform = Arc::clone(self.source.output());
        let envelope = *self.patch.amp_env();
        let velocity_gain = f32::from(velocity.min(127)) / 127.0;

        let mut configs = Vec::with_capacity(2);
        configs.push(OscillatorConfig {
            frequency,
            waveform: Arc::clone(&waveform),
            envelope,
            velocity: velocity_gain,
        });
        if self.patch.has_second_osc() {
            configs.push(OscillatorConfig {
                frequency: frequency * self.patch.detune(),
                waveform,
                envelope,
                velocity: velocity_gain,
            });
        }

        let ids = match self.sink.press(&configs) {
            Ok(ids) => ids,
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(note, error = %err, "note dropped");
                return Err(err);
            }
        };
        let osc1 = ids.first().copied().ok_or(SynthError::NoFreeVoices)?;

        let filter = self.filter_settings(0.0);
        let voice = Voice::new(
            note,
            velocity,
            osc1,
            ids.get(1).copied(),
            envelope,
            self.patch.filter_env().attack_time,
            filter,
        );
        for id in voice.oscillators() {
            self.sink.set_filter(id, filter);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(note, velocity, "note on");

        self.voices.insert(note, voice);
        Ok(())
    }

    /// Releases `note` and returns its voice. No-op if it is not sounding.
    pub fn note_off(&mut self, note: u8) -> Option<Voice> {
        let voice = self.voices.remove(&note)?;
        self.release_voice(&voice);

        #[cfg(feature = "tracing")]
        tracing::debug!(note, "note off");

        Some(voice)
    }

    /// Releases every sounding note.
    pub fn note_off_all(&mut self) {
        let voices = core::mem::take(&mut self.voices);
        for voice in voices.values() {
            self.release_voice(voice);
        }
    }

    fn release_voice(&mut self, voice: &Voice) {
        let ids: Vec<OscId> = voice.oscillators().collect();
        self.sink.release(&ids);
    }

    /// Re-applies the patch detune to every sounding note.
    ///
    /// With detune 0 the second oscillators are released.
    pub fn redetune(&mut self) {
        let detune = self.patch.detune();
        for voice in self.voices.values_mut() {
            let Some(osc2) = voice.osc2() else { continue };
            if detune > 0.0 {
                self.sink
                    .set_frequency(osc2, midi_to_freq(voice.note()) * detune);
            } else {
                self.sink.release(&[osc2]);
                voice.set_osc2(None);
            }
        }
    }

    /// Control-rate update, `dt` seconds after the previous one.
    ///
    /// Advances the wave LFO and, while notes are sounding, rewrites the
    /// shared waveform and each voice's filter. A wavetable read error is
    /// returned after the voices have been updated.
    pub fn update(&mut self, dt: f32) -> Result<()> {
        self.wave_lfo.set_rate(self.patch.wave_mix_lfo_rate());
        let lfo = self.wave_lfo.advance(dt);

        if self.voices.is_empty() {
            return Ok(());
        }

        let mix = self.patch.wave_mix();
        let scan = match &mut self.source {
            WaveSource::Table { table, .. } => {
                let pos = lfo * self.patch.wave_mix_lfo_amount() * 10.0
                    + mix * table.frame_count() as f32;
                table.set_wave_pos(pos)
            }
            WaveSource::Static {
                output,
                a,
                b: Some(b),
            } => {
                output.write_lerp(a.as_slice(), b.as_slice(), mix);
                Ok(())
            }
            WaveSource::Static { b: None, .. } => Ok(()),
        };

        let kind = self.patch.filter_kind();
        let base = self.patch.cutoff();
        let resonance = self.patch.resonance();
        for voice in self.voices.values_mut() {
            let ramp = voice.advance(dt);
            let filter = FilterSettings {
                kind,
                cutoff: (base + FILTER_SWEEP_HZ * ramp).max(0.0),
                resonance,
            };
            for id in voice.oscillators() {
                self.sink.set_filter(id, filter);
            }
            voice.set_filter(filter);
        }

        if let Err(_err) = &scan {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %_err, "wavetable scan failed");
        }
        scan
    }

    fn filter_settings(&self, ramp: f32) -> FilterSettings {
        FilterSettings {
            kind: self.patch.filter_kind(),
            cutoff: (self.patch.cutoff() + FILTER_SWEEP_HZ * ramp).max(0.0),
            resonance: self.patch.resonance(),
        }
    }

    /// Active patch.
    pub fn patch(&self) -> &Patch {
        &self.patch
    }

    /// Active patch, for live parameter changes.
    ///
    /// Numeric changes take effect at the next [`update`](Self::update);
    /// wave source changes need [`reload_patch`](Self::reload_patch).
    pub fn patch_mut(&mut self) -> &mut Patch {
        &mut self.patch
    }

    /// Audio sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Audio sink, e.g. for rendering.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Voice for `note`, if sounding.
    pub fn voice(&self, note: u8) -> Option<&Voice> {
        self.voices.get(&note)
    }

    /// Sounding voices in note order.
    pub fn voices(&self) -> impl Iterator<Item = &Voice> {
        self.voices.values()
    }

    /// Number of sounding notes.
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    /// Waveform new notes start with.
    pub fn waveform(&self) -> &Arc<WaveformBuffer> {
        self.source.output()
    }

    /// Open wavetable, for wavetable patches.
    pub fn wavetable(&self) -> Option<&Wavetable> {
        match &self.source {
            WaveSource::Table { table, .. } => Some(table),
            WaveSource::Static { .. } => None,
        }
    }

    /// Current wave LFO output (0.0 - 1.0).
    pub fn wave_lfo_value(&self) -> f32 {
        self.wave_lfo.value()
    }
}
