//! Patch model: everything that defines how the instrument sounds.
//!
//! A [`Patch`] is a plain typed struct. Its wave source is identified by a
//! [`WaveSelect`], whose string form (`"wtb:PLAITS02"`, `"osc:SAW/square"`)
//! is the one serialized piece of a patch.

use alloc::string::{String, ToString};
use core::fmt;
use core::str::FromStr;

use picotouch_core::SvfOutput;

use crate::envelope::EnvelopeParams;
use crate::error::{Result, SynthError};

/// Upper bound on the wave-mix LFO depth.
///
/// Touch zones set up to 2.0 and the mod wheel up to 50.0.
pub const MAX_LFO_AMOUNT: f32 = 50.0;

/// Where the oscillator waveform comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum WaveKind {
    /// Built-in static waveforms, optionally mixed A/B.
    #[default]
    Osc,
    /// A wavetable file scanned by position.
    Wtb,
}

impl WaveKind {
    /// Short lowercase tag used in wave-select strings.
    pub const fn as_str(self) -> &'static str {
        match self {
            WaveKind::Osc => "osc",
            WaveKind::Wtb => "wtb",
        }
    }
}

impl fmt::Display for WaveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WaveKind {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "osc" => Ok(WaveKind::Osc),
            "wtb" => Ok(WaveKind::Wtb),
            _ => Err(SynthError::parse(s, "wave kind must be 'osc' or 'wtb'")),
        }
    }
}

/// Wave source of a patch.
///
/// For [`WaveKind::Osc`] `primary` and `secondary` name static waveforms
/// (see [`waves::make`](crate::waves::make)); for [`WaveKind::Wtb`]
/// `primary` is the wavetable file stem.
///
/// # Example
///
/// ```rust
/// use picotouch_synth::{WaveKind, WaveSelect};
///
/// let ws = WaveSelect::decode("osc:SAW/square").unwrap();
/// assert_eq!(ws.kind, WaveKind::Osc);
/// assert_eq!(ws.primary, "SAW");
/// assert_eq!(ws.secondary.as_deref(), Some("square"));
/// assert_eq!(ws.encode(), "osc:SAW/square");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WaveSelect {
    /// Static oscillator or wavetable.
    pub kind: WaveKind,
    /// Waveform name or wavetable stem.
    pub primary: String,
    /// Optional second waveform mixed in by `wave_mix`.
    pub secondary: Option<String>,
}

impl WaveSelect {
    /// Builds a selector without validation.
    pub fn new(kind: WaveKind, primary: impl Into<String>, secondary: Option<String>) -> Self {
        Self {
            kind,
            primary: primary.into(),
            secondary,
        }
    }

    /// Formats as `"<kind>:<primary>[/<secondary>]"`.
    ///
    /// A trailing `.wav` (any case) is stripped from the primary name.
    pub fn encode(&self) -> String {
        let primary = strip_wav(&self.primary);
        let mut out = String::with_capacity(5 + primary.len());
        out.push_str(self.kind.as_str());
        out.push(':');
        out.push_str(primary);
        if let Some(secondary) = &self.secondary {
            out.push('/');
            out.push_str(secondary);
        }
        out
    }

    /// Parses `"<kind>:<primary>[/<secondary>]"`.
    ///
    /// Exactly one `:` and at most one `/` are allowed. The kind must be
    /// `osc` or `wtb` and the primary name must be non-empty. An empty
    /// secondary (`"osc:SAW/"`) means none.
    pub fn decode(input: &str) -> Result<Self> {
        let (kind, oscs) = input
            .split_once(':')
            .ok_or_else(|| SynthError::parse(input, "missing ':'"))?;
        if oscs.contains(':') {
            return Err(SynthError::parse(input, "more than one ':'"));
        }
        let kind = kind
            .parse::<WaveKind>()
            .map_err(|_| SynthError::parse(input, "wave kind must be 'osc' or 'wtb'"))?;

        let (primary, secondary) = match oscs.split_once('/') {
            Some((_, rest)) if rest.contains('/') => {
                return Err(SynthError::parse(input, "more than one '/'"));
            }
            Some((primary, secondary)) => (primary, Some(secondary)),
            None => (oscs, None),
        };
        if primary.is_empty() {
            return Err(SynthError::parse(input, "empty primary wave"));
        }

        Ok(Self {
            kind,
            primary: primary.to_string(),
            secondary: secondary.filter(|s| !s.is_empty()).map(ToString::to_string),
        })
    }
}

impl fmt::Display for WaveSelect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for WaveSelect {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}

/// `name` without a trailing `.wav` in any case.
pub fn strip_wav(name: &str) -> &str {
    let n = name.len();
    if n >= 4 && name.is_char_boundary(n - 4) && name[n - 4..].eq_ignore_ascii_case(".wav") {
        &name[..n - 4]
    } else {
        name
    }
}

/// Filter response applied to each voice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FilterKind {
    /// Low-pass.
    #[default]
    LowPass,
    /// High-pass.
    HighPass,
    /// Band-pass.
    BandPass,
}

impl FilterKind {
    /// Two-letter tag (`LP`, `HP`, `BP`).
    pub const fn as_str(self) -> &'static str {
        match self {
            FilterKind::LowPass => "LP",
            FilterKind::HighPass => "HP",
            FilterKind::BandPass => "BP",
        }
    }
}

impl From<FilterKind> for SvfOutput {
    fn from(kind: FilterKind) -> Self {
        match kind {
            FilterKind::LowPass => SvfOutput::Lowpass,
            FilterKind::HighPass => SvfOutput::Highpass,
            FilterKind::BandPass => SvfOutput::Bandpass,
        }
    }
}

/// Instrument settings.
///
/// ## Parameters
/// - `wave_mix`: 0.0 plays the primary wave, 1.0 the secondary; for
///   wavetables it is the scan offset as a fraction of the table (0.0 - 1.0)
/// - `wave_mix_lfo_amount`: wavetable scan depth of the global LFO
///   (0.0 - 50.0, default 3.0)
/// - `wave_mix_lfo_rate`: global LFO rate in Hz (default 0.5)
/// - `detune`: frequency ratio of the second oscillator (default 1.01,
///   0.0 disables it)
/// - `cutoff` / `resonance`: filter base frequency in Hz and Q (defaults
///   8000 / 1.2)
///
/// # Example
///
/// ```rust
/// use picotouch_synth::{FilterKind, Patch, WaveKind};
///
/// let patch = Patch::builder("pad")
///     .wave("osc:SAW/square")
///     .filter(FilterKind::BandPass, 1200.0, 0.7)
///     .build()
///     .unwrap();
/// assert_eq!(patch.wave_kind(), WaveKind::Osc);
/// assert_eq!(patch.secondary_wave(), Some("square"));
/// assert_eq!(patch.encode(), "osc:SAW/square");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    name: String,
    wave: WaveSelect,
    wave_dir: String,
    wave_mix: f32,
    wave_mix_lfo_amount: f32,
    wave_mix_lfo_rate: f32,
    detune: f32,
    filter_kind: FilterKind,
    cutoff: f32,
    resonance: f32,
    amp_env: EnvelopeParams,
    filter_env: EnvelopeParams,
}

impl Default for Patch {
    fn default() -> Self {
        Self {
            name: String::from("init"),
            wave: WaveSelect::new(WaveKind::Osc, "SAW", None),
            wave_dir: String::from("/wav"),
            wave_mix: 0.0,
            wave_mix_lfo_amount: 3.0,
            wave_mix_lfo_rate: 0.5,
            detune: 1.01,
            filter_kind: FilterKind::LowPass,
            cutoff: 8000.0,
            resonance: 1.2,
            amp_env: EnvelopeParams::default(),
            filter_env: EnvelopeParams::default(),
        }
    }
}

/// Keeps `current` when `value` is NaN.
#[inline]
fn finite_or(value: f32, current: f32) -> f32 {
    if value.is_nan() { current } else { value }
}

impl Patch {
    /// Starts a builder from the default patch.
    pub fn builder(name: impl Into<String>) -> PatchBuilder {
        PatchBuilder::new(name)
    }

    /// Patch name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wave source selector.
    pub fn wave_select(&self) -> &WaveSelect {
        &self.wave
    }

    /// Static oscillator or wavetable.
    pub fn wave_kind(&self) -> WaveKind {
        self.wave.kind
    }

    /// Primary waveform name or wavetable stem, without any `.wav`.
    pub fn primary_wave(&self) -> &str {
        strip_wav(&self.wave.primary)
    }

    /// Secondary waveform name, if any.
    pub fn secondary_wave(&self) -> Option<&str> {
        self.wave.secondary.as_deref()
    }

    /// Directory holding wavetable files.
    pub fn wave_dir(&self) -> &str {
        &self.wave_dir
    }

    /// Wave-select string of this patch.
    pub fn encode(&self) -> String {
        self.wave.encode()
    }

    /// Replaces the wave source from a wave-select string.
    ///
    /// The patch is unchanged if the string does not decode.
    pub fn set_wave_select(&mut self, input: &str) -> Result<()> {
        self.wave = WaveSelect::decode(input)?;
        Ok(())
    }

    /// Replaces the wave source.
    pub fn set_wave(&mut self, wave: WaveSelect) {
        self.wave = wave;
    }

    /// Sets the wavetable directory.
    pub fn set_wave_dir(&mut self, dir: impl Into<String>) {
        self.wave_dir = dir.into();
    }

    /// A/B mix or wavetable offset (0.0 - 1.0).
    pub fn wave_mix(&self) -> f32 {
        self.wave_mix
    }

    /// Sets the wave mix, clamped to 0.0 - 1.0.
    pub fn set_wave_mix(&mut self, mix: f32) {
        self.wave_mix = finite_or(mix, self.wave_mix).clamp(0.0, 1.0);
    }

    /// Wavetable scan depth of the global LFO.
    pub fn wave_mix_lfo_amount(&self) -> f32 {
        self.wave_mix_lfo_amount
    }

    /// Sets the LFO depth, clamped to 0.0 - [`MAX_LFO_AMOUNT`].
    pub fn set_wave_mix_lfo_amount(&mut self, amount: f32) {
        self.wave_mix_lfo_amount =
            finite_or(amount, self.wave_mix_lfo_amount).clamp(0.0, MAX_LFO_AMOUNT);
    }

    /// Global LFO rate in Hz.
    pub fn wave_mix_lfo_rate(&self) -> f32 {
        self.wave_mix_lfo_rate
    }

    /// Sets the LFO rate (non-negative).
    pub fn set_wave_mix_lfo_rate(&mut self, rate: f32) {
        self.wave_mix_lfo_rate = finite_or(rate, self.wave_mix_lfo_rate).max(0.0);
    }

    /// Second oscillator frequency ratio. 0.0 means no second oscillator.
    pub fn detune(&self) -> f32 {
        self.detune
    }

    /// Sets the detune ratio (non-negative).
    pub fn set_detune(&mut self, detune: f32) {
        self.detune = finite_or(detune, self.detune).max(0.0);
    }

    /// True when notes use a second, detuned oscillator.
    pub fn has_second_osc(&self) -> bool {
        self.detune > 0.0
    }

    /// Filter response.
    pub fn filter_kind(&self) -> FilterKind {
        self.filter_kind
    }

    /// Sets the filter response.
    pub fn set_filter_kind(&mut self, kind: FilterKind) {
        self.filter_kind = kind;
    }

    /// Filter base cutoff in Hz.
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Sets the filter base cutoff (non-negative).
    pub fn set_cutoff(&mut self, hz: f32) {
        self.cutoff = finite_or(hz, self.cutoff).max(0.0);
    }

    /// Filter Q.
    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    /// Sets the filter Q (at least 0.1).
    pub fn set_resonance(&mut self, q: f32) {
        self.resonance = finite_or(q, self.resonance).max(0.1);
    }

    /// Amplitude envelope.
    pub fn amp_env(&self) -> &EnvelopeParams {
        &self.amp_env
    }

    /// Sets the amplitude envelope (clamped).
    pub fn set_amp_env(&mut self, env: EnvelopeParams) {
        self.amp_env = env.clamped();
    }

    /// Filter envelope. Only its attack time shapes the filter sweep.
    pub fn filter_env(&self) -> &EnvelopeParams {
        &self.filter_env
    }

    /// Sets the filter envelope (clamped).
    pub fn set_filter_env(&mut self, env: EnvelopeParams) {
        self.filter_env = env.clamped();
    }
}

/// Validating builder for [`Patch`].
///
/// Starts from [`Patch::default`]. Mix, depth and envelope values are
/// clamped like the setters; [`build`](Self::build) rejects values that
/// cannot be clamped into meaning.
#[derive(Debug, Clone)]
pub struct PatchBuilder {
    patch: Patch,
    wave: Option<String>,
}

impl PatchBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            patch: Patch {
                name: name.into(),
                ..Patch::default()
            },
            wave: None,
        }
    }

    /// Wave source as a wave-select string, decoded by `build`.
    pub fn wave(mut self, wave_select: impl Into<String>) -> Self {
        self.wave = Some(wave_select.into());
        self
    }

    /// Wavetable directory.
    pub fn wave_dir(mut self, dir: impl Into<String>) -> Self {
        self.patch.wave_dir = dir.into();
        self
    }

    /// A/B mix or wavetable offset.
    pub fn wave_mix(mut self, mix: f32) -> Self {
        self.patch.wave_mix = mix;
        self
    }

    /// Global LFO depth and rate.
    pub fn wave_mix_lfo(mut self, amount: f32, rate: f32) -> Self {
        self.patch.wave_mix_lfo_amount = amount;
        self.patch.wave_mix_lfo_rate = rate;
        self
    }

    /// Second oscillator ratio, 0.0 to disable.
    pub fn detune(mut self, detune: f32) -> Self {
        self.patch.detune = detune;
        self
    }

    /// Filter response, cutoff and Q.
    pub fn filter(mut self, kind: FilterKind, cutoff: f32, resonance: f32) -> Self {
        self.patch.filter_kind = kind;
        self.patch.cutoff = cutoff;
        self.patch.resonance = resonance;
        self
    }

    /// Amplitude envelope.
    pub fn amp_env(mut self, env: EnvelopeParams) -> Self {
        self.patch.amp_env = env;
        self
    }

    /// Filter envelope.
    pub fn filter_env(mut self, env: EnvelopeParams) -> Self {
        self.patch.filter_env = env;
        self
    }

    /// Validates and returns the patch.
    ///
    /// Fails with [`SynthError::Parse`] for a bad wave-select string and
    /// [`SynthError::InvalidPatch`] for non-finite numbers, a negative
    /// detune, LFO rate or cutoff, or a non-positive resonance.
    pub fn build(self) -> Result<Patch> {
        let mut patch = self.patch;
        if let Some(wave) = self.wave {
            patch.wave = WaveSelect::decode(&wave)?;
        }
        if patch.name.is_empty() {
            return Err(SynthError::InvalidPatch("name must not be empty"));
        }

        let numbers = [
            patch.wave_mix,
            patch.wave_mix_lfo_amount,
            patch.wave_mix_lfo_rate,
            patch.detune,
            patch.cutoff,
            patch.resonance,
        ];
        if numbers.iter().any(|x| !x.is_finite()) {
            return Err(SynthError::InvalidPatch("parameters must be finite"));
        }
        if patch.detune < 0.0 {
            return Err(SynthError::InvalidPatch("detune must be non-negative"));
        }
        if patch.wave_mix_lfo_rate < 0.0 {
            return Err(SynthError::InvalidPatch("LFO rate must be non-negative"));
        }
        if patch.cutoff < 0.0 {
            return Err(SynthError::InvalidPatch("cutoff must be non-negative"));
        }
        if patch.resonance <= 0.0 {
            return Err(SynthError::InvalidPatch("resonance must be positive"));
        }

        patch.wave_mix = patch.wave_mix.clamp(0.0, 1.0);
        patch.wave_mix_lfo_amount = patch.wave_mix_lfo_amount.clamp(0.0, MAX_LFO_AMOUNT);
        patch.amp_env = patch.amp_env.clamped();
        patch.filter_env = patch.filter_env.clamped();
        Ok(patch)
    }
}

/// The three patches selectable from the mode pads.
///
/// - `wtbA`: scans the `PLAITS02` wavetable, slow attack
/// - `sawB`: saw/square mix, snappy attack
/// - `mixC`: wider detune through a band-pass filter with a slow sweep
pub fn factory_patches() -> [Patch; 3] {
    let a = Patch {
        name: String::from("wtbA"),
        wave: WaveSelect::new(WaveKind::Wtb, "PLAITS02", None),
        wave_mix_lfo_amount: 0.23,
        amp_env: EnvelopeParams {
            attack_time: 0.2,
            attack_level: 0.8,
            release_time: 0.5,
            ..EnvelopeParams::default()
        },
        ..Patch::default()
    };

    let b = Patch {
        name: String::from("sawB"),
        wave: WaveSelect::new(WaveKind::Osc, "SAW", Some(String::from("square"))),
        resonance: 1.8,
        amp_env: EnvelopeParams {
            attack_time: 0.01,
            release_time: 0.5,
            ..EnvelopeParams::default()
        },
        ..Patch::default()
    };

    let c = Patch {
        name: String::from("mixC"),
        wave: WaveSelect::new(WaveKind::Osc, "SAW", Some(String::from("square"))),
        detune: 1.02,
        filter_kind: FilterKind::BandPass,
        resonance: 0.5,
        filter_env: EnvelopeParams {
            attack_time: 0.5,
            attack_level: 0.8,
            ..EnvelopeParams::default()
        },
        amp_env: EnvelopeParams {
            release_time: 1.0,
            ..EnvelopeParams::default()
        },
        ..Patch::default()
    };

    [a, b, c]
}
