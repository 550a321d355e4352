//! Device configuration loaded from TOML.
//!
//! Every field has a default matching the stock firmware, so a config file
//! only needs the values it changes:
//!
//! ```toml
//! base_note = 48
//! wave_root = "sd"
//!
//! [tasks]
//! led_ms = 50
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Errors raised while loading or checking a config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A value is out of range
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }
}

/// Minimum re-entry interval of each scheduler task, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TaskIntervals {
    /// Touch scan and note dispatch.
    pub touch_ms: u64,
    /// Zone stepping and instrument update.
    pub modulation_ms: u64,
    /// LED refresh.
    pub led_ms: u64,
    /// MIDI input poll.
    pub midi_ms: u64,
    /// Status logging.
    pub diagnostics_ms: u64,
    /// Host audio render.
    pub audio_ms: u64,
}

impl Default for TaskIntervals {
    fn default() -> Self {
        Self {
            touch_ms: 0,
            modulation_ms: 10,
            led_ms: 30,
            midi_ms: 0,
            diagnostics_ms: 300,
            audio_ms: 10,
        }
    }
}

/// Settings for drum-machine mode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DrumConfig {
    /// Directory holding one sub-directory per kit.
    pub kit_root: PathBuf,
    /// Kits behind mode pads A, B and C.
    pub kits: Vec<String>,
    /// Note of trigger slot 0 at the home octave.
    pub base_note: u8,
    /// Lowest base note reachable with octave down.
    pub octave_min: u8,
    /// Highest base note reachable with octave up.
    pub octave_max: u8,
    /// Mixer output rate in Hz.
    pub sample_rate: u32,
}

impl Default for DrumConfig {
    fn default() -> Self {
        Self {
            kit_root: PathBuf::from("drum_wavs"),
            kits: vec!["kitA".into(), "kitB".into(), "kitC".into()],
            base_note: 24,
            octave_min: 0,
            octave_max: 60,
            sample_rate: 11025,
        }
    }
}

/// Whole-device configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DeviceConfig {
    /// Synth output rate in Hz.
    pub sample_rate: u32,
    /// Note of pad 0 at the home octave.
    pub base_note: u8,
    /// Lowest base note reachable with octave down.
    pub octave_min: u8,
    /// Highest base note reachable with octave up.
    pub octave_max: u8,
    /// Consecutive agreeing polls before a pad changes state.
    pub touch_confirmation: u8,
    /// Mixer oscillator slots.
    pub voices: usize,
    /// Directory that device wave paths such as `/wav` resolve under.
    pub wave_root: PathBuf,
    /// Patch loaded at start (0 = A).
    pub initial_patch: usize,
    /// Per-task time budget in microseconds before an overrun is logged.
    pub task_budget_us: u64,
    /// Task intervals.
    pub tasks: TaskIntervals,
    /// Drum-machine mode.
    pub drums: DrumConfig,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            sample_rate: 28000,
            base_note: 36,
            octave_min: 12,
            octave_max: 84,
            touch_confirmation: 1,
            voices: 12,
            wave_root: PathBuf::from("."),
            initial_patch: 0,
            task_budget_us: 5000,
            tasks: TaskIntervals::default(),
            drums: DrumConfig::default(),
        }
    }
}

impl DeviceConfig {
    /// Load and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Convert the config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 || self.drums.sample_rate == 0 {
            return Err(ConfigError::Invalid("sample rates must be non-zero".into()));
        }
        check_octaves("", self.base_note, self.octave_min, self.octave_max)?;
        check_octaves(
            "drums.",
            self.drums.base_note,
            self.drums.octave_min,
            self.drums.octave_max,
        )?;
        if self.initial_patch > 2 {
            return Err(ConfigError::Invalid(format!(
                "initial_patch {} is not 0, 1 or 2",
                self.initial_patch
            )));
        }
        if self.voices < 2 {
            return Err(ConfigError::Invalid("voices must be at least 2".into()));
        }
        if self.drums.kits.is_empty() {
            return Err(ConfigError::Invalid(
                "drums.kits must name at least one kit".into(),
            ));
        }
        Ok(())
    }
}

fn check_octaves(prefix: &str, base: u8, min: u8, max: u8) -> Result<(), ConfigError> {
    // Pad 16 must still map to a valid note
    if min > max || base < min || base > max || u16::from(max) + 16 > 127 {
        return Err(ConfigError::Invalid(format!(
            "{prefix}base_note {base} must lie in {prefix}octave_min..={prefix}octave_max \
             ({min}..={max}), with octave_max at most 111"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_firmware() {
        let config = DeviceConfig::default();
        assert_eq!(config.base_note, 36);
        assert_eq!(config.tasks.modulation_ms, 10);
        assert_eq!(config.tasks.led_ms, 30);
        assert_eq!(config.tasks.diagnostics_ms, 300);
        assert_eq!(config.drums.base_note, 24);
        assert_eq!(config.drums.sample_rate, 11025);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_takes_defaults() {
        let config = DeviceConfig::from_toml(
            r#"
            base_note = 48
            [tasks]
            led_ms = 50
            "#,
        )
        .unwrap();
        assert_eq!(config.base_note, 48);
        assert_eq!(config.tasks.led_ms, 50);
        assert_eq!(config.tasks.modulation_ms, 10);
        assert_eq!(config.sample_rate, 28000);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = DeviceConfig::default();
        let text = config.to_toml().unwrap();
        assert_eq!(DeviceConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            DeviceConfig::from_toml("base_note = 100"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(DeviceConfig::from_toml("initial_patch = 3").is_err());
        assert!(DeviceConfig::from_toml("sample_rate = 0").is_err());
        assert!(DeviceConfig::from_toml("octave_max = 120\nbase_note = 36").is_err());
        assert!(matches!(
            DeviceConfig::from_toml("base_note = \"low\""),
            Err(ConfigError::TomlParse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = DeviceConfig::load("/nonexistent/picotouch.toml").unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }
}
