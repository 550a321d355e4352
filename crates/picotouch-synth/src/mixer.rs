//! Software rendition of the audio output engine.
//!
//! [`SoftwareMixer`] implements [`AudioSink`] and [`SamplePlayer`] in plain
//! Rust so the voice engine can be run and tested on a host. Each
//! oscillator gets its own amplitude envelope and optional state-variable
//! filter; released oscillators keep sounding until their envelope is idle.

use alloc::vec;
use alloc::vec::Vec;

use picotouch_core::{StateVariableFilter, flush_denormal};

use crate::drums::Sample;
use crate::envelope::{AdsrEnvelope, EnvelopeState};
use crate::error::{Result, SynthError};
use crate::oscillator::TableOscillator;
use crate::sink::{AudioSink, FilterSettings, OscId, OscillatorConfig, SamplePlayer};

/// Default number of oscillator slots.
pub const DEFAULT_VOICES: usize = 12;

/// Default number of sample channels, one per drum trigger pad.
pub const DEFAULT_SAMPLE_CHANNELS: usize = 10;

#[derive(Debug, Clone)]
struct MixerVoice {
    id: OscId,
    osc: TableOscillator,
    env: AdsrEnvelope,
    filter: Option<StateVariableFilter>,
    velocity: f32,
    /// Press order, for stealing
    age: u64,
    held: bool,
}

impl MixerVoice {
    #[inline]
    fn process(&mut self, dt: f32) -> f32 {
        let level = self.env.advance(dt);
        let dry = self.osc.advance() * level * self.velocity;
        match &mut self.filter {
            Some(filter) => filter.process(dry),
            None => dry,
        }
    }
}

#[derive(Debug, Clone)]
struct SampleChannel {
    sample: Sample,
    /// Fractional read position in source samples
    pos: f32,
    /// Source samples per output sample
    step: f32,
    looping: bool,
}

impl SampleChannel {
    /// Next output sample, or `None` once a one-shot has finished.
    #[inline]
    fn process(&mut self) -> Option<f32> {
        let data = &self.sample.data;
        let len = data.len();
        if len == 0 {
            return None;
        }
        if self.pos >= len as f32 {
            if !self.looping {
                return None;
            }
            self.pos %= len as f32;
        }
        let out = f32::from(data[self.pos as usize]) / 32768.0;
        self.pos += self.step;
        Some(out)
    }
}

/// Polyphonic oscillator and sample mixer.
///
/// ## Parameters
/// - `sample_rate`: output rate in Hz
/// - `capacity`: oscillator slots, shared by held notes and release tails
///   (default [`DEFAULT_VOICES`])
/// - `level`: master gain applied before clipping (default 0.75)
///
/// When every slot is taken, pressing steals the oldest released
/// oscillator. Held oscillators are never stolen; if only held oscillators
/// remain, [`press`](AudioSink::press) fails with
/// [`SynthError::NoFreeVoices`].
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use picotouch_synth::{
///     AudioSink, EnvelopeParams, OscillatorConfig, SoftwareMixer, WaveformBuffer, waves,
/// };
///
/// let mut mixer = SoftwareMixer::new(28000.0);
/// let saw = Arc::new(WaveformBuffer::from_samples(&waves::make("saw").unwrap()));
/// let ids = mixer
///     .press(&[OscillatorConfig {
///         frequency: 220.0,
///         waveform: saw,
///         envelope: EnvelopeParams::default(),
///         velocity: 1.0,
///     }])
///     .unwrap();
///
/// let mut block = vec![0.0; 256];
/// mixer.render(&mut block);
/// assert!(block.iter().any(|&s| s != 0.0));
///
/// mixer.release(&ids);
/// assert_eq!(mixer.active(), 1); // still in its release tail
/// ```
#[derive(Debug, Clone)]
pub struct SoftwareMixer {
    sample_rate: f32,
    capacity: usize,
    level: f32,
    voices: Vec<MixerVoice>,
    channels: Vec<Option<SampleChannel>>,
    next_id: u32,
    age_counter: u64,
}

impl SoftwareMixer {
    /// Creates a mixer with default capacity and channel count.
    pub fn new(sample_rate: f32) -> Self {
        Self::with_capacity(sample_rate, DEFAULT_VOICES, DEFAULT_SAMPLE_CHANNELS)
    }

    /// Creates a mixer with `voices` oscillator slots and `channels` sample
    /// channels.
    pub fn with_capacity(sample_rate: f32, voices: usize, channels: usize) -> Self {
        Self {
            sample_rate: sample_rate.max(1.0),
            capacity: voices,
            level: 0.75,
            voices: Vec::with_capacity(voices),
            channels: vec![None; channels],
            next_id: 0,
            age_counter: 0,
        }
    }

    /// Output sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Sets the master gain.
    pub fn set_level(&mut self, level: f32) {
        self.level = level.max(0.0);
    }

    /// Master gain.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Number of sample channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of oscillators whose note is still held.
    pub fn held(&self) -> usize {
        self.voices.iter().filter(|v| v.held).count()
    }

    /// Renders mono samples into `out` (-1.0 to 1.0).
    ///
    /// Oscillators whose release has finished are dropped at the end of the
    /// block, along with their waveform references.
    pub fn render(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = self.next_sample();
        }
        self.prune();
    }

    /// Renders 16-bit samples into `out`.
    pub fn render_i16(&mut self, out: &mut [i16]) {
        for sample in out.iter_mut() {
            *sample = (self.next_sample() * 32767.0) as i16;
        }
        self.prune();
    }

    #[inline]
    fn next_sample(&mut self) -> f32 {
        let dt = 1.0 / self.sample_rate;
        let mut mix = 0.0;
        for voice in &mut self.voices {
            mix += voice.process(dt);
        }
        for slot in &mut self.channels {
            if let Some(channel) = slot {
                match channel.process() {
                    Some(s) => mix += s,
                    None => *slot = None,
                }
            }
        }
        flush_denormal(mix * self.level).clamp(-1.0, 1.0)
    }

    fn prune(&mut self) {
        self.voices.retain(|v| v.env.is_active());
    }

    fn find(&mut self, id: OscId) -> Option<&mut MixerVoice> {
        self.voices.iter_mut().find(|v| v.id == id)
    }

    /// Removes the oldest released oscillator. Returns false if none.
    fn steal_released(&mut self) -> bool {
        let oldest = self
            .voices
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.held)
            .min_by_key(|(_, v)| v.age)
            .map(|(i, _)| i);
        match oldest {
            Some(i) => {
                let _stolen = self.voices.swap_remove(i);
                #[cfg(feature = "tracing")]
                tracing::debug!(id = _stolen.id.0, "stole released oscillator");
                true
            }
            None => false,
        }
    }
}

impl AudioSink for SoftwareMixer {
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn active(&self) -> usize {
        self.voices.len()
    }

    fn press(&mut self, oscillators: &[OscillatorConfig]) -> Result<Vec<OscId>> {
        let free = self.capacity.saturating_sub(self.voices.len());
        let released = self.voices.len() - self.held();
        if oscillators.len() > free + released {
            return Err(SynthError::NoFreeVoices);
        }
        for _ in free..oscillators.len() {
            self.steal_released();
        }

        let mut ids = Vec::with_capacity(oscillators.len());
        for config in oscillators {
            let id = OscId(self.next_id);
            self.next_id = self.next_id.wrapping_add(1);
            self.age_counter += 1;

            let mut osc = TableOscillator::new(config.waveform.clone(), self.sample_rate);
            osc.set_frequency(config.frequency);
            let mut env = AdsrEnvelope::new(config.envelope);
            env.gate_on();

            self.voices.push(MixerVoice {
                id,
                osc,
                env,
                filter: None,
                velocity: config.velocity.clamp(0.0, 1.0),
                age: self.age_counter,
                held: true,
            });
            ids.push(id);
        }
        Ok(ids)
    }

    fn release(&mut self, ids: &[OscId]) {
        for voice in self.voices.iter_mut().filter(|v| ids.contains(&v.id)) {
            voice.held = false;
            voice.env.gate_off();
        }
    }

    fn set_filter(&mut self, id: OscId, settings: FilterSettings) {
        let sample_rate = self.sample_rate;
        if let Some(voice) = self.find(id) {
            let filter = voice
                .filter
                .get_or_insert_with(|| StateVariableFilter::new(sample_rate));
            filter.set_output_type(settings.kind.into());
            filter.set_cutoff(settings.cutoff);
            filter.set_resonance(settings.resonance);
        }
    }

    fn set_frequency(&mut self, id: OscId, frequency: f32) {
        if let Some(voice) = self.find(id) {
            voice.osc.set_frequency(frequency);
        }
    }

    fn envelope_state(&self, id: OscId) -> Option<EnvelopeState> {
        self.voices
            .iter()
            .find(|v| v.id == id)
            .map(|v| v.env.state())
    }
}

impl SamplePlayer for SoftwareMixer {
    fn play_sample(&mut self, channel: usize, sample: &Sample, looping: bool) {
        let step = sample.sample_rate as f32 / self.sample_rate;
        match self.channels.get_mut(channel) {
            Some(slot) => {
                *slot = Some(SampleChannel {
                    sample: sample.clone(),
                    pos: 0.0,
                    step,
                    looping,
                });
            }
            None => {
                #[cfg(feature = "tracing")]
                tracing::warn!(channel, "no such sample channel");
            }
        }
    }

    fn stop_sample(&mut self, channel: usize) {
        if let Some(slot) = self.channels.get_mut(channel) {
            *slot = None;
        }
    }

    fn is_playing(&self, channel: usize) -> bool {
        matches!(self.channels.get(channel), Some(Some(_)))
    }
}
