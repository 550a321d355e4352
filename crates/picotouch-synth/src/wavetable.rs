//! Wavetable scanning and shared waveform buffers.
//!
//! A wavetable is a run of equal-length single-cycle frames. Scanning to a
//! fractional position crossfades the two neighbouring frames into a
//! [`WaveformBuffer`] that every oscillator of the instrument reads from.
//! The buffer is rewritten in place, so oscillators pick up the new shape
//! without being re-registered.
//!
//! Frames come from a [`FrameSource`]: [`MemoryFrames`] for tables already
//! in RAM, or a streaming file reader supplied by the I/O layer.

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicI16, Ordering};

use crate::error::{Result, SynthError};

/// Samples per frame in the device's wavetable files.
pub const DEFAULT_FRAME_SIZE: usize = 256;

/// Fixed-length block of 16-bit samples shared between the control path and
/// the audio path.
///
/// Each sample is an atomic cell. Writers overwrite samples in place while
/// readers may be mid-cycle; a reader sees every sample either before or
/// after the write, never torn. The length never changes.
#[derive(Debug)]
pub struct WaveformBuffer {
    cells: Box<[AtomicI16]>,
}

impl WaveformBuffer {
    /// Buffer of `len` zero samples.
    pub fn zeroed(len: usize) -> Self {
        Self {
            cells: (0..len).map(|_| AtomicI16::new(0)).collect(),
        }
    }

    /// Buffer holding a copy of `samples`.
    pub fn from_samples(samples: &[i16]) -> Self {
        Self {
            cells: samples.iter().map(|&s| AtomicI16::new(s)).collect(),
        }
    }

    /// Number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True for a zero-length buffer.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Sample at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<i16> {
        self.cells.get(index).map(|c| c.load(Ordering::Relaxed))
    }

    /// Sample at `index` modulo the buffer length. Zero for an empty buffer.
    #[inline]
    pub fn sample_wrapped(&self, index: usize) -> i16 {
        match self.cells.len() {
            0 => 0,
            len => self.cells[index % len].load(Ordering::Relaxed),
        }
    }

    /// Overwrites the sample at `index`. Ignored when out of range.
    #[inline]
    pub fn set(&self, index: usize, value: i16) {
        if let Some(cell) = self.cells.get(index) {
            cell.store(value, Ordering::Relaxed);
        }
    }

    /// Copies `samples` over the start of the buffer.
    ///
    /// Extra samples are dropped; a short slice leaves the tail untouched.
    pub fn write(&self, samples: &[i16]) {
        for (cell, &s) in self.cells.iter().zip(samples) {
            cell.store(s, Ordering::Relaxed);
        }
    }

    /// Writes `(1 - t) * a[i] + t * b[i]` into every sample.
    ///
    /// `t` is clamped to 0.0 - 1.0. Only the overlap of the three lengths is
    /// written.
    pub fn write_lerp(&self, a: &[i16], b: &[i16], t: f32) {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        for ((cell, &x), &y) in self.cells.iter().zip(a).zip(b) {
            let mixed = picotouch_core::lerp(f32::from(x), f32::from(y), t);
            cell.store(mixed as i16, Ordering::Relaxed);
        }
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> Vec<i16> {
        self.cells.iter().map(|c| c.load(Ordering::Relaxed)).collect()
    }
}

/// Random-access source of wavetable samples.
pub trait FrameSource {
    /// Total samples available.
    fn sample_count(&self) -> usize;

    /// Fills `out` with the samples starting at sample index `start`.
    ///
    /// Fails with [`SynthError::Io`] if the read cannot be completed.
    fn read_frame(&mut self, start: usize, out: &mut [i16]) -> Result<()>;
}

/// Frames held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryFrames {
    samples: Vec<i16>,
}

impl MemoryFrames {
    /// Wraps a sample vector.
    pub fn new(samples: Vec<i16>) -> Self {
        Self { samples }
    }
}

impl From<Vec<i16>> for MemoryFrames {
    fn from(samples: Vec<i16>) -> Self {
        Self::new(samples)
    }
}

impl FrameSource for MemoryFrames {
    fn sample_count(&self) -> usize {
        self.samples.len()
    }

    fn read_frame(&mut self, start: usize, out: &mut [i16]) -> Result<()> {
        let frame = start
            .checked_add(out.len())
            .and_then(|end| self.samples.get(start..end))
            .ok_or_else(|| SynthError::Io(alloc::format!("frame at {start} out of range")))?;
        out.copy_from_slice(frame);
        Ok(())
    }
}

/// Wavetable scanner.
///
/// ## Parameters
/// - `frame_size`: samples per frame (the device uses
///   [`DEFAULT_FRAME_SIZE`])
/// - `position`: fractional frame index in `[0, frame_count - 1]`
///
/// # Example
///
/// ```rust
/// use picotouch_synth::{MemoryFrames, Wavetable};
///
/// // Two 4-sample frames: silence, then full scale
/// let frames = MemoryFrames::new(vec![0, 0, 0, 0, 1000, 1000, 1000, 1000]);
/// let mut table = Wavetable::new(Box::new(frames), 4).unwrap();
/// assert_eq!(table.frame_count(), 2);
///
/// table.set_wave_pos(0.5).unwrap();
/// assert_eq!(table.output().snapshot(), vec![500; 4]);
/// ```
pub struct Wavetable {
    source: Box<dyn FrameSource>,
    frame_size: usize,
    frame_count: usize,
    position: f32,
    lower: Option<usize>,
    frame_a: Vec<i16>,
    frame_b: Vec<i16>,
    output: Arc<WaveformBuffer>,
}

impl core::fmt::Debug for Wavetable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Wavetable")
            .field("frame_size", &self.frame_size)
            .field("frame_count", &self.frame_count)
            .field("position", &self.position)
            .field("lower", &self.lower)
            .finish_non_exhaustive()
    }
}

impl Wavetable {
    /// Opens a wavetable over `source` and scans to frame 0.
    ///
    /// Fails with [`SynthError::Format`] if `frame_size` is zero or the
    /// source holds less than one frame. Trailing samples that do not fill a
    /// whole frame are ignored.
    pub fn new(source: Box<dyn FrameSource>, frame_size: usize) -> Result<Self> {
        if frame_size == 0 {
            return Err(SynthError::Format("frame size must be non-zero".into()));
        }
        let samples = source.sample_count();
        let frame_count = samples / frame_size;
        if frame_count == 0 {
            return Err(SynthError::Format(alloc::format!(
                "{samples} samples is shorter than one {frame_size}-sample frame"
            )));
        }

        let mut table = Self {
            source,
            frame_size,
            frame_count,
            position: 0.0,
            lower: None,
            frame_a: vec![0; frame_size],
            frame_b: vec![0; frame_size],
            output: Arc::new(WaveformBuffer::zeroed(frame_size)),
        };
        table.set_wave_pos(0.0)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(frame_size, frame_count, "wavetable opened");

        Ok(table)
    }

    /// Wavetable over in-memory samples.
    pub fn from_samples(samples: Vec<i16>, frame_size: usize) -> Result<Self> {
        Self::new(Box::new(MemoryFrames::new(samples)), frame_size)
    }

    /// Samples per frame.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Number of whole frames.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Current scan position.
    pub fn position(&self) -> f32 {
        self.position
    }

    /// Shared output buffer. Its length is always [`frame_size`](Self::frame_size).
    pub fn output(&self) -> &Arc<WaveformBuffer> {
        &self.output
    }

    /// Scans to `position`, crossfading the two neighbouring frames into the
    /// output buffer.
    ///
    /// The position is clamped into `[0, frame_count - 1]` (NaN scans to 0).
    /// Frames are only re-read when the lower frame index changes. On a read
    /// error the output keeps its previous contents.
    pub fn set_wave_pos(&mut self, position: f32) -> Result<()> {
        let max = (self.frame_count - 1) as f32;
        let position = if position.is_nan() {
            0.0
        } else {
            position.clamp(0.0, max)
        };
        let floor = libm::floorf(position);
        let lower = floor as usize;

        if self.lower != Some(lower) {
            let upper = (lower + 1).min(self.frame_count - 1);
            self.lower = None;
            self.source
                .read_frame(lower * self.frame_size, &mut self.frame_a)?;
            self.source
                .read_frame(upper * self.frame_size, &mut self.frame_b)?;
            self.lower = Some(lower);
        }

        self.output
            .write_lerp(&self.frame_a, &self.frame_b, position - floor);
        self.position = position;
        Ok(())
    }
}
