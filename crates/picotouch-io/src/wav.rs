//! WAV wavetable reading and render output.
//!
//! The engine only accepts mono 16-bit PCM. Anything else is rejected with
//! [`SynthError::Format`] rather than converted.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader, WavWriter};
use picotouch_synth::{FrameSource, SynthError, Wavetable, WavetableLoader, strip_wav};

use crate::Result;

/// WAV file metadata extracted without loading sample data.
#[derive(Debug, Clone, PartialEq)]
pub struct WavInfo {
    /// Number of audio channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample.
    pub bits_per_sample: u16,
    /// Total number of sample frames (samples per channel).
    pub num_frames: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
}

impl WavInfo {
    /// True if the engine can load this file.
    pub fn is_engine_format(&self) -> bool {
        self.channels == 1 && self.bits_per_sample == 16
    }

    /// Number of whole wavetable frames of `frame_size` samples.
    pub fn frame_count(&self, frame_size: usize) -> usize {
        if frame_size == 0 {
            0
        } else {
            self.num_frames as usize / frame_size
        }
    }
}

/// Read WAV metadata without loading sample data.
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let num_frames = u64::from(reader.duration());
    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        num_frames,
        duration_secs: num_frames as f64 / f64::from(spec.sample_rate),
    })
}

fn check_format(spec: hound::WavSpec) -> std::result::Result<(), SynthError> {
    if spec.channels == 1 && spec.bits_per_sample == 16 && spec.sample_format == SampleFormat::Int
    {
        Ok(())
    } else {
        Err(SynthError::Format(format!(
            "need mono 16-bit PCM, got {} channel(s) at {} bits",
            spec.channels, spec.bits_per_sample
        )))
    }
}

/// Reads a whole mono 16-bit file. Returns the samples and sample rate.
pub fn read_samples<P: AsRef<Path>>(path: P) -> Result<(Vec<i16>, u32)> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    check_format(spec)?;
    let samples = reader
        .samples::<i16>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok((samples, spec.sample_rate))
}

/// Writes mono `samples` (-1.0 to 1.0) as a 16-bit WAV file.
///
/// # Example
/// ```ignore
/// let mut out = vec![0.0f32; 28000];
/// mixer.render(&mut out);
/// write_wav("take.wav", &out, 28000)?;
/// ```
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    let max_val = 32768.0f32;
    for &sample in samples {
        let int_sample = (sample * max_val).clamp(-max_val, max_val - 1.0) as i16;
        writer.write_sample(int_sample)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Wavetable frames streamed from a WAV file.
///
/// Only the two frames being interpolated are ever in memory: each read
/// seeks to the frame start and decodes `frame_size` samples.
pub struct WavFrameSource<R: Read + Seek> {
    reader: WavReader<R>,
    samples: usize,
}

impl<R: Read + Seek> std::fmt::Debug for WavFrameSource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WavFrameSource")
            .field("samples", &self.samples)
            .finish_non_exhaustive()
    }
}

impl WavFrameSource<BufReader<File>> {
    /// Opens a wavetable file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(WavReader::open(path)?)
    }
}

impl<R: Read + Seek> WavFrameSource<R> {
    /// Wraps a reader, rejecting anything but mono 16-bit PCM.
    pub fn new(reader: WavReader<R>) -> Result<Self> {
        check_format(reader.spec())?;
        let samples = reader.duration() as usize;
        Ok(Self { reader, samples })
    }

    /// Sample rate in the file header.
    pub fn sample_rate(&self) -> u32 {
        self.reader.spec().sample_rate
    }
}

impl<R: Read + Seek> FrameSource for WavFrameSource<R> {
    fn sample_count(&self) -> usize {
        self.samples
    }

    fn read_frame(&mut self, start: usize, out: &mut [i16]) -> picotouch_synth::Result<()> {
        let offset = u32::try_from(start)
            .map_err(|_| SynthError::Io(format!("frame offset {start} out of range")))?;
        self.reader
            .seek(offset)
            .map_err(|e| SynthError::Io(e.to_string()))?;

        let mut filled = 0;
        for (slot, sample) in out.iter_mut().zip(self.reader.samples::<i16>()) {
            *slot = sample.map_err(|e| SynthError::Io(e.to_string()))?;
            filled += 1;
        }
        if filled < out.len() {
            return Err(SynthError::Io(format!(
                "short read at {start}: {filled} of {} samples",
                out.len()
            )));
        }
        Ok(())
    }
}

/// Finds `<dir>/<stem>.wav`, matching the extension and stem in any case.
/// A `stem` already ending in `.wav` names the same file.
///
/// The device convention is upper case (`PLAITS02.WAV`), so that spelling
/// is tried first.
pub fn find_wav(dir: &Path, stem: &str) -> Result<PathBuf> {
    let stem = strip_wav(stem);
    let exact = dir.join(format!("{stem}.WAV"));
    if exact.is_file() {
        return Ok(exact);
    }
    let wanted = format!("{stem}.wav");
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if name
            .to_str()
            .is_some_and(|n| n.eq_ignore_ascii_case(&wanted))
        {
            return Ok(entry.path());
        }
    }
    Err(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("{} not found in {}", wanted, dir.display()),
    )
    .into())
}

/// Loads patch wavetables from a directory tree.
///
/// Patch wave directories are device paths such as `/wav`; they resolve
/// relative to `root`.
///
/// # Example
///
/// ```rust,ignore
/// let mut loader = DirWavetableLoader::new("sd");
/// // Opens sd/wav/PLAITS02.WAV
/// let table = loader.load("/wav", "PLAITS02", 256)?;
/// ```
#[derive(Debug, Clone)]
pub struct DirWavetableLoader {
    root: PathBuf,
}

impl DirWavetableLoader {
    /// Loader resolving wave directories under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Host directory for a device wave directory.
    pub fn resolve_dir(&self, dir: &str) -> PathBuf {
        self.root.join(dir.trim_start_matches('/'))
    }

    fn open(&self, dir: &str, name: &str, frame_size: usize) -> Result<Wavetable> {
        let path = find_wav(&self.resolve_dir(dir), name)?;
        let source = WavFrameSource::open(&path)?;
        tracing::debug!(path = %path.display(), samples = source.sample_count(), "opening wavetable");
        Ok(Wavetable::new(Box::new(source), frame_size)?)
    }
}

impl WavetableLoader for DirWavetableLoader {
    fn load(&mut self, dir: &str, name: &str, frame_size: usize) -> picotouch_synth::Result<Wavetable> {
        self.open(dir, name, frame_size).map_err(|e| {
            tracing::warn!(dir, name, error = %e, "wavetable load failed");
            SynthError::from(e)
        })
    }
}
