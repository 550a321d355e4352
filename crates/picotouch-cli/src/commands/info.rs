//! Display WAV file metadata.

use clap::Args;
use picotouch_io::read_wav_info;
use picotouch_synth::DEFAULT_FRAME_SIZE;

/// Display WAV file information.
#[derive(Args)]
pub struct InfoArgs {
    /// Path to the WAV file
    pub file: std::path::PathBuf,

    /// Wavetable frame size in samples
    #[arg(long, default_value_t = DEFAULT_FRAME_SIZE)]
    pub frame_size: usize,
}

/// Run the info command.
pub fn run(args: InfoArgs) -> anyhow::Result<()> {
    let info = read_wav_info(&args.file)?;

    println!("File:        {}", args.file.display());
    println!("Format:      {}-bit", info.bits_per_sample);
    println!("Channels:    {}", info.channels);
    println!("Sample Rate: {} Hz", info.sample_rate);
    println!(
        "Duration:    {:.3}s ({} frames)",
        info.duration_secs, info.num_frames
    );

    let file_size = std::fs::metadata(&args.file)?.len();
    println!("File Size:   {}", format_bytes(file_size));

    if info.is_engine_format() {
        println!(
            "Wavetable:   {} frames of {} samples",
            info.frame_count(args.frame_size),
            args.frame_size
        );
    } else {
        println!("Wavetable:   unusable (needs mono 16-bit PCM)");
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
