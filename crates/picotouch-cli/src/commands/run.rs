//! Offline device simulation.

use std::path::PathBuf;
use std::rc::Rc;

use clap::{Args, ValueEnum};
use picotouch_cli::{
    Device, DeviceConfig, DirKits, DrumApp, Octave, Script, ScriptedTouch, SimPort, SimReport,
    Surface, SynthApp, sim::SIM_TICK_MICROS, simulate,
};
use picotouch_io::{DirWavetableLoader, write_wav};
use picotouch_platform::{ManualClock, Rgb};
use picotouch_synth::mixer::DEFAULT_SAMPLE_CHANNELS;
use picotouch_synth::{SoftwareMixer, factory_patches};

/// Patch slot selected by a mode pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PatchSlot {
    /// Patch A
    A,
    /// Patch B
    B,
    /// Patch C
    C,
}

impl PatchSlot {
    fn index(self) -> usize {
        match self {
            PatchSlot::A => 0,
            PatchSlot::B => 1,
            PatchSlot::C => 2,
        }
    }
}

/// Run the device against a touch script.
#[derive(Args)]
pub struct RunArgs {
    /// Touch/MIDI script (default: built-in demo)
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Simulated seconds (default: script length plus one second)
    #[arg(short, long)]
    duration: Option<f32>,

    /// Write the rendered audio to this WAV file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Run the drum machine instead of the synth
    #[arg(long)]
    drums: bool,

    /// Patch to start on (overrides the config)
    #[arg(long, value_enum)]
    patch: Option<PatchSlot>,

    /// Directory device wave paths resolve under (overrides the config)
    #[arg(long)]
    wave_root: Option<PathBuf>,

    /// Drum kit directory (overrides the config)
    #[arg(long)]
    kit_root: Option<PathBuf>,
}

/// Run the run command.
pub fn run(args: RunArgs, config: &DeviceConfig) -> anyhow::Result<()> {
    let script = match &args.script {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("failed to read '{}': {e}", path.display()))?;
            text.parse::<Script>()?
        }
        None => Script::demo(),
    };
    let duration_micros = match args.duration {
        Some(secs) if secs > 0.0 => (f64::from(secs) * 1_000_000.0) as u64,
        Some(secs) => anyhow::bail!("duration must be positive, got {secs}"),
        None => script.end_micros() + 1_000_000,
    };

    let clock = Rc::new(ManualClock::with_tick(SIM_TICK_MICROS));
    let serial = SimPort::new("serial", Rc::clone(&clock), script.midi_input());
    let usb = SimPort::new("usb", Rc::clone(&clock), Vec::new());
    let midi_out = usb.sent();
    let touch = ScriptedTouch::new(&script, Rc::clone(&clock));
    let record = args.output.is_some();

    if args.drums {
        let drums = &config.drums;
        let mut surface = Surface::new(
            Octave::new(drums.base_note, drums.octave_min, drums.octave_max),
            config.touch_confirmation,
        );
        surface.add_port(Box::new(serial));
        surface.add_port(Box::new(usb));
        let root = args.kit_root.clone().unwrap_or_else(|| drums.kit_root.clone());
        let app = DrumApp::new(
            surface,
            SoftwareMixer::with_capacity(
                drums.sample_rate as f32,
                config.voices,
                DrumApp::<SoftwareMixer>::SLOTS,
            ),
            Box::new(DirKits::new(root)),
            drums.kits.clone(),
            drums.sample_rate,
        )?;
        let report = simulate(app, touch, &clock, config, duration_micros, record);
        finish(&report, &args, midi_out.borrow().len())
    } else {
        let mut surface = Surface::new(
            Octave::new(config.base_note, config.octave_min, config.octave_max),
            config.touch_confirmation,
        );
        surface.add_port(Box::new(serial));
        surface.add_port(Box::new(usb));
        let root = args.wave_root.clone().unwrap_or_else(|| config.wave_root.clone());
        let patch = args.patch.map_or(config.initial_patch, PatchSlot::index);
        let app = SynthApp::new(
            surface,
            SoftwareMixer::with_capacity(
                config.sample_rate as f32,
                config.voices,
                DEFAULT_SAMPLE_CHANNELS,
            ),
            factory_patches().to_vec(),
            patch,
            Box::new(DirWavetableLoader::new(root)),
            config.sample_rate,
        )?;
        let report = simulate(app, touch, &clock, config, duration_micros, record);
        finish(&report, &args, midi_out.borrow().len())
    }
}

fn finish<D: Device>(report: &SimReport<D>, args: &RunArgs, midi_bytes: usize) -> anyhow::Result<()> {
    let rig = &report.rig;
    let rate = rig.device.sample_rate();
    println!(
        "Simulated {:.2}s: {} samples at {} Hz, {} task runs",
        rig.rendered() as f64 / f64::from(rate),
        rig.rendered(),
        rate,
        report.runs
    );
    println!();
    println!(
        "{:<12} {:>8} {:>9} {:>8} {:>9}",
        "task", "runs", "mean us", "max us", "overruns"
    );
    for (name, stats) in &report.stats {
        println!(
            "{:<12} {:>8} {:>9} {:>8} {:>9}",
            name,
            stats.runs,
            stats.mean_micros(),
            stats.max_micros,
            stats.overruns
        );
    }
    println!();
    println!("Status:      {}", rig.device.status());
    println!("MIDI out:    {midi_bytes} bytes");
    println!(
        "LED frames:  {} (last: {})",
        rig.strip.frames(),
        format_leds(rig.strip.pixels())
    );

    if let (Some(path), Some(audio)) = (&args.output, rig.recording()) {
        let peak = audio.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        write_wav(path, audio, rate)?;
        println!("Peak:        {peak:.3}");
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn format_leds(pixels: &[Rgb]) -> String {
    pixels
        .iter()
        .map(|p| format!("{:06x}", p.pack()))
        .collect::<Vec<_>>()
        .join(" ")
}
