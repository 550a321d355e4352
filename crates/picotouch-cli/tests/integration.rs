//! Integration tests for picotouch-cli.
//!
//! Tests cover the `picotouch` binary and whole-device simulations through
//! the library API.

use std::path::Path;
use std::process::Command;
use std::rc::Rc;

use picotouch_cli::{
    Device, DeviceConfig, DirKits, DrumApp, Octave, Script, ScriptedTouch, SimPort, Surface,
    SynthApp, simulate,
};
use picotouch_io::{read_samples, write_wav};
use picotouch_platform::ManualClock;
use picotouch_synth::{MemoryWavetables, SoftwareMixer, factory_patches};
use tempfile::tempdir;

/// Helper to get the path to the `picotouch` binary built by cargo.
fn picotouch_bin(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_picotouch"));
    // Keep a stray picotouch.toml in the crate dir from being picked up
    cmd.current_dir(dir);
    cmd
}

fn tone(len: usize) -> Vec<f32> {
    (0..len).map(|i| if (i / 20) % 2 == 0 { 0.5 } else { -0.5 }).collect()
}

// ---------------------------------------------------------------------------
// CLI binary tests
// ---------------------------------------------------------------------------

#[test]
fn cli_help_works() {
    let dir = tempdir().unwrap();
    let output = picotouch_bin(dir.path()).arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["run", "patches", "kits", "info", "config"] {
        assert!(stdout.contains(command), "help should list '{command}'");
    }
}

#[test]
fn cli_patches_lists_factory_patches() {
    let dir = tempdir().unwrap();
    let output = picotouch_bin(dir.path())
        .args(["patches", "--verbose"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for expected in ["wtbA", "sawB", "mixC", "wtb:PLAITS02", "osc:SAW/square", "amp env"] {
        assert!(stdout.contains(expected), "missing '{expected}' in:\n{stdout}");
    }
}

#[test]
fn cli_config_prints_defaults() {
    let dir = tempdir().unwrap();
    let output = picotouch_bin(dir.path()).arg("config").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(DeviceConfig::from_toml(&stdout).unwrap(), DeviceConfig::default());
}

#[test]
fn cli_config_file_overrides_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("board.toml");
    std::fs::write(&path, "base_note = 48\n[tasks]\nled_ms = 50\n").unwrap();

    let output = picotouch_bin(dir.path())
        .arg("config")
        .arg("--config")
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());
    let config = DeviceConfig::from_toml(&String::from_utf8_lossy(&output.stdout)).unwrap();
    assert_eq!(config.base_note, 48);
    assert_eq!(config.tasks.led_ms, 50);
}

#[test]
fn cli_invalid_config_fails() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("picotouch.toml"), "base_note = 100\n").unwrap();
    let output = picotouch_bin(dir.path()).arg("config").output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("base_note"));
}

#[test]
fn cli_run_synth_renders_wav() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("chord.txt");
    std::fs::write(&script, "# chord\n0 0 down\n0 4 down\n300 0 up\n300 4 up\n").unwrap();
    let out = dir.path().join("synth.wav");

    let output = picotouch_bin(dir.path())
        .args(["run", "--patch", "b", "--duration", "0.5", "--script"])
        .arg(&script)
        .arg("--output")
        .arg(&out)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "run failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("sawB"));
    assert!(stdout.contains("touch"));

    let (samples, rate) = read_samples(&out).unwrap();
    assert_eq!(rate, 28000);
    assert_eq!(samples.len(), 14000);
    assert!(samples.iter().any(|&s| s.unsigned_abs() > 500));
}

#[test]
fn cli_run_drums_renders_kit() {
    let dir = tempdir().unwrap();
    let kit = dir.path().join("kits/kitA");
    std::fs::create_dir_all(&kit).unwrap();
    write_wav(kit.join("00_kick.wav"), &tone(2000), 11025).unwrap();
    let script = dir.path().join("hit.txt");
    std::fs::write(&script, "0 0 tap 100\n").unwrap();
    let out = dir.path().join("drums.wav");

    let output = picotouch_bin(dir.path())
        .args(["run", "--drums", "--duration", "0.3", "--kit-root", "kits", "--script"])
        .arg(&script)
        .arg("--output")
        .arg(&out)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "run failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("kit kitA"));

    let (samples, rate) = read_samples(&out).unwrap();
    assert_eq!(rate, 11025);
    assert_eq!(samples.len(), 3307);
    assert!(samples.iter().any(|&s| s != 0));
}

#[test]
fn cli_run_bad_script_fails() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("bad.txt");
    std::fs::write(&script, "0 99 down\n").unwrap();
    let output = picotouch_bin(dir.path())
        .args(["run", "--patch", "b", "--script"])
        .arg(&script)
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("line 1"));
}

#[test]
fn cli_run_missing_wavetable_fails() {
    let dir = tempdir().unwrap();
    let output = picotouch_bin(dir.path())
        .args(["run", "--patch", "a", "--duration", "0.1"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn cli_info_reports_frames() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("table.wav");
    write_wav(&path, &tone(1024), 28000).unwrap();

    let output = picotouch_bin(dir.path()).arg("info").arg(&path).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("28000 Hz"));
    assert!(stdout.contains("4 frames of 256 samples"));
}

#[test]
fn cli_kits_lists_sizes() {
    let dir = tempdir().unwrap();
    let kit = dir.path().join("kitB");
    std::fs::create_dir_all(&kit).unwrap();
    write_wav(kit.join("00_a.wav"), &tone(100), 11025).unwrap();
    write_wav(kit.join("03_b.wav"), &tone(200), 11025).unwrap();

    let output = picotouch_bin(dir.path())
        .arg("kits")
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("kitB"));
    assert!(stdout.contains("size  4"));
    assert!(stdout.contains("3:200"));
}

// ---------------------------------------------------------------------------
// Simulations through the library
// ---------------------------------------------------------------------------

#[test]
fn synth_simulation_follows_script() {
    let config = DeviceConfig::default();
    let script = Script::new()
        .tap(0, 18, 50)
        .down(100, 0)
        .down(200, 15)
        .up(600, 15)
        .up(800, 0)
        .tap(900, 21, 50)
        .midi(1000, [0x90, 60, 100]);

    let clock = Rc::new(ManualClock::with_tick(20));
    let mut surface = Surface::new(Octave::new(36, 12, 84), 1);
    surface.add_port(Box::new(SimPort::new(
        "serial",
        Rc::clone(&clock),
        script.midi_input(),
    )));
    let app = SynthApp::new(
        surface,
        SoftwareMixer::new(28000.0),
        factory_patches().to_vec(),
        0,
        Box::new(MemoryWavetables::new().with("PLAITS02", vec![0i16; 512])),
        28000,
    )
    .unwrap();
    let touch = ScriptedTouch::new(&script, Rc::clone(&clock));
    let report = simulate(app, touch, &clock, &config, 1_200_000, true);

    let app = &report.rig.device;
    assert_eq!(app.patch_index(), 1);
    assert_eq!(app.instrument().patch().name(), "sawB");
    assert_eq!(app.surface().octave().base(), 48);
    assert!(app.mods().right > 0.3, "right zone {}", app.mods().right);
    // Note 60 from MIDI is pad 12 after the octave shift
    assert_eq!(app.instrument().voice_count(), 1);

    assert_eq!(report.rig.rendered(), 33600);
    assert_eq!(report.rig.recording().map(<[f32]>::len), Some(33600));
    let names: Vec<&str> = report.stats.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(
        names,
        ["touch", "modulation", "leds", "midi", "diagnostics", "audio"]
    );
    let modulation = &report.stats[1].1;
    assert!((100..=125).contains(&modulation.runs), "{modulation:?}");
    assert!(report.stats.iter().all(|(_, s)| s.overruns == 0));
}

#[test]
fn drum_simulation_mirrors_midi() {
    let dir = tempdir().unwrap();
    let kit = dir.path().join("kitA");
    std::fs::create_dir_all(&kit).unwrap();
    write_wav(kit.join("01_snare.wav"), &tone(500), 11025).unwrap();

    let mut config = DeviceConfig::default();
    config.drums.kits = vec!["kitA".into()];
    let script = Script::new().tap(0, 2, 50);

    let clock = Rc::new(ManualClock::with_tick(20));
    let usb = SimPort::new("usb", Rc::clone(&clock), Vec::new());
    let sent = usb.sent();
    let mut surface = Surface::new(Octave::new(24, 0, 60), 1);
    surface.add_port(Box::new(usb));
    let app = DrumApp::new(
        surface,
        SoftwareMixer::new(11025.0),
        Box::new(DirKits::new(dir.path())),
        config.drums.kits.clone(),
        11025,
    )
    .unwrap();
    let touch = ScriptedTouch::new(&script, Rc::clone(&clock));
    let report = simulate(app, touch, &clock, &config, 200_000, true);

    // Pad 2 is trigger slot 1 and MIDI note 26
    assert_eq!(*sent.borrow(), [0x90, 26, 100, 0x80, 26, 0]);
    let audio = report.rig.recording().unwrap();
    assert!(audio.iter().any(|&s| s.abs() > 0.1));
}
