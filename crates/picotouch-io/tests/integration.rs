//! Integration tests for picotouch-io wavetable and kit loading.

use std::path::Path;

use picotouch_io::{DirWavetableLoader, list_kits, load_kit, read_samples, write_wav};
use picotouch_synth::{
    DrumMachine, Instrument, SamplePlayer, SoftwareMixer, SynthError, WavetableLoader,
    factory_patches, waves,
};
use tempfile::tempdir;

fn write_i16(path: &Path, samples: &[i16], sample_rate: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in samples {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();
}

/// Eight 256-sample frames: sine, then squares of rising amplitude.
fn plaits02() -> Vec<i16> {
    let mut samples = waves::sine(256, 20000);
    for n in 1..8 {
        samples.extend(waves::square(256, n * 3000));
    }
    samples
}

// ---------------------------------------------------------------------------
// Wavetables from disk
// ---------------------------------------------------------------------------

#[test]
fn wavetable_loads_from_device_path() {
    let root = tempdir().unwrap();
    std::fs::create_dir(root.path().join("wav")).unwrap();
    write_i16(&root.path().join("wav/PLAITS02.WAV"), &plaits02(), 28000);

    let mut loader = DirWavetableLoader::new(root.path());
    let mut table = loader.load("/wav", "PLAITS02", 256).unwrap();
    assert_eq!(table.frame_count(), 8);
    assert_eq!(table.output().snapshot(), waves::sine(256, 20000));

    table.set_wave_pos(7.0).unwrap();
    assert_eq!(table.output().get(0), Some(21000));
}

#[test]
fn wavetable_named_with_extension_loads() {
    let root = tempdir().unwrap();
    std::fs::create_dir(root.path().join("wav")).unwrap();
    write_i16(&root.path().join("wav/PLAITS02.WAV"), &plaits02(), 28000);

    let [mut patch, _, _] = factory_patches();
    patch.set_wave_select("wtb:PLAITS02.WAV").unwrap();
    assert_eq!(patch.wave_select().encode(), "wtb:PLAITS02");

    let mut loader = DirWavetableLoader::new(root.path());
    let inst = Instrument::new(SoftwareMixer::new(28000.0), patch, &mut loader).unwrap();
    assert_eq!(inst.waveform().snapshot(), waves::sine(256, 20000));
}

#[test]
fn wavetable_patch_plays_from_disk() {
    let root = tempdir().unwrap();
    std::fs::create_dir(root.path().join("wav")).unwrap();
    write_i16(&root.path().join("wav/plaits02.wav"), &plaits02(), 28000);

    let mut loader = DirWavetableLoader::new(root.path());
    let [wtb_a, _, _] = factory_patches();
    let mut inst = Instrument::new(SoftwareMixer::new(28000.0), wtb_a, &mut loader).unwrap();
    inst.note_on(36, 127).unwrap();

    let mut block = [0.0f32; 280];
    let mut peak = 0.0f32;
    for _ in 0..30 {
        inst.update(0.01).unwrap();
        inst.sink_mut().render(&mut block);
        peak = block.iter().fold(peak, |m, s| m.max(s.abs()));
    }
    assert!(peak > 0.05, "peak {peak}");

    // Render output survives a trip through the file layer
    let out = root.path().join("take.wav");
    write_wav(&out, &block, 28000).unwrap();
    let (saved, rate) = read_samples(&out).unwrap();
    assert_eq!(rate, 28000);
    assert_eq!(saved.len(), block.len());
}

#[test]
fn missing_wavetable_is_io_error() {
    let root = tempdir().unwrap();
    std::fs::create_dir(root.path().join("wav")).unwrap();
    let mut loader = DirWavetableLoader::new(root.path());
    assert!(matches!(
        loader.load("/wav", "NOPE", 256),
        Err(SynthError::Io(_))
    ));
}

#[test]
fn short_wavetable_is_format_error() {
    let root = tempdir().unwrap();
    std::fs::create_dir(root.path().join("wav")).unwrap();
    write_i16(&root.path().join("wav/TINY.WAV"), &[0; 100], 28000);
    let mut loader = DirWavetableLoader::new(root.path());
    assert!(matches!(
        loader.load("/wav", "TINY", 256),
        Err(SynthError::Format(_))
    ));
}

// ---------------------------------------------------------------------------
// Drum kits
// ---------------------------------------------------------------------------

fn make_kit(root: &Path, name: &str, files: &[&str]) {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    for file in files {
        write_i16(&dir.join(file), &waves::noise(500, 8000, 7), 11025);
    }
}

#[test]
fn kit_loads_slots_and_size() {
    let root = tempdir().unwrap();
    make_kit(root.path(), "kitA", &["00_kick.wav", "02_snare.WAV", "._02_junk.wav"]);
    std::fs::write(root.path().join("kitA/05_notes.txt"), "not audio").unwrap();

    let kit = load_kit(root.path(), "kitA", 10).unwrap();
    assert_eq!(kit.name(), "kitA");
    assert_eq!(kit.slot_count(), 10);
    assert_eq!(kit.size(), 3);
    assert!(kit.get(1).is_none());
    let snare = kit.get(2).unwrap();
    assert_eq!(snare.len(), 500);
    assert_eq!(snare.sample_rate, 11025);
}

#[test]
fn corrupt_slot_file_is_skipped() {
    let root = tempdir().unwrap();
    make_kit(root.path(), "kitB", &["01_ok.wav"]);
    std::fs::write(root.path().join("kitB/00_bad.wav"), b"RIFF garbage").unwrap();

    let kit = load_kit(root.path(), "kitB", 10).unwrap();
    assert!(kit.get(0).is_none());
    assert!(kit.get(1).is_some());
    assert_eq!(kit.size(), 2);
}

#[test]
fn missing_kit_dir_is_error() {
    let root = tempdir().unwrap();
    assert!(load_kit(root.path(), "kitZ", 10).is_err());
}

#[test]
fn kits_switch_on_the_machine() {
    let root = tempdir().unwrap();
    make_kit(root.path(), "kitA", &["00_a.wav"]);
    make_kit(root.path(), "kitB", &["00_b.wav", "04_b.wav"]);
    make_kit(root.path(), "kitC", &[]);
    std::fs::create_dir(root.path().join(".trash")).unwrap();

    assert_eq!(list_kits(root.path()).unwrap(), ["kitA", "kitB", "kitC"]);

    let mut mixer = SoftwareMixer::new(11025.0);
    let mut drums = DrumMachine::new(load_kit(root.path(), "kitA", 10).unwrap(), 24);
    assert!(!drums.note_on(28, &mut mixer));

    drums.load_kit(load_kit(root.path(), "kitB", 10).unwrap());
    assert!(drums.note_on(28, &mut mixer));
    assert!(mixer.is_playing(4));

    drums.load_kit(load_kit(root.path(), "kitC", 10).unwrap());
    assert_eq!(drums.kit_size(), 0);
    assert!(!drums.note_on(24, &mut mixer));
}
