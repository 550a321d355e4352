//! Integration tests for picotouch-synth crate.
//!
//! Tests cover the full note lifecycle through the software mixer, wavetable
//! patches, live parameter changes, and drum triggering.

use std::sync::Arc;

use picotouch_synth::{
    AudioSink, DrumKit, DrumMachine, EnvelopeParams, EnvelopeState, FilterKind, Instrument,
    MemoryWavetables, Patch, Sample, SamplePlayer, SoftwareMixer, SynthError, WaveKind,
    factory_patches, waves,
};

const SR: f32 = 28000.0;
const TICK: f32 = 0.01;
/// Output samples per control tick
const BLOCK: usize = 280;

/// Eight frames: sine, then progressively louder squares.
fn plaits02() -> Vec<i16> {
    let mut samples = waves::sine(256, 20000);
    for n in 1..8 {
        samples.extend(waves::square(256, n * 3000));
    }
    samples
}

fn loader() -> MemoryWavetables {
    MemoryWavetables::new().with("PLAITS02", plaits02())
}

fn run(inst: &mut Instrument<SoftwareMixer>, ticks: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(ticks * BLOCK);
    let mut block = [0.0f32; BLOCK];
    for _ in 0..ticks {
        inst.update(TICK).unwrap();
        inst.sink_mut().render(&mut block);
        out.extend_from_slice(&block);
    }
    out
}

fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |m, s| m.max(s.abs()))
}

// ---------------------------------------------------------------------------
// 1. Note lifecycle
// ---------------------------------------------------------------------------

#[test]
fn note_sounds_then_release_tail_ends() {
    let [_, saw_b, _] = factory_patches();
    let mut inst = Instrument::new(SoftwareMixer::new(SR), saw_b, &mut loader()).unwrap();

    inst.note_on(48, 127).unwrap();
    let held = run(&mut inst, 20);
    assert!(peak(&held[BLOCK * 10..]) > 0.1, "note should be audible");

    inst.note_off(48);
    assert_eq!(inst.voice_count(), 0, "instrument reclaims immediately");
    assert_eq!(inst.sink().active(), 2, "mixer keeps the release tail");

    // sawB releases over 0.5 s
    let tail = run(&mut inst, 60);
    assert_eq!(inst.sink().active(), 0);
    assert!(peak(&tail[tail.len() - BLOCK..]) < 1e-6);
}

#[test]
fn wavetable_note_registers_filtered_oscillators_and_reclaims() {
    let [wtb_a, _, _] = factory_patches();
    let mut inst = Instrument::new(SoftwareMixer::new(SR), wtb_a, &mut loader()).unwrap();

    inst.note_on(48, 127).unwrap();
    inst.update(TICK).unwrap();

    assert!(inst.waveform().snapshot().iter().any(|&s| s != 0));
    let voice = inst.voice(48).unwrap();
    let oscs: Vec<_> = voice.oscillators().collect();
    assert_eq!(oscs.len(), 2, "detuned patch runs two oscillators");
    for &id in &oscs {
        assert_eq!(inst.sink().envelope_state(id), Some(EnvelopeState::Attack));
    }
    assert!(voice.filter().cutoff >= inst.patch().cutoff());

    inst.note_off(48);
    assert_eq!(inst.voice_count(), 0);
    assert!(inst.voice(48).is_none());
    // Oscillators stay in the sink for the release tail
    for &id in &oscs {
        assert_eq!(inst.sink().envelope_state(id), Some(EnvelopeState::Release));
    }
}

#[test]
fn chord_voices_are_independent() {
    let mut inst = Instrument::new(SoftwareMixer::new(SR), Patch::default(), &mut loader()).unwrap();
    for note in [48, 52, 55] {
        inst.note_on(note, 100).unwrap();
    }
    run(&mut inst, 5);

    inst.note_off(52);
    assert!(inst.voice(48).is_some());
    assert!(inst.voice(52).is_none());
    assert!(inst.voice(55).is_some());
    assert_eq!(inst.sink().held(), 4);
}

#[test]
fn retrigger_keeps_one_voice_per_note() {
    let mut inst = Instrument::new(SoftwareMixer::new(SR), Patch::default(), &mut loader()).unwrap();
    for _ in 0..4 {
        inst.note_on(60, 127).unwrap();
        run(&mut inst, 1);
    }
    assert_eq!(inst.voice_count(), 1);
    assert_eq!(inst.sink().held(), 2);
    // Earlier presses are still fading out
    assert!(inst.sink().active() > 2);
}

#[test]
fn sink_exhaustion_drops_whole_note() {
    let sink = SoftwareMixer::with_capacity(SR, 4, 0);
    let mut inst = Instrument::new(sink, Patch::default(), &mut loader()).unwrap();
    inst.note_on(60, 127).unwrap();
    inst.note_on(62, 127).unwrap();
    assert_eq!(inst.note_on(64, 127), Err(SynthError::NoFreeVoices));
    assert_eq!(inst.voice_count(), 2);

    // Releasing a note frees its slots for stealing
    inst.note_off(60);
    inst.note_on(64, 127).unwrap();
    assert_eq!(inst.voice_count(), 2);
}

#[test]
fn amp_envelope_follows_patch() {
    let mut patch = Patch::default();
    patch.set_amp_env(EnvelopeParams {
        attack_time: 0.05,
        decay_time: 0.0,
        release_time: 0.05,
        attack_level: 1.0,
        sustain_level: 1.0,
    });
    let mut inst = Instrument::new(SoftwareMixer::new(SR), patch, &mut loader()).unwrap();
    inst.note_on(60, 127).unwrap();
    let osc = inst.voice(60).unwrap().osc1();

    run(&mut inst, 2);
    assert_eq!(inst.sink().envelope_state(osc), Some(EnvelopeState::Attack));
    run(&mut inst, 8);
    assert_eq!(inst.sink().envelope_state(osc), Some(EnvelopeState::Sustain));
    assert_eq!(
        inst.voice(60).unwrap().amp_env().state(),
        EnvelopeState::Sustain
    );
}

// ---------------------------------------------------------------------------
// 2. Wavetable patch
// ---------------------------------------------------------------------------

#[test]
fn wavetable_patch_scans_with_lfo() {
    let [wtb_a, _, _] = factory_patches();
    assert_eq!(wtb_a.wave_kind(), WaveKind::Wtb);
    let mut inst = Instrument::new(SoftwareMixer::new(SR), wtb_a, &mut loader()).unwrap();
    assert_eq!(inst.wavetable().unwrap().frame_count(), 8);

    inst.note_on(36, 127).unwrap();
    let mut positions = Vec::new();
    for _ in 0..100 {
        run(&mut inst, 1);
        positions.push(inst.wavetable().unwrap().position());
    }
    // lfo amount 0.23 scans up to 2.3 frames
    let max = positions.iter().cloned().fold(0.0f32, f32::max);
    assert!(max > 1.0 && max <= 2.3 + 1e-3, "max position {max}");
}

#[test]
fn wave_mix_offsets_wavetable() {
    let [wtb_a, _, _] = factory_patches();
    let mut inst = Instrument::new(SoftwareMixer::new(SR), wtb_a, &mut loader()).unwrap();
    inst.patch_mut().set_wave_mix_lfo_amount(0.0);
    inst.note_on(36, 127).unwrap();

    inst.patch_mut().set_wave_mix(1.0);
    run(&mut inst, 1);
    // Clamped to the last frame
    assert_eq!(inst.wavetable().unwrap().position(), 7.0);
    assert_eq!(inst.waveform().get(0), Some(21000));
}

#[test]
fn patch_switch_between_table_and_static() {
    let [wtb_a, saw_b, mix_c] = factory_patches();
    let mut loader = loader();
    let mut inst = Instrument::new(SoftwareMixer::new(SR), wtb_a.clone(), &mut loader).unwrap();
    inst.note_on(40, 127).unwrap();
    let table_buffer = Arc::clone(inst.waveform());

    inst.load_patch(saw_b, &mut loader).unwrap();
    assert!(inst.wavetable().is_none());
    inst.load_patch(mix_c, &mut loader).unwrap();
    assert_eq!(inst.patch().filter_kind(), FilterKind::BandPass);
    inst.load_patch(wtb_a, &mut loader).unwrap();
    assert!(inst.wavetable().is_some());

    // The first note still plays the buffer it started with
    assert!(!Arc::ptr_eq(&table_buffer, inst.waveform()));
    run(&mut inst, 3);
    assert!(Arc::strong_count(&table_buffer) > 1);
}

// ---------------------------------------------------------------------------
// 3. Live parameters
// ---------------------------------------------------------------------------

#[test]
fn cutoff_change_reaches_voices_next_update() {
    let mut inst = Instrument::new(SoftwareMixer::new(SR), Patch::default(), &mut loader()).unwrap();
    inst.note_on(60, 127).unwrap();
    run(&mut inst, 20);

    inst.patch_mut().set_cutoff(100.0 + 0.5 * 4000.0);
    run(&mut inst, 1);
    // Default filter attack of 0.1 s has finished sweeping
    let filter = inst.voice(60).unwrap().filter();
    assert_eq!(filter.cutoff, 2100.0 + 4000.0);
}

#[test]
fn low_cutoff_darkens_output() {
    let mut bright = Patch::default();
    bright.set_detune(0.0);
    let mut dark = bright.clone();
    dark.set_filter_kind(FilterKind::LowPass);
    dark.set_cutoff(0.0);
    dark.set_filter_env(EnvelopeParams {
        attack_time: 100.0,
        ..EnvelopeParams::default()
    });

    let mut a = Instrument::new(SoftwareMixer::new(SR), bright, &mut loader()).unwrap();
    let mut b = Instrument::new(SoftwareMixer::new(SR), dark, &mut loader()).unwrap();
    a.note_on(72, 127).unwrap();
    b.note_on(72, 127).unwrap();
    let out_a = run(&mut a, 30);
    let out_b = run(&mut b, 30);
    assert!(peak(&out_b[BLOCK * 20..]) < peak(&out_a[BLOCK * 20..]) * 0.5);
}

// ---------------------------------------------------------------------------
// 4. Drums
// ---------------------------------------------------------------------------

#[test]
fn drum_kit_plays_through_mixer() {
    let mut kit = DrumKit::empty("kitA", 10);
    kit.set(0, Sample::new(waves::noise(1100, 8000, 3), 11025));
    kit.set(4, Sample::new(waves::sine(2200, 12000), 11025));
    assert_eq!(kit.size(), 5);

    let mut mixer = SoftwareMixer::new(11025.0);
    let drums = DrumMachine::new(kit, 24);
    assert!(drums.note_on(24, &mut mixer));
    assert!(drums.note_on(28, &mut mixer));
    assert!(!drums.note_on(26, &mut mixer));

    let mut out = vec![0.0f32; 1500];
    mixer.render(&mut out);
    assert!(peak(&out[..1000]) > 0.1);
    assert!(!mixer.is_playing(0), "one-shot finished");
    assert!(mixer.is_playing(4));
}
