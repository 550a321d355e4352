//! Scheduler tasks driving a [`Device`].
//!
//! The board firmware runs six cooperative tasks: touch scanning, zone
//! modulation, LED refresh, MIDI input, diagnostics and, on the host, audio
//! rendering. Each is a [`FnTask`] over a shared [`Rig`].

use std::time::Duration;

use picotouch_platform::{FnTask, LedStrip, Scheduler, TouchInput};

use crate::app::Device;
use crate::config::TaskIntervals;

/// Samples rendered per audio block.
pub const AUDIO_BLOCK: usize = 256;

/// Most MIDI messages handled per MIDI task run.
pub const MIDI_MESSAGES_PER_RUN: usize = 8;

/// Everything the tasks share: the device plus its pad input and LED strip.
pub struct Rig<D, I, L> {
    /// Active application.
    pub device: D,
    /// Pad sensor.
    pub input: I,
    /// LED output.
    pub strip: L,
    recording: Option<Vec<f32>>,
    block: Vec<f32>,
    rendered: u64,
}

impl<D: Device, I: TouchInput, L: LedStrip> Rig<D, I, L> {
    /// Wires a device to its input and strip. With `record`, rendered audio
    /// is kept for [`recording`](Self::recording).
    pub fn new(device: D, input: I, strip: L, record: bool) -> Self {
        Self {
            device,
            input,
            strip,
            recording: record.then(Vec::new),
            block: vec![0.0; AUDIO_BLOCK],
            rendered: 0,
        }
    }

    /// Renders audio up to `now_micros` of device time.
    pub fn render_until(&mut self, now_micros: u64) {
        let rate = u128::from(self.device.sample_rate());
        let target = (u128::from(now_micros) * rate / 1_000_000) as u64;
        while self.rendered < target {
            let n = ((target - self.rendered) as usize).min(AUDIO_BLOCK);
            let block = &mut self.block[..n];
            self.device.render(block);
            if let Some(recording) = &mut self.recording {
                recording.extend_from_slice(block);
            }
            self.rendered += n as u64;
        }
    }

    /// Samples rendered so far.
    pub fn rendered(&self) -> u64 {
        self.rendered
    }

    /// Recorded audio, if recording.
    pub fn recording(&self) -> Option<&[f32]> {
        self.recording.as_deref()
    }
}

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Scans the pads and dispatches confirmed edges.
pub fn touch_task<D, I, L>(interval: Duration) -> FnTask<impl FnMut(&mut Rig<D, I, L>, u64)>
where
    D: Device,
    I: TouchInput,
    L: LedStrip,
{
    FnTask::new("touch", interval, |rig: &mut Rig<D, I, L>, _now: u64| {
        let events = rig.device.surface_mut().scan(&mut rig.input);
        for event in events {
            rig.device.touch(event);
        }
    })
}

/// Steps held zones and advances envelopes and LFOs by the time since the
/// previous run.
pub fn modulation_task<D, I, L>(interval: Duration) -> FnTask<impl FnMut(&mut Rig<D, I, L>, u64)>
where
    D: Device,
    I: TouchInput,
    L: LedStrip,
{
    let mut last: Option<u64> = None;
    FnTask::new("modulation", interval, move |rig: &mut Rig<D, I, L>, now: u64| {
        let dt = match last {
            Some(prev) => now.saturating_sub(prev) as f32 / 1_000_000.0,
            None => interval.as_secs_f32(),
        };
        last = Some(now);
        rig.device.modulate(dt);
    })
}

/// Redraws the LED buffer and pushes changed frames to the strip.
pub fn led_task<D, I, L>(interval: Duration) -> FnTask<impl FnMut(&mut Rig<D, I, L>, u64)>
where
    D: Device,
    I: TouchInput,
    L: LedStrip,
{
    FnTask::new("leds", interval, |rig: &mut Rig<D, I, L>, _now: u64| {
        rig.device.refresh_leds();
        rig.device.surface_mut().leds_mut().flush(&mut rig.strip);
    })
}

/// Handles pending MIDI input.
pub fn midi_task<D, I, L>(interval: Duration) -> FnTask<impl FnMut(&mut Rig<D, I, L>, u64)>
where
    D: Device,
    I: TouchInput,
    L: LedStrip,
{
    FnTask::new("midi", interval, |rig: &mut Rig<D, I, L>, _now: u64| {
        for _ in 0..MIDI_MESSAGES_PER_RUN {
            let Some(message) = rig.device.surface_mut().receive() else {
                break;
            };
            rig.device.midi(message);
        }
    })
}

/// Logs the device status.
pub fn diagnostics_task<D, I, L>(interval: Duration) -> FnTask<impl FnMut(&mut Rig<D, I, L>, u64)>
where
    D: Device,
    I: TouchInput,
    L: LedStrip,
{
    FnTask::new("diagnostics", interval, |rig: &mut Rig<D, I, L>, now: u64| {
        let secs = now as f64 / 1_000_000.0;
        tracing::info!(t = format_args!("{secs:.2}"), status = %rig.device.status(), "diag");
    })
}

/// Renders audio up to the current time.
pub fn audio_task<D, I, L>(interval: Duration) -> FnTask<impl FnMut(&mut Rig<D, I, L>, u64)>
where
    D: Device,
    I: TouchInput,
    L: LedStrip,
{
    FnTask::new("audio", interval, |rig: &mut Rig<D, I, L>, now: u64| {
        rig.render_until(now);
    })
}

/// Registers the device task set. The audio task is only added when the
/// host renders audio itself.
pub fn install<D, I, L>(
    scheduler: &mut Scheduler<Rig<D, I, L>>,
    intervals: &TaskIntervals,
    audio: bool,
) where
    D: Device + 'static,
    I: TouchInput + 'static,
    L: LedStrip + 'static,
{
    scheduler.add(touch_task(ms(intervals.touch_ms)));
    scheduler.add(modulation_task(ms(intervals.modulation_ms)));
    scheduler.add(led_task(ms(intervals.led_ms)));
    scheduler.add(midi_task(ms(intervals.midi_ms)));
    scheduler.add(diagnostics_task(ms(intervals.diagnostics_ms)));
    if audio {
        scheduler.add(audio_task(ms(intervals.audio_ms)));
    }
}
