//! Offline stand-ins for the board: scripted pads, a recording LED strip
//! and timed MIDI input, all driven by one [`ManualClock`].
//!
//! A script is plain text, one step per line:
//!
//! ```text
//! # ms   pad  action
//! 0      18   tap 50      # patch B
//! 100    0    down
//! 900    0    up
//! 1200   midi 90 3c 64    # note on 60 from the serial port
//! ```
//!
//! `down`/`up` press and release a pad, `tap <ms>` does both. A `midi` step
//! carries raw hex bytes that arrive on the serial port at that time.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::str::FromStr;
use std::time::Duration;

use picotouch_platform::{
    Clock, LedStrip, ManualClock, MidiTransport, PAD_COUNT, Rgb, Scheduler, TaskStats,
    TouchInput, TransportError,
};

use crate::app::Device;
use crate::config::DeviceConfig;
use crate::tasks::{self, Rig};

/// Simulated time each clock read costs, in microseconds.
pub const SIM_TICK_MICROS: u64 = 20;

/// Invalid script line.
#[derive(Debug, thiserror::Error)]
#[error("script line {line}: {reason}")]
pub struct ScriptError {
    /// 1-based line number.
    pub line: usize,
    /// What was wrong with it.
    pub reason: String,
}

/// What happens at a script step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// A pad changes state.
    Touch {
        /// Pad index.
        pad: usize,
        /// New state.
        pressed: bool,
    },
    /// Raw bytes arrive on the serial MIDI port.
    Midi(Vec<u8>),
}

/// A timed script step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// When the step fires.
    pub at_micros: u64,
    /// What it does.
    pub action: Action,
}

/// Timeline of pad and MIDI input, kept in time order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    steps: Vec<Step>,
}

impl Script {
    /// Empty script.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, at_ms: u64, action: Action) -> Self {
        let at_micros = at_ms * 1000;
        // Stable insert: steps at the same time keep their written order
        let index = self.steps.partition_point(|s| s.at_micros <= at_micros);
        self.steps.insert(index, Step { at_micros, action });
        self
    }

    /// Builder: press `pad` at `at_ms`.
    pub fn down(self, at_ms: u64, pad: usize) -> Self {
        self.push(at_ms, Action::Touch { pad, pressed: true })
    }

    /// Builder: release `pad` at `at_ms`.
    pub fn up(self, at_ms: u64, pad: usize) -> Self {
        self.push(at_ms, Action::Touch { pad, pressed: false })
    }

    /// Builder: press `pad` at `at_ms` and release it `len_ms` later.
    pub fn tap(self, at_ms: u64, pad: usize, len_ms: u64) -> Self {
        self.down(at_ms, pad).up(at_ms + len_ms, pad)
    }

    /// Builder: MIDI bytes arriving at `at_ms`.
    pub fn midi(self, at_ms: u64, bytes: impl Into<Vec<u8>>) -> Self {
        self.push(at_ms, Action::Midi(bytes.into()))
    }

    /// Built-in performance: a chord on patch B with a wave-mix sweep, a
    /// held note on patch A with a cutoff sweep, an octave jump and a note
    /// played over MIDI.
    pub fn demo() -> Self {
        let mut script = Self::new().tap(0, 18, 50);
        for pad in [0, 4, 7] {
            script = script.down(100, pad).up(3000, pad);
        }
        script
            .down(1500, 15)
            .up(2500, 15)
            .tap(3500, 17, 50)
            .down(3600, 2)
            .up(6000, 2)
            .down(4000, 10)
            .up(5000, 10)
            .tap(6500, 21, 50)
            .tap(6600, 0, 1000)
            .midi(8000, [0x90, 0x3c, 0x64])
            .midi(9000, [0x80, 0x3c, 0x00])
    }

    /// All steps in time order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Time of the last step.
    pub fn end_micros(&self) -> u64 {
        self.steps.last().map_or(0, |s| s.at_micros)
    }

    /// Pad steps as `(time, pad, pressed)`.
    pub fn touches(&self) -> Vec<(u64, usize, bool)> {
        self.steps
            .iter()
            .filter_map(|step| match step.action {
                Action::Touch { pad, pressed } => Some((step.at_micros, pad, pressed)),
                Action::Midi(_) => None,
            })
            .collect()
    }

    /// MIDI steps as `(time, bytes)`.
    pub fn midi_input(&self) -> Vec<(u64, Vec<u8>)> {
        self.steps
            .iter()
            .filter_map(|step| match &step.action {
                Action::Midi(bytes) => Some((step.at_micros, bytes.clone())),
                Action::Touch { .. } => None,
            })
            .collect()
    }
}

impl FromStr for Script {
    type Err = ScriptError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut script = Script::new();
        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let fail = |reason: String| ScriptError { line, reason };

            let content = raw.split('#').next().unwrap_or_default();
            let mut words = content.split_whitespace();
            let Some(time) = words.next() else { continue };
            let at_ms: u64 = time
                .parse()
                .map_err(|_| fail(format!("bad time '{time}'")))?;

            let target = words.next().ok_or_else(|| fail("missing pad".into()))?;
            if target.eq_ignore_ascii_case("midi") {
                let bytes = words
                    .map(|w| u8::from_str_radix(w.trim_start_matches("0x"), 16))
                    .collect::<Result<Vec<u8>, _>>()
                    .map_err(|e| fail(format!("bad midi byte: {e}")))?;
                if bytes.is_empty() {
                    return Err(fail("midi step has no bytes".into()));
                }
                script = script.midi(at_ms, bytes);
                continue;
            }

            let pad: usize = target
                .parse()
                .ok()
                .filter(|&pad| pad < PAD_COUNT)
                .ok_or_else(|| fail(format!("bad pad '{target}'")))?;
            script = match words.next() {
                Some("down") => script.down(at_ms, pad),
                Some("up") => script.up(at_ms, pad),
                Some("tap") => {
                    let len_ms = words
                        .next()
                        .and_then(|w| w.parse().ok())
                        .filter(|&len: &u64| len > 0)
                        .ok_or_else(|| fail("tap needs a length in ms".into()))?;
                    script.tap(at_ms, pad, len_ms)
                }
                Some(other) => return Err(fail(format!("unknown action '{other}'"))),
                None => return Err(fail("missing action".into())),
            };
            if let Some(extra) = words.next() {
                return Err(fail(format!("unexpected '{extra}'")));
            }
        }
        Ok(script)
    }
}

/// Pad input played back from a [`Script`], or held constant.
#[derive(Debug)]
pub struct ScriptedTouch {
    touches: Vec<(u64, usize, bool)>,
    next: usize,
    state: [bool; PAD_COUNT],
    clock: Option<Rc<ManualClock>>,
}

impl ScriptedTouch {
    /// Plays the pad steps of `script` against `clock`.
    pub fn new(script: &Script, clock: Rc<ManualClock>) -> Self {
        Self {
            touches: script.touches(),
            next: 0,
            state: [false; PAD_COUNT],
            clock: Some(clock),
        }
    }

    /// Input with `pads` held forever.
    pub fn held(pads: &[usize]) -> Self {
        let mut state = [false; PAD_COUNT];
        for &pad in pads {
            if let Some(s) = state.get_mut(pad) {
                *s = true;
            }
        }
        Self {
            touches: Vec::new(),
            next: 0,
            state,
            clock: None,
        }
    }

    /// True once every scripted step has been applied.
    pub fn finished(&self) -> bool {
        self.next >= self.touches.len()
    }
}

impl TouchInput for ScriptedTouch {
    fn pad_count(&self) -> usize {
        PAD_COUNT
    }

    fn sample(&mut self, out: &mut [bool]) {
        if let Some(clock) = &self.clock {
            let now = clock.now_micros();
            while let Some(&(at, pad, pressed)) = self.touches.get(self.next) {
                if at > now {
                    break;
                }
                if let Some(state) = self.state.get_mut(pad) {
                    *state = pressed;
                }
                self.next += 1;
            }
        }
        for (out, &state) in out.iter_mut().zip(&self.state) {
            *out = state;
        }
    }
}

/// LED strip that keeps the latest frame.
#[derive(Debug, Clone)]
pub struct RecordingStrip {
    pixels: Vec<Rgb>,
    frames: usize,
}

impl RecordingStrip {
    /// Strip of `count` dark LEDs.
    pub fn new(count: usize) -> Self {
        Self {
            pixels: vec![Rgb::BLACK; count],
            frames: 0,
        }
    }

    /// Frames shown so far.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Colours currently latched.
    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }
}

impl LedStrip for RecordingStrip {
    fn led_count(&self) -> usize {
        self.pixels.len()
    }

    fn show(&mut self, colors: &[Rgb]) {
        let n = colors.len().min(self.pixels.len());
        self.pixels[..n].copy_from_slice(&colors[..n]);
        self.frames += 1;
    }
}

/// MIDI port fed by timed script bytes. Outbound bytes are shared so they
/// stay readable after the port is boxed into a surface.
pub struct SimPort {
    name: String,
    clock: Rc<ManualClock>,
    pending: VecDeque<(u64, Vec<u8>)>,
    inbound: VecDeque<u8>,
    sent: Rc<RefCell<Vec<u8>>>,
}

impl SimPort {
    /// Port named `name` delivering `input` as the clock passes each time.
    pub fn new(
        name: impl Into<String>,
        clock: Rc<ManualClock>,
        input: Vec<(u64, Vec<u8>)>,
    ) -> Self {
        Self {
            name: name.into(),
            clock,
            pending: input.into(),
            inbound: VecDeque::new(),
            sent: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Handle to everything written to the port.
    pub fn sent(&self) -> Rc<RefCell<Vec<u8>>> {
        Rc::clone(&self.sent)
    }
}

impl MidiTransport for SimPort {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_byte(&mut self) -> Option<u8> {
        if self.inbound.is_empty() {
            let now = self.clock.now_micros();
            while self.pending.front().is_some_and(|(at, _)| *at <= now) {
                if let Some((_, bytes)) = self.pending.pop_front() {
                    self.inbound.extend(bytes);
                }
            }
        }
        self.inbound.pop_front()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.sent.borrow_mut().extend_from_slice(bytes);
        Ok(())
    }
}

/// Result of a simulation run.
pub struct SimReport<D> {
    /// Device, pads and strip in their final state.
    pub rig: Rig<D, ScriptedTouch, RecordingStrip>,
    /// Total task runs.
    pub runs: u64,
    /// Per-task statistics by name, in registration order.
    pub stats: Vec<(String, TaskStats)>,
}

/// Runs the full task set over `device` until `duration_micros` of
/// simulated time has passed.
pub fn simulate<D: Device + 'static>(
    device: D,
    touch: ScriptedTouch,
    clock: &Rc<ManualClock>,
    config: &DeviceConfig,
    duration_micros: u64,
    record: bool,
) -> SimReport<D> {
    let mut scheduler = Scheduler::new().with_budget(Duration::from_micros(config.task_budget_us));
    tasks::install(&mut scheduler, &config.tasks, true);

    let strip = RecordingStrip::new(picotouch_platform::LED_COUNT);
    let mut rig = Rig::new(device, touch, strip, record);
    tracing::debug!(duration_us = duration_micros, "simulation start");
    let runs = scheduler.run_until(&mut rig, &**clock, duration_micros);
    rig.render_until(duration_micros);

    let stats = scheduler
        .iter_stats()
        .map(|(_, name, stats)| (name.to_owned(), *stats))
        .collect();
    SimReport { rig, runs, stats }
}
