//! Cooperative round-robin task scheduler.
//!
//! Every piece of device work (touch scan, modulation update, LEDs, MIDI,
//! diagnostics) is a [`Task`] that runs to completion and then declares how
//! long it wants to wait before running again. One [`Scheduler`] owns the
//! tasks and lends each of them the shared context `C` in turn, so there is
//! exactly one mutable owner of the synth state and no locking.
//!
//! # Fairness
//!
//! [`Scheduler::step`] runs at most one ready task and resumes its search
//! after the task it ran last. A zero-interval task is therefore always
//! ready but can never run twice while another task is also ready.
//!
//! # Budget
//!
//! Each run is timed against a per-iteration budget. Runs over budget are
//! counted in [`TaskStats::overruns`] and logged, since a slow task delays
//! every other one.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cell::Cell;
use core::time::Duration;

/// Monotonic time source in microseconds.
pub trait Clock {
    /// Microseconds since an arbitrary fixed origin.
    fn now_micros(&self) -> u64;

    /// Idle until `deadline_micros`.
    ///
    /// Called when no task is ready. The default returns immediately, which
    /// turns the scheduler loop into a busy wait.
    fn wait_until(&self, _deadline_micros: u64) {}
}

/// Clock driven by hand, for tests and offline simulation.
///
/// Optionally advances by a fixed `tick` on every read, modelling the time
/// task bodies take so zero-interval tasks cannot stall a simulation.
///
/// # Example
///
/// ```rust
/// use picotouch_platform::{Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// clock.advance(1500);
/// assert_eq!(clock.now_micros(), 1500);
///
/// clock.wait_until(10_000);
/// assert_eq!(clock.now_micros(), 10_000);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
    tick: u64,
}

impl ManualClock {
    /// A clock at time zero that only moves when told to.
    pub const fn new() -> Self {
        Self {
            now: Cell::new(0),
            tick: 0,
        }
    }

    /// A clock that advances `tick_micros` after every read.
    pub const fn with_tick(tick_micros: u64) -> Self {
        Self {
            now: Cell::new(0),
            tick: tick_micros,
        }
    }

    /// Moves time forward.
    pub fn advance(&self, micros: u64) {
        self.now.set(self.now.get().saturating_add(micros));
    }

    /// Jumps to an absolute time. Earlier times are ignored.
    pub fn set(&self, micros: u64) {
        if micros > self.now.get() {
            self.now.set(micros);
        }
    }
}

impl Clock for ManualClock {
    fn now_micros(&self) -> u64 {
        let now = self.now.get();
        self.now.set(now.saturating_add(self.tick));
        now
    }

    fn wait_until(&self, deadline_micros: u64) {
        self.set(deadline_micros);
    }
}

/// Wall clock backed by [`std::time::Instant`].
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl SystemClock {
    /// A clock whose origin is now.
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for SystemClock {
    fn now_micros(&self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }

    fn wait_until(&self, deadline_micros: u64) {
        let now = self.now_micros();
        if deadline_micros > now {
            std::thread::sleep(Duration::from_micros(deadline_micros - now));
        }
    }
}

/// A unit of cooperative work.
///
/// `run` must do a small, bounded amount of work and return; the scheduler
/// calls it again no sooner than `interval()` after it returns.
pub trait Task<C> {
    /// Name for statistics and logs.
    fn name(&self) -> &str;

    /// Minimum time between the end of one run and the start of the next.
    ///
    /// Zero means "as soon as possible".
    fn interval(&self) -> Duration;

    /// Do one iteration of work. `now_micros` is the time the run started.
    fn run(&mut self, ctx: &mut C, now_micros: u64);
}

/// A [`Task`] built from a closure.
///
/// # Example
///
/// ```rust
/// use core::time::Duration;
/// use picotouch_platform::{FnTask, ManualClock, Scheduler};
///
/// let mut sched = Scheduler::new();
/// sched.add(FnTask::new("count", Duration::from_millis(10), |n: &mut u32, _| *n += 1));
///
/// let clock = ManualClock::new();
/// let mut count = 0u32;
/// sched.run_until(&mut count, &clock, 95_000);
/// assert_eq!(count, 10); // t = 0, 10, ... 90 ms
/// ```
pub struct FnTask<F> {
    name: &'static str,
    interval: Duration,
    body: F,
}

impl<F> FnTask<F> {
    /// Wraps `body` as a task named `name`.
    pub fn new<C>(name: &'static str, interval: Duration, body: F) -> Self
    where
        F: FnMut(&mut C, u64),
    {
        Self {
            name,
            interval,
            body,
        }
    }
}

impl<C, F: FnMut(&mut C, u64)> Task<C> for FnTask<F> {
    fn name(&self) -> &str {
        self.name
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn run(&mut self, ctx: &mut C, now_micros: u64) {
        (self.body)(ctx, now_micros);
    }
}

/// Handle to a task registered with a [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(usize);

impl TaskId {
    /// Registration index of the task.
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Per-task run statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    /// Completed runs.
    pub runs: u64,
    /// Sum of run durations in microseconds.
    pub total_micros: u64,
    /// Longest single run in microseconds.
    pub max_micros: u64,
    /// Runs that exceeded the scheduler budget.
    pub overruns: u64,
}

impl TaskStats {
    /// Mean run duration in microseconds, 0 if never run.
    pub fn mean_micros(&self) -> u64 {
        if self.runs == 0 {
            0
        } else {
            self.total_micros / self.runs
        }
    }
}

struct Slot<C> {
    task: Box<dyn Task<C>>,
    next_due: u64,
    stats: TaskStats,
}

/// Round-robin driver for a fixed set of tasks over a shared context.
pub struct Scheduler<C> {
    slots: Vec<Slot<C>>,
    /// Slot to consider first on the next step
    cursor: usize,
    budget_micros: u64,
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Scheduler<C> {
    /// Default per-iteration budget: 5 ms.
    pub const DEFAULT_BUDGET: Duration = Duration::from_millis(5);

    /// Creates an empty scheduler with the default budget.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            cursor: 0,
            budget_micros: Self::DEFAULT_BUDGET.as_micros() as u64,
        }
    }

    /// Builder: set the per-iteration budget.
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget_micros = budget.as_micros() as u64;
        self
    }

    /// Registers a task, ready to run immediately.
    pub fn add(&mut self, task: impl Task<C> + 'static) -> TaskId {
        self.add_boxed(Box::new(task))
    }

    /// Registers an already boxed task.
    pub fn add_boxed(&mut self, task: Box<dyn Task<C>>) -> TaskId {
        #[cfg(feature = "tracing")]
        tracing::debug!(task = task.name(), interval = ?task.interval(), "task added");
        self.slots.push(Slot {
            task,
            next_due: 0,
            stats: TaskStats::default(),
        });
        TaskId(self.slots.len() - 1)
    }

    /// Number of registered tasks.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if no tasks are registered.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Statistics for `id`.
    pub fn stats(&self, id: TaskId) -> Option<&TaskStats> {
        self.slots.get(id.0).map(|slot| &slot.stats)
    }

    /// Name of `id`.
    pub fn name(&self, id: TaskId) -> Option<&str> {
        self.slots.get(id.0).map(|slot| slot.task.name())
    }

    /// Iterator over `(id, name, stats)` for every task.
    pub fn iter_stats(&self) -> impl Iterator<Item = (TaskId, &str, &TaskStats)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, slot)| (TaskId(i), slot.task.name(), &slot.stats))
    }

    /// Earliest time any task is due, or `None` with no tasks.
    pub fn next_due(&self) -> Option<u64> {
        self.slots.iter().map(|slot| slot.next_due).min()
    }

    /// Runs at most one ready task.
    ///
    /// Returns the task that ran, or `None` if nothing was due.
    pub fn step(&mut self, ctx: &mut C, clock: &dyn Clock) -> Option<TaskId> {
        let count = self.slots.len();
        if count == 0 {
            return None;
        }
        let now = clock.now_micros();
        let index = (0..count)
            .map(|offset| (self.cursor + offset) % count)
            .find(|&i| self.slots[i].next_due <= now)?;

        let budget = self.budget_micros;
        let slot = &mut self.slots[index];
        slot.task.run(ctx, now);
        let end = clock.now_micros().max(now);
        let elapsed = end - now;

        slot.stats.runs += 1;
        slot.stats.total_micros = slot.stats.total_micros.saturating_add(elapsed);
        slot.stats.max_micros = slot.stats.max_micros.max(elapsed);
        if elapsed > budget {
            slot.stats.overruns += 1;
            #[cfg(feature = "tracing")]
            tracing::warn!(
                task = slot.task.name(),
                elapsed_us = elapsed,
                budget_us = budget,
                "task over budget"
            );
        }
        slot.next_due = end.saturating_add(slot.task.interval().as_micros() as u64);

        self.cursor = (index + 1) % count;
        Some(TaskId(index))
    }

    /// Steps until `clock` reaches `deadline_micros`, idling on the clock
    /// whenever nothing is due.
    ///
    /// Returns the number of task runs.
    pub fn run_until(&mut self, ctx: &mut C, clock: &dyn Clock, deadline_micros: u64) -> u64 {
        let mut runs = 0;
        loop {
            if clock.now_micros() >= deadline_micros {
                break;
            }
            if self.step(ctx, clock).is_some() {
                runs += 1;
                continue;
            }
            match self.next_due() {
                Some(due) => clock.wait_until(due.min(deadline_micros)),
                None => {
                    clock.wait_until(deadline_micros);
                    break;
                }
            }
        }
        runs
    }
}
