//! Timer engine: one countdown, interval or count-up process at a time.
//!
//! The engine advances its [`Run`] by [`TICK_MS`] on every tick delivered by
//! an injected [`TickSource`] and publishes a [`TimerSnapshot`] after every
//! tick and every command that changes state.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Paused -> Running)* -> Idle
//! ```
//!
//! A run that counts down to zero ends in `Idle` with a terminal snapshot
//! (`time_left_ms == 0`, `is_paused == true`); `stop` ends in `Idle` with the
//! default snapshot.
//!
//! ## Usage
//!
//! ```ignore
//! let engine = TimerEngine::new(Arc::new(ThreadTickSource::new()));
//! let (snapshots, _sub) = engine.subscribe_channel();
//! engine.start_interval(20_000, 10_000, 8)?;
//! for snapshot in snapshots { /* render */ }
//! ```

use crate::observer::{Observers, Subscription};
use crate::run::{Activity, Advance, IntervalRun, ResumePolicy, Run, TICK_MS};
use crate::ticker::{lock_unpoisoned, TickHandle, TickSource};
use crate::{Error, Result, TimerMode, TimerSnapshot};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

/// Interval at which the engine asks to be ticked
pub const TICK_INTERVAL: Duration = Duration::from_millis(TICK_MS);

/// Coarse engine state, as seen from outside
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineStatus {
    Idle,
    Running,
    Paused,
}

struct Inner {
    activity: Activity,
    snapshot: TimerSnapshot,
    /// Bumped whenever the tick process is cancelled or replaced
    generation: u64,
    ticker: Option<Box<dyn TickHandle>>,
}

impl Inner {
    /// Cancel the current tick process and invalidate any tick still in flight
    fn cancel_ticks(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(mut ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }
}

struct Shared {
    inner: Mutex<Inner>,
    /// Read-side copy of `inner.snapshot`
    published: RwLock<TimerSnapshot>,
    observers: Arc<Observers>,
    policy: ResumePolicy,
}

impl Shared {
    /// Store and broadcast a snapshot. Must be called with `inner` locked so
    /// that emissions keep the order of the writes that produced them.
    fn publish(&self, inner: &mut Inner, snapshot: TimerSnapshot) {
        debug_assert!(!(snapshot.is_running && snapshot.is_paused));
        inner.snapshot = snapshot;
        *self
            .published
            .write()
            .unwrap_or_else(PoisonError::into_inner) = snapshot;
        self.observers.notify(&snapshot);
    }

    fn on_tick(&self, generation: u64) {
        let mut inner = lock_unpoisoned(&self.inner);
        if inner.generation != generation {
            // Fired after its process was cancelled
            return;
        }
        let Activity::Running(mut run) = inner.activity else {
            return;
        };

        let outcome = run.advance(TICK_MS);
        let mut snapshot = inner.snapshot;
        run.write_into(&mut snapshot);

        match outcome {
            Advance::Ticked => {
                inner.activity = Activity::Running(run);
            }
            Advance::PhaseChanged => {
                tracing::debug!(
                    "Interval phase change: round {}/{} {}",
                    snapshot.current_round,
                    snapshot.total_rounds,
                    if snapshot.is_work_phase { "work" } else { "rest" }
                );
                inner.activity = Activity::Running(run);
            }
            Advance::Finished => {
                snapshot.time_left_ms = 0;
                snapshot.is_running = false;
                snapshot.is_paused = true;
                inner.activity = Activity::Idle;
                inner.cancel_ticks();
                tracing::info!("{} timer finished", run.mode());
            }
        }

        self.publish(&mut inner, snapshot);
    }
}

/// The timer state machine.
///
/// All commands take `&self`; share one engine between threads with `Arc`.
pub struct TimerEngine {
    shared: Arc<Shared>,
    ticks: Arc<dyn TickSource>,
}

impl TimerEngine {
    /// Create an idle engine with the default resume policy
    pub fn new(ticks: Arc<dyn TickSource>) -> Self {
        Self::with_policy(ticks, ResumePolicy::default())
    }

    pub fn with_policy(ticks: Arc<dyn TickSource>, policy: ResumePolicy) -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    activity: Activity::Idle,
                    snapshot: TimerSnapshot::default(),
                    generation: 0,
                    ticker: None,
                }),
                published: RwLock::new(TimerSnapshot::default()),
                observers: Arc::new(Observers::default()),
                policy,
            }),
            ticks,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Latest published snapshot
    pub fn snapshot(&self) -> TimerSnapshot {
        *self
            .shared
            .published
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> EngineStatus {
        match lock_unpoisoned(&self.shared.inner).activity {
            Activity::Idle => EngineStatus::Idle,
            Activity::Running(_) => EngineStatus::Running,
            Activity::Paused(_) => EngineStatus::Paused,
        }
    }

    pub fn policy(&self) -> ResumePolicy {
        self.shared.policy
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.observers.len()
    }

    // ── Observation ──────────────────────────────────────────────────

    /// Register a callback for every future snapshot.
    ///
    /// Callbacks run synchronously on the thread that produced the snapshot,
    /// while the engine's state lock is held. They must not call back into
    /// the engine; use [`TimerEngine::subscribe_channel`] for that.
    /// Unsubscribing from inside a callback is fine.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&TimerSnapshot) + Send + Sync + 'static,
    {
        self.shared.observers.subscribe(Box::new(callback))
    }

    /// Receive every future snapshot through a channel
    pub fn subscribe_channel(&self) -> (Receiver<TimerSnapshot>, Subscription) {
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let subscription = self.subscribe(move |snapshot| {
            // A dropped receiver just means nobody is listening any more
            let _ = lock_unpoisoned(&tx).send(*snapshot);
        });
        (rx, subscription)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Count down from `duration_ms` once
    pub fn start_fixed_time(&self, duration_ms: u64) -> Result<()> {
        self.start_countdown(duration_ms, TimerMode::FixedTime)
    }

    /// Count down a timed set; identical to fixed time apart from the mode tag
    pub fn start_series(&self, duration_ms: u64) -> Result<()> {
        self.start_countdown(duration_ms, TimerMode::Series)
    }

    /// Cycle work and rest sub-phases for `rounds` rounds.
    ///
    /// The final round ends after its work phase.
    pub fn start_interval(&self, work_ms: u64, rest_ms: u64, rounds: u32) -> Result<()> {
        if rounds < 1 {
            return Err(Error::InvalidInput(
                "interval runs need at least one round".into(),
            ));
        }
        if work_ms == 0 {
            return Err(Error::InvalidInput(
                "work duration must be greater than zero".into(),
            ));
        }

        tracing::debug!(
            "Starting interval: work={}ms rest={}ms rounds={}",
            work_ms,
            rest_ms,
            rounds
        );
        let mut inner = lock_unpoisoned(&self.shared.inner);
        self.begin(
            &mut inner,
            Run::Interval(IntervalRun::new(work_ms, rest_ms, rounds)),
            TimerSnapshot::default(),
        );
        Ok(())
    }

    /// Count up from zero until paused or stopped
    pub fn start_count_up(&self) {
        tracing::debug!("Starting count-up");
        let mut inner = lock_unpoisoned(&self.shared.inner);
        self.begin(
            &mut inner,
            Run::CountUp { elapsed_ms: 0 },
            TimerSnapshot::default(),
        );
    }

    /// Freeze the active run. No-op unless running.
    pub fn pause(&self) {
        let mut inner = lock_unpoisoned(&self.shared.inner);
        let Activity::Running(run) = inner.activity else {
            tracing::trace!("Pause ignored: timer not running");
            return;
        };

        inner.cancel_ticks();
        inner.activity = Activity::Paused(run);

        let mut snapshot = inner.snapshot;
        snapshot.is_running = false;
        snapshot.is_paused = true;
        tracing::debug!("Paused with {}ms on the clock", run.remainder_ms());
        self.shared.publish(&mut inner, snapshot);
    }

    /// Continue a paused run.
    ///
    /// No-op unless paused with a non-zero remainder. How the clock restarts
    /// depends on the mode and the engine's [`ResumePolicy`].
    pub fn resume(&self) {
        let mut inner = lock_unpoisoned(&self.shared.inner);
        let Activity::Paused(paused) = inner.activity else {
            tracing::trace!("Resume ignored: timer not paused");
            return;
        };
        if paused.remainder_ms() == 0 {
            tracing::trace!("Resume ignored: nothing left on the clock");
            return;
        }

        let run = paused.resumed(&self.shared.policy);
        tracing::debug!("Resuming {} run at {}ms", run.mode(), run.remainder_ms());
        let base = inner.snapshot;
        self.begin(&mut inner, run, base);
    }

    /// Cancel everything and return to the default snapshot. Always safe.
    pub fn stop(&self) {
        let mut inner = lock_unpoisoned(&self.shared.inner);
        inner.cancel_ticks();
        inner.activity = Activity::Idle;
        tracing::debug!("Timer stopped");
        self.shared.publish(&mut inner, TimerSnapshot::default());
    }

    /// Alias of [`TimerEngine::stop`]
    pub fn reset(&self) {
        self.stop();
    }

    fn start_countdown(&self, duration_ms: u64, mode: TimerMode) -> Result<()> {
        if duration_ms == 0 {
            return Err(Error::InvalidInput(
                "duration must be greater than zero".into(),
            ));
        }

        tracing::debug!("Starting {} countdown of {}ms", mode, duration_ms);
        let mut inner = lock_unpoisoned(&self.shared.inner);
        self.begin(
            &mut inner,
            Run::Countdown {
                remaining_ms: duration_ms,
                total_ms: duration_ms,
                mode,
            },
            TimerSnapshot::default(),
        );
        Ok(())
    }

    /// Replace whatever is active with `run`, publish its first snapshot
    /// (built on top of `base`) and schedule its ticks.
    fn begin(&self, inner: &mut Inner, run: Run, base: TimerSnapshot) {
        inner.cancel_ticks();

        let mut snapshot = base;
        run.write_into(&mut snapshot);
        snapshot.is_running = true;
        snapshot.is_paused = false;
        inner.activity = Activity::Running(run);
        self.shared.publish(inner, snapshot);

        let generation = inner.generation;
        let shared = Arc::downgrade(&self.shared);
        inner.ticker = Some(self.ticks.schedule(
            TICK_INTERVAL,
            Box::new(move || {
                if let Some(shared) = shared.upgrade() {
                    shared.on_tick(generation);
                }
            }),
        ));
    }
}

impl Drop for TimerEngine {
    fn drop(&mut self) {
        lock_unpoisoned(&self.shared.inner).cancel_ticks();
    }
}
