//! Glue between a [`TimerEngine`] and a [`SessionStore`].
//!
//! The recorder starts runs on behalf of a front end, remembers what each
//! run was asked to do, and turns a finished countdown into exactly one
//! stored [`ExerciseSession`].

use crate::engine::TimerEngine;
use crate::store::SessionStore;
use crate::{Exercise, ExerciseSession, Result, TimerMode, TimerSnapshot};
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

/// What the current run was started with
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RunPlan {
    Countdown {
        duration_ms: u64,
        mode: TimerMode,
    },
    Interval {
        work_ms: u64,
        rest_ms: u64,
        rounds: u32,
    },
    CountUp,
}

impl RunPlan {
    fn mode(&self) -> TimerMode {
        match self {
            RunPlan::Countdown { mode, .. } => *mode,
            RunPlan::Interval { .. } => TimerMode::Interval,
            RunPlan::CountUp => TimerMode::CountUp,
        }
    }

    /// Planned length of the whole run; `None` for open-ended runs
    fn duration_ms(&self) -> Option<u64> {
        match *self {
            RunPlan::Countdown { duration_ms, .. } => Some(duration_ms),
            RunPlan::Interval {
                work_ms,
                rest_ms,
                rounds,
            } => {
                let rounds = u64::from(rounds);
                Some(
                    work_ms
                        .saturating_mul(rounds)
                        .saturating_add(rest_ms.saturating_mul(rounds.saturating_sub(1))),
                )
            }
            RunPlan::CountUp => None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct ActiveRun {
    id: Uuid,
    plan: RunPlan,
}

pub struct SessionRecorder<S: SessionStore> {
    engine: TimerEngine,
    store: S,
    exercise: Option<Exercise>,
    current: Option<ActiveRun>,
    /// Run id of the last stored session
    last_saved: Option<Uuid>,
}

impl<S: SessionStore> SessionRecorder<S> {
    pub fn new(engine: TimerEngine, store: S) -> Self {
        Self {
            engine,
            store,
            exercise: None,
            current: None,
            last_saved: None,
        }
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Exercise attached to sessions recorded from now on
    pub fn select_exercise(&mut self, exercise: Option<Exercise>) {
        if let Some(ref e) = exercise {
            tracing::debug!("Selected exercise '{}'", e.id);
        }
        self.exercise = exercise;
    }

    pub fn selected_exercise(&self) -> Option<&Exercise> {
        self.exercise.as_ref()
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.engine.snapshot()
    }

    pub fn start_fixed_time(&mut self, duration_ms: u64) -> Result<()> {
        self.engine.start_fixed_time(duration_ms)?;
        self.track(RunPlan::Countdown {
            duration_ms,
            mode: TimerMode::FixedTime,
        });
        Ok(())
    }

    pub fn start_series(&mut self, duration_ms: u64) -> Result<()> {
        self.engine.start_series(duration_ms)?;
        self.track(RunPlan::Countdown {
            duration_ms,
            mode: TimerMode::Series,
        });
        Ok(())
    }

    pub fn start_interval(&mut self, work_ms: u64, rest_ms: u64, rounds: u32) -> Result<()> {
        self.engine.start_interval(work_ms, rest_ms, rounds)?;
        self.track(RunPlan::Interval {
            work_ms,
            rest_ms,
            rounds,
        });
        Ok(())
    }

    pub fn start_count_up(&mut self) {
        self.engine.start_count_up();
        self.track(RunPlan::CountUp);
    }

    pub fn pause(&self) {
        self.engine.pause();
    }

    pub fn resume(&self) {
        self.engine.resume();
    }

    /// Stop the engine and forget the current run
    pub fn stop(&mut self) {
        self.engine.stop();
        self.current = None;
    }

    fn track(&mut self, plan: RunPlan) {
        let id = Uuid::new_v4();
        tracing::debug!("Tracking run {} as {:?}", id, plan);
        self.current = Some(ActiveRun { id, plan });
    }

    /// Store the current run if it has just finished.
    ///
    /// Returns the stored session, or `None` when there is nothing to record:
    /// no run, run still active, open-ended count-up, already recorded, or the
    /// store refused the write (logged).
    pub fn save_if_complete(&mut self, today: NaiveDate) -> Option<ExerciseSession> {
        let run = self.current?;
        let snapshot = self.engine.snapshot();

        if !snapshot.is_finished() || snapshot.mode != run.plan.mode() {
            return None;
        }
        if self.last_saved == Some(run.id) {
            return None;
        }
        let duration_ms = run.plan.duration_ms()?;

        let exercise = self.exercise.clone().unwrap_or_else(Exercise::generic);
        let (rounds, work_ms, rest_ms) = match run.plan {
            RunPlan::Interval {
                work_ms,
                rest_ms,
                rounds,
            } => (Some(rounds), Some(work_ms), Some(rest_ms)),
            _ => (None, None, None),
        };

        let session = ExerciseSession {
            id: run.id,
            exercise_id: exercise.id,
            exercise_name: exercise.name,
            date: today,
            recorded_at: Utc::now(),
            duration_ms,
            mode: run.plan.mode(),
            rounds,
            work_ms,
            rest_ms,
        };

        match self.store.insert(&session) {
            Ok(()) => {
                self.last_saved = Some(run.id);
                Some(session)
            }
            Err(e) => {
                tracing::error!("Failed to record session {}: {}", session.id, e);
                None
            }
        }
    }
}
