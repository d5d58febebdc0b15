//! Timer run state as explicit values.
//!
//! Every valid combination of mode, phase, round and remainder is one
//! [`Run`] value. The engine wraps it in an [`Activity`] to say whether it
//! is ticking or paused; the paused run doubles as the information needed to
//! resume it.

use crate::{TimerMode, TimerSnapshot};
use serde::{Deserialize, Serialize};

/// Milliseconds a single tick advances the clock
pub const TICK_MS: u64 = 100;

/// Sub-phase of one interval round
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Work,
    Rest,
}

/// Position inside a work/rest interval run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntervalRun {
    pub phase: Phase,
    /// 1-based, never above `total_rounds`
    pub round: u32,
    pub total_rounds: u32,
    pub work_ms: u64,
    pub rest_ms: u64,
    pub remaining_ms: u64,
}

impl IntervalRun {
    pub fn new(work_ms: u64, rest_ms: u64, total_rounds: u32) -> Self {
        Self {
            phase: Phase::Work,
            round: 1,
            total_rounds,
            work_ms,
            rest_ms,
            remaining_ms: work_ms,
        }
    }

    /// Full length of the current sub-phase
    pub fn phase_ms(&self) -> u64 {
        match self.phase {
            Phase::Work => self.work_ms,
            Phase::Rest => self.rest_ms,
        }
    }

    /// Move to the sub-phase after the one that just ran out.
    ///
    /// Returns false when the run is over. The last round has no rest, and a
    /// zero rest duration goes straight to the next round's work.
    fn next_phase(&mut self) -> bool {
        match self.phase {
            Phase::Work if self.round >= self.total_rounds => {
                self.round = self.total_rounds;
                false
            }
            Phase::Work if self.rest_ms > 0 => {
                self.phase = Phase::Rest;
                self.remaining_ms = self.rest_ms;
                true
            }
            Phase::Work | Phase::Rest => {
                self.round += 1;
                if self.round > self.total_rounds {
                    self.round = self.total_rounds;
                    return false;
                }
                self.phase = Phase::Work;
                self.remaining_ms = self.work_ms;
                true
            }
        }
    }
}

/// One active timer process
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Run {
    /// Fixed-time or series countdown
    Countdown {
        remaining_ms: u64,
        total_ms: u64,
        mode: TimerMode,
    },
    Interval(IntervalRun),
    CountUp { elapsed_ms: u64 },
}

/// What a single tick did to a run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    Ticked,
    /// An interval sub-phase ended and the next one has begun
    PhaseChanged,
    Finished,
}

impl Run {
    pub fn mode(&self) -> TimerMode {
        match self {
            Run::Countdown { mode, .. } => *mode,
            Run::Interval(_) => TimerMode::Interval,
            Run::CountUp { .. } => TimerMode::CountUp,
        }
    }

    /// The value shown as `time_left_ms`: remaining time, or elapsed time when
    /// counting up. Captured on pause as the paused remainder.
    pub fn remainder_ms(&self) -> u64 {
        match self {
            Run::Countdown { remaining_ms, .. } => *remaining_ms,
            Run::Interval(interval) => interval.remaining_ms,
            Run::CountUp { elapsed_ms } => *elapsed_ms,
        }
    }

    /// Advance the clock by `step_ms`
    pub fn advance(&mut self, step_ms: u64) -> Advance {
        match self {
            Run::Countdown { remaining_ms, .. } => {
                *remaining_ms = remaining_ms.saturating_sub(step_ms);
                if *remaining_ms == 0 {
                    Advance::Finished
                } else {
                    Advance::Ticked
                }
            }
            Run::Interval(interval) => {
                interval.remaining_ms = interval.remaining_ms.saturating_sub(step_ms);
                if interval.remaining_ms > 0 {
                    Advance::Ticked
                } else if interval.next_phase() {
                    Advance::PhaseChanged
                } else {
                    Advance::Finished
                }
            }
            Run::CountUp { elapsed_ms } => {
                *elapsed_ms = elapsed_ms.saturating_add(step_ms);
                Advance::Ticked
            }
        }
    }

    /// Copy this run's clock, phase and mode fields into a snapshot.
    ///
    /// Running/paused flags are left to the caller.
    pub fn write_into(&self, snapshot: &mut TimerSnapshot) {
        snapshot.mode = self.mode();
        match self {
            Run::Countdown {
                remaining_ms,
                total_ms,
                ..
            } => {
                snapshot.time_left_ms = *remaining_ms;
                snapshot.total_time_ms = *total_ms;
            }
            Run::Interval(interval) => {
                snapshot.time_left_ms = interval.remaining_ms;
                snapshot.total_time_ms = interval.phase_ms();
                snapshot.current_round = interval.round;
                snapshot.total_rounds = interval.total_rounds;
                snapshot.is_work_phase = interval.phase == Phase::Work;
            }
            Run::CountUp { elapsed_ms } => {
                snapshot.time_left_ms = *elapsed_ms;
                snapshot.total_time_ms = *elapsed_ms;
            }
        }
    }

    /// The run to start when resuming this paused run
    pub fn resumed(self, policy: &ResumePolicy) -> Run {
        match self {
            Run::Countdown {
                remaining_ms,
                total_ms,
                mode,
            } => match policy.fixed_time {
                FixedTimeResume::ResetTotal => Run::Countdown {
                    remaining_ms,
                    total_ms: remaining_ms,
                    mode,
                },
                FixedTimeResume::KeepTotal => Run::Countdown {
                    remaining_ms,
                    total_ms,
                    mode,
                },
            },
            Run::Interval(interval) => Run::Interval(interval),
            Run::CountUp { elapsed_ms } => match policy.count_up {
                CountUpResume::Continue => Run::CountUp { elapsed_ms },
                CountUpResume::Restart => Run::CountUp { elapsed_ms: 0 },
            },
        }
    }
}

/// Whether the engine has a run and whether it is ticking
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Activity {
    #[default]
    Idle,
    Running(Run),
    Paused(Run),
}

// ============================================================================
// Resume policy
// ============================================================================

/// How a paused fixed-time or series countdown resumes
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FixedTimeResume {
    /// The paused remainder becomes the new total, so progress restarts at 0
    #[default]
    ResetTotal,
    /// Keep the original total so progress continues where it stopped
    KeepTotal,
}

/// How a paused count-up resumes
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CountUpResume {
    /// Keep counting from the elapsed time at pause
    #[default]
    Continue,
    /// Start counting again from zero
    Restart,
}

/// Resume behaviour per mode. Interval runs always resume in place.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResumePolicy {
    #[serde(default)]
    pub fixed_time: FixedTimeResume,
    #[serde(default)]
    pub count_up: CountUpResume,
}
