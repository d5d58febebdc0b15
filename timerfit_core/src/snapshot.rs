//! The observable timer state and its derived display values.

use crate::TimerMode;
use serde::{Deserialize, Serialize};

/// Colour band of the progress ring
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProgressBand {
    Green,
    Yellow,
    Red,
}

/// Point-in-time view of the timer, emitted after every tick and transition.
///
/// Only the engine produces snapshots; observers receive copies.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimerSnapshot {
    /// Remaining time in the current phase (elapsed time in count-up mode)
    pub time_left_ms: u64,
    /// Length of the current phase (elapsed time in count-up mode)
    pub total_time_ms: u64,
    pub is_running: bool,
    /// Paused, finished, or idle
    pub is_paused: bool,
    /// 1-based; only meaningful in interval mode
    pub current_round: u32,
    pub total_rounds: u32,
    /// Work (true) or rest (false); only meaningful in interval mode
    pub is_work_phase: bool,
    pub mode: TimerMode,
}

impl Default for TimerSnapshot {
    fn default() -> Self {
        Self {
            time_left_ms: 0,
            total_time_ms: 0,
            is_running: false,
            is_paused: true,
            current_round: 0,
            total_rounds: 1,
            is_work_phase: true,
            mode: TimerMode::FixedTime,
        }
    }
}

impl TimerSnapshot {
    /// Fraction of the current phase already elapsed, in `0.0..=1.0`.
    ///
    /// Zero when the phase has no length.
    pub fn progress(&self) -> f32 {
        if self.total_time_ms == 0 {
            return 0.0;
        }
        let elapsed = self.total_time_ms.saturating_sub(self.time_left_ms);
        elapsed as f32 / self.total_time_ms as f32
    }

    pub fn progress_band(&self) -> ProgressBand {
        let progress = self.progress();
        if progress > 0.75 {
            ProgressBand::Green
        } else if progress > 0.40 {
            ProgressBand::Yellow
        } else {
            ProgressBand::Red
        }
    }

    /// True once a countdown has run out (as opposed to idle or paused mid-run)
    pub fn is_finished(&self) -> bool {
        !self.is_running && self.time_left_ms == 0 && self.total_time_ms > 0
    }
}

/// Format milliseconds as "MM:SS", the way the countdown is shown on screen
pub fn format_clock(ms: u64) -> String {
    let total_secs = ms / 1000;
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

/// Format milliseconds as "Xm Ys", or "Ys" below one minute
pub fn format_duration(ms: u64) -> String {
    let total_secs = ms / 1000;
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
