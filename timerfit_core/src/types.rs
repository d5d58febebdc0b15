//! Core domain types for timerfit.
//!
//! This module defines the data shared between the timer engine and its
//! collaborators:
//! - Timer modes
//! - Exercises and the catalog that holds them
//! - Recorded sessions and per-day summaries

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Timer Mode
// ============================================================================

/// Operating mode of a timer run
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    /// Single countdown of a fixed duration
    #[default]
    FixedTime,
    /// Work/rest cycling over a number of rounds
    Interval,
    /// Timed set; counts down exactly like `FixedTime`
    Series,
    /// Open-ended stopwatch
    CountUp,
}

impl TimerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerMode::FixedTime => "fixed_time",
            TimerMode::Interval => "interval",
            TimerMode::Series => "series",
            TimerMode::CountUp => "count_up",
        }
    }

    /// Inverse of [`TimerMode::as_str`]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "fixed_time" => Some(TimerMode::FixedTime),
            "interval" => Some(TimerMode::Interval),
            "series" => Some(TimerMode::Series),
            "count_up" => Some(TimerMode::CountUp),
            _ => None,
        }
    }
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// ============================================================================
// Exercise Types
// ============================================================================

/// Broad training category of an exercise
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseCategory {
    Multiarticular,
    Isolation,
    Cardio,
    Core,
    Flexibility,
}

impl ExerciseCategory {
    pub const ALL: [ExerciseCategory; 5] = [
        ExerciseCategory::Multiarticular,
        ExerciseCategory::Isolation,
        ExerciseCategory::Cardio,
        ExerciseCategory::Core,
        ExerciseCategory::Flexibility,
    ];

    /// Parse a category name as typed by a user (case-insensitive)
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "multiarticular" | "compound" => Some(ExerciseCategory::Multiarticular),
            "isolation" => Some(ExerciseCategory::Isolation),
            "cardio" => Some(ExerciseCategory::Cardio),
            "core" => Some(ExerciseCategory::Core),
            "flexibility" | "mobility" => Some(ExerciseCategory::Flexibility),
            _ => None,
        }
    }
}

/// Difficulty rating of an exercise
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

/// An exercise a timer run can be attached to
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub group: String,
    pub icon_key: String,
    pub category: ExerciseCategory,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub muscles: Vec<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default = "default_equipment")]
    pub equipment: String,
}

fn default_equipment() -> String {
    "Bodyweight only".into()
}

impl Exercise {
    /// Label used for sessions recorded without a selected exercise
    pub fn generic() -> Self {
        Exercise {
            id: "generic".into(),
            name: "General Exercise".into(),
            group: "General".into(),
            icon_key: "generic".into(),
            category: ExerciseCategory::Multiarticular,
            description: String::new(),
            muscles: Vec::new(),
            difficulty: Difficulty::default(),
            equipment: default_equipment(),
        }
    }
}

// ============================================================================
// Session Types
// ============================================================================

/// A completed timer run, attached to an exercise
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseSession {
    pub id: Uuid,
    pub exercise_id: String,
    pub exercise_name: String,
    /// Local calendar day the session belongs to
    pub date: NaiveDate,
    pub recorded_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub mode: TimerMode,
    pub rounds: Option<u32>,
    pub work_ms: Option<u64>,
    pub rest_ms: Option<u64>,
}

/// Aggregate of all sessions recorded on one day
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub session_count: usize,
    pub total_duration_ms: u64,
}

// ============================================================================
// Catalog Type
// ============================================================================

/// The read-only set of exercises a user can pick from
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub exercises: Vec<Exercise>,
}
