//! Session history loading and per-day aggregation.
//!
//! History is the union of the live WAL and the CSV archive. Sessions that
//! appear in both (rolled up but WAL not yet cleaned) are reported once.

use crate::csv_rollup::CsvRow;
use crate::{DailySummary, Error, ExerciseSession, Result, TimerMode};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use csv::ReaderBuilder;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use uuid::Uuid;

impl TryFrom<CsvRow> for ExerciseSession {
    type Error = Error;

    fn try_from(row: CsvRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| Error::Other(format!("Invalid UUID: {}", e)))?;

        let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d")
            .map_err(|e| Error::Other(format!("Invalid date: {}", e)))?;

        let recorded_at = DateTime::parse_from_rfc3339(&row.recorded_at)
            .map_err(|e| Error::Other(format!("Invalid timestamp: {}", e)))?
            .with_timezone(&Utc);

        let mode = TimerMode::parse(&row.mode)
            .ok_or_else(|| Error::Other(format!("Unknown timer mode '{}'", row.mode)))?;

        Ok(ExerciseSession {
            id,
            exercise_id: row.exercise_id,
            exercise_name: row.exercise_name,
            date,
            recorded_at,
            duration_ms: row.duration_ms,
            mode,
            rounds: row.rounds,
            work_ms: row.work_ms,
            rest_ms: row.rest_ms,
        })
    }
}

/// Order sessions by date, newest first; same-day sessions newest first
pub fn sort_newest_first(sessions: &mut [ExerciseSession]) {
    sessions.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.recorded_at.cmp(&a.recorded_at))
    });
}

/// Load every session from both WAL and CSV, newest first
pub fn load_all_sessions(wal_path: &Path, csv_path: &Path) -> Result<Vec<ExerciseSession>> {
    let mut sessions = Vec::new();
    let mut seen_ids = HashSet::new();

    // WAL first: it holds the most recent writes
    for session in crate::wal::read_sessions(wal_path)? {
        if seen_ids.insert(session.id) {
            sessions.push(session);
        }
    }

    if csv_path.exists() {
        let mut csv_count = 0;
        for session in load_sessions_from_csv(csv_path)? {
            if seen_ids.insert(session.id) {
                sessions.push(session);
                csv_count += 1;
            }
        }
        tracing::debug!("Loaded {} sessions from CSV", csv_count);
    }

    sort_newest_first(&mut sessions);
    tracing::debug!("Loaded {} total sessions", sessions.len());
    Ok(sessions)
}

/// Sessions from the last `days` days up to and including `today`
pub fn load_recent_sessions(
    wal_path: &Path,
    csv_path: &Path,
    today: NaiveDate,
    days: i64,
) -> Result<Vec<ExerciseSession>> {
    let cutoff = Duration::try_days(days)
        .filter(|_| days >= 0)
        .and_then(|window| today.checked_sub_signed(window))
        .ok_or_else(|| Error::InvalidInput(format!("Cannot look back {} days", days)))?;
    let mut sessions = load_all_sessions(wal_path, csv_path)?;
    sessions.retain(|s| s.date > cutoff && s.date <= today);

    tracing::info!(
        "Loaded {} sessions from the last {} days",
        sessions.len(),
        days
    );
    Ok(sessions)
}

fn load_sessions_from_csv(path: &Path) -> Result<Vec<ExerciseSession>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut sessions = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        match result {
            Ok(row) => match ExerciseSession::try_from(row) {
                Ok(session) => sessions.push(session),
                Err(e) => {
                    tracing::warn!("Failed to parse CSV row: {}", e);
                }
            },
            Err(e) => {
                tracing::warn!("Failed to deserialize CSV row: {}", e);
            }
        }
    }

    Ok(sessions)
}

/// Sessions recorded on `date`, keeping the input order
pub fn sessions_on(sessions: &[ExerciseSession], date: NaiveDate) -> Vec<ExerciseSession> {
    sessions.iter().filter(|s| s.date == date).cloned().collect()
}

/// One summary per day that has sessions, newest day first
pub fn daily_summaries(sessions: &[ExerciseSession]) -> Vec<DailySummary> {
    let mut by_day: BTreeMap<NaiveDate, (usize, u64)> = BTreeMap::new();
    for session in sessions {
        let entry = by_day.entry(session.date).or_insert((0, 0));
        entry.0 += 1;
        entry.1 = entry.1.saturating_add(session.duration_ms);
    }

    by_day
        .into_iter()
        .rev()
        .map(|(date, (session_count, total_duration_ms))| DailySummary {
            date,
            session_count,
            total_duration_ms,
        })
        .collect()
}
