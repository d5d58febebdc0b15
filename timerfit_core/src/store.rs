//! Session storage behind one trait.
//!
//! [`FileSessionStore`] is the durable backend: sessions go to the JSONL WAL
//! and queries read the WAL together with the CSV archive. The in-memory
//! store backs tests and embedders that do not persist.

use crate::history::{self, daily_summaries, sessions_on, sort_newest_first};
use crate::wal::{JsonlSink, SessionSink};
use crate::{DailySummary, ExerciseSession, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Where completed sessions are kept
pub trait SessionStore {
    fn insert(&mut self, session: &ExerciseSession) -> Result<()>;

    /// Sessions on one day, newest first
    fn query_by_date(&self, date: NaiveDate) -> Result<Vec<ExerciseSession>>;

    /// Every session, by date descending then newest first
    fn query_all(&self) -> Result<Vec<ExerciseSession>>;

    /// One entry per day with sessions, newest day first
    fn query_daily_summaries(&self) -> Result<Vec<DailySummary>> {
        Ok(daily_summaries(&self.query_all()?))
    }
}

/// WAL + CSV archive under one data directory.
///
/// Layout:
/// ```text
/// <data_dir>/wal/sessions.wal
/// <data_dir>/sessions.csv
/// ```
pub struct FileSessionStore {
    data_dir: PathBuf,
    sink: JsonlSink,
}

impl FileSessionStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let sink = JsonlSink::new(data_dir.join("wal").join("sessions.wal"));
        Self { data_dir, sink }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn wal_dir(&self) -> PathBuf {
        self.data_dir.join("wal")
    }

    pub fn wal_path(&self) -> &Path {
        self.sink.path()
    }

    pub fn csv_path(&self) -> PathBuf {
        self.data_dir.join("sessions.csv")
    }

    /// Move WAL sessions into the CSV archive. Returns how many moved.
    pub fn rollup(&self) -> Result<usize> {
        crate::csv_rollup::wal_to_csv_and_archive(self.wal_path(), &self.csv_path())
    }

    /// Delete WAL files already archived by [`FileSessionStore::rollup`]
    pub fn cleanup_processed(&self) -> Result<usize> {
        crate::csv_rollup::cleanup_processed_wals(&self.wal_dir())
    }
}

impl SessionStore for FileSessionStore {
    fn insert(&mut self, session: &ExerciseSession) -> Result<()> {
        self.sink.append(session)?;
        tracing::info!(
            "Stored session {} ({}, {}ms)",
            session.id,
            session.exercise_id,
            session.duration_ms
        );
        Ok(())
    }

    fn query_by_date(&self, date: NaiveDate) -> Result<Vec<ExerciseSession>> {
        Ok(sessions_on(&self.query_all()?, date))
    }

    fn query_all(&self) -> Result<Vec<ExerciseSession>> {
        history::load_all_sessions(self.wal_path(), &self.csv_path())
    }
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Vec<ExerciseSession>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn insert(&mut self, session: &ExerciseSession) -> Result<()> {
        self.sessions.push(session.clone());
        Ok(())
    }

    fn query_by_date(&self, date: NaiveDate) -> Result<Vec<ExerciseSession>> {
        Ok(sessions_on(&self.query_all()?, date))
    }

    fn query_all(&self) -> Result<Vec<ExerciseSession>> {
        let mut sessions = self.sessions.clone();
        sort_newest_first(&mut sessions);
        Ok(sessions)
    }
}
