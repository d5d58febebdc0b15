#![forbid(unsafe_code)]

//! Core timer engine and session bookkeeping for timerfit.
//!
//! This crate provides:
//! - Domain types (timer modes, exercises, sessions)
//! - The timer engine with its injectable tick source
//! - Snapshot publish/subscribe
//! - Exercise catalog
//! - Persistence (WAL, CSV archive, history queries)
//! - A recorder that turns finished runs into sessions

pub mod types;
pub mod error;
pub mod snapshot;
pub mod ticker;
pub mod observer;
pub mod run;
pub mod engine;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod wal;
pub mod csv_rollup;
pub mod history;
pub mod store;
pub mod recorder;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use snapshot::{format_clock, format_duration, ProgressBand, TimerSnapshot};
pub use ticker::{ManualTickSource, ThreadTickSource, TickHandle, TickSource};
pub use observer::Subscription;
pub use run::{CountUpResume, FixedTimeResume, ResumePolicy, TICK_MS};
pub use engine::{EngineStatus, TimerEngine, TICK_INTERVAL};
pub use catalog::{build_default_catalog, get_default_catalog};
pub use config::Config;
pub use wal::{JsonlSink, SessionSink};
pub use history::load_recent_sessions;
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};
pub use recorder::SessionRecorder;
