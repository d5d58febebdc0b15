use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;
use timerfit_core::*;

#[derive(Parser)]
#[command(name = "timerfit")]
#[command(about = "Workout timer with an exercise session log", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the exercise catalog
    Exercises {
        /// Only this category (multiarticular, isolation, cardio, core, flexibility)
        #[arg(long)]
        category: Option<String>,

        /// Case-insensitive text search
        #[arg(long)]
        search: Option<String>,
    },

    /// Count down a fixed duration
    Fixed {
        /// Duration in seconds (default from config)
        #[arg(long)]
        seconds: Option<u64>,

        /// Exercise id to log the session under
        #[arg(long)]
        exercise: Option<String>,

        /// Log as a timed series instead of a plain countdown
        #[arg(long)]
        series: bool,

        /// Run without waiting on the wall clock (for scripting and tests)
        #[arg(long)]
        simulate: bool,
    },

    /// Alternate work and rest for a number of rounds
    Interval {
        /// Work phase in seconds
        #[arg(long)]
        work: Option<u64>,

        /// Rest phase in seconds (0 skips rest)
        #[arg(long)]
        rest: Option<u64>,

        /// Number of rounds
        #[arg(long)]
        rounds: Option<u32>,

        #[arg(long)]
        exercise: Option<String>,

        #[arg(long)]
        simulate: bool,
    },

    /// Stopwatch; count-up runs are not logged
    CountUp {
        /// Stop automatically after this many seconds
        #[arg(long)]
        limit: Option<u64>,

        #[arg(long)]
        exercise: Option<String>,

        #[arg(long, requires = "limit")]
        simulate: bool,
    },

    /// Show logged sessions, newest first
    History {
        /// Only sessions on this day (YYYY-MM-DD)
        #[arg(long, conflicts_with = "days")]
        date: Option<NaiveDate>,

        /// Only sessions from the last N days
        #[arg(long)]
        days: Option<i64>,
    },

    /// Per-day totals, newest day first
    Summary,

    /// Roll up WAL sessions to CSV
    Rollup {
        /// Clean up processed WAL files after rollup
        #[arg(long)]
        cleanup: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        timerfit_core::logging::init_with_level("debug");
    } else {
        timerfit_core::logging::init();
    }

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());

    match cli.command {
        Commands::Exercises { category, search } => cmd_exercises(category, search),
        Commands::Fixed {
            seconds,
            exercise,
            series,
            simulate,
        } => {
            let duration_ms =
                to_millis(seconds.unwrap_or(config.timer.fixed_seconds), "--seconds")?;
            let session = TimerSession::new(data_dir, &config, exercise, simulate)?;
            session.run(None, |recorder| {
                if series {
                    recorder.start_series(duration_ms)
                } else {
                    recorder.start_fixed_time(duration_ms)
                }
            })
        }
        Commands::Interval {
            work,
            rest,
            rounds,
            exercise,
            simulate,
        } => {
            let work_ms = to_millis(work.unwrap_or(config.timer.work_seconds), "--work")?;
            let rest_ms = to_millis(rest.unwrap_or(config.timer.rest_seconds), "--rest")?;
            let rounds = rounds.unwrap_or(config.timer.rounds);
            let session = TimerSession::new(data_dir, &config, exercise, simulate)?;
            session.run(None, |recorder| {
                recorder.start_interval(work_ms, rest_ms, rounds)
            })
        }
        Commands::CountUp {
            limit,
            exercise,
            simulate,
        } => {
            let limit_ms = limit.map(|s| to_millis(s, "--limit")).transpose()?;
            let session = TimerSession::new(data_dir, &config, exercise, simulate)?;
            session.run(limit_ms, |recorder| {
                recorder.start_count_up();
                Ok(())
            })
        }
        Commands::History { date, days } => cmd_history(data_dir, date, days),
        Commands::Summary => cmd_summary(data_dir),
        Commands::Rollup { cleanup } => cmd_rollup(data_dir, cleanup),
    }
}

/// Seconds from the command line to engine milliseconds
fn to_millis(seconds: u64, flag: &str) -> Result<u64> {
    seconds.checked_mul(1000).ok_or_else(|| {
        Error::InvalidInput(format!("{} is too large: {} seconds", flag, seconds))
    })
}

fn load_catalog() -> Result<&'static Catalog> {
    let catalog = get_default_catalog();
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }
    Ok(catalog)
}

fn cmd_exercises(category: Option<String>, search: Option<String>) -> Result<()> {
    let catalog = load_catalog()?;

    let category = match category {
        Some(name) => Some(ExerciseCategory::parse(&name).ok_or_else(|| {
            Error::InvalidInput(format!(
                "Unknown category '{}'. Expected one of: multiarticular, isolation, cardio, core, flexibility",
                name
            ))
        })?),
        None => None,
    };

    let exercises = catalog.search(search.as_deref().unwrap_or(""), category);
    if exercises.is_empty() {
        println!("No matching exercises.");
        return Ok(());
    }

    let mut current_group = "";
    for exercise in exercises {
        if exercise.group != current_group {
            println!("\n{}", exercise.group);
            current_group = exercise.group.as_str();
        }
        println!(
            "  {:<20} {:<20} {:?}, {:?}",
            exercise.id, exercise.name, exercise.category, exercise.difficulty
        );
    }
    println!();

    Ok(())
}

// ============================================================================
// Timer runs
// ============================================================================

/// Keyboard commands accepted while a timer runs
enum Control {
    Pause,
    Resume,
    Stop,
}

/// How long to wait for a snapshot before polling keyboard input again
const POLL_INTERVAL: Duration = Duration::from_millis(200);

struct TimerSession {
    recorder: SessionRecorder<FileSessionStore>,
    snapshots: Receiver<TimerSnapshot>,
    _subscription: Subscription,
    /// Present when simulating; drives the engine instead of the clock
    manual: Option<ManualTickSource>,
}

impl TimerSession {
    fn new(
        data_dir: PathBuf,
        config: &Config,
        exercise_id: Option<String>,
        simulate: bool,
    ) -> Result<Self> {
        let exercise = match exercise_id {
            Some(id) => Some(load_catalog()?.by_id(&id).cloned().ok_or_else(|| {
                Error::InvalidInput(format!(
                    "Unknown exercise '{}'. Run `timerfit exercises` to list them.",
                    id
                ))
            })?),
            None => None,
        };

        std::fs::create_dir_all(data_dir.join("wal"))?;

        let manual = simulate.then(ManualTickSource::new);
        let ticks: Arc<dyn TickSource> = match &manual {
            Some(manual) => Arc::new(manual.clone()),
            None => Arc::new(ThreadTickSource::new()),
        };

        let engine = TimerEngine::with_policy(ticks, config.resume);
        let (snapshots, subscription) = engine.subscribe_channel();

        let mut recorder = SessionRecorder::new(engine, FileSessionStore::new(data_dir));
        recorder.select_exercise(exercise);

        Ok(Self {
            recorder,
            snapshots,
            _subscription: subscription,
            manual,
        })
    }

    /// Start a run with `start`, render it until it ends, and log it.
    ///
    /// `limit_ms` stops a count-up once that much time has elapsed.
    fn run<F>(mut self, limit_ms: Option<u64>, start: F) -> Result<()>
    where
        F: FnOnce(&mut SessionRecorder<FileSessionStore>) -> Result<()>,
    {
        start(&mut self.recorder)?;

        let label = self
            .recorder
            .selected_exercise()
            .map(|e| e.name.clone())
            .unwrap_or_else(|| Exercise::generic().name);
        println!("▶ {} ({})", label, self.recorder.snapshot().mode);

        let controls = if self.manual.is_some() {
            // Simulated runs never read the keyboard
            mpsc::channel().1
        } else {
            println!("  p + Enter to pause, r + Enter to resume, s + Enter to stop");
            spawn_control_reader()
        };

        let mut status = StatusLine::default();
        loop {
            match &self.manual {
                Some(manual) => manual.advance(1),
                None => match self.snapshots.recv_timeout(POLL_INTERVAL) {
                    Ok(snapshot) => status.render(&snapshot)?,
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                },
            }
            for snapshot in self.snapshots.try_iter() {
                status.render(&snapshot)?;
            }

            for control in controls.try_iter() {
                match control {
                    Control::Pause => self.recorder.pause(),
                    Control::Resume => self.recorder.resume(),
                    Control::Stop => {
                        self.recorder.stop();
                        println!("\n■ Stopped - session not logged.");
                        return Ok(());
                    }
                }
            }

            let snapshot = self.recorder.snapshot();
            if snapshot.is_finished() {
                break;
            }
            if snapshot.mode == TimerMode::CountUp
                && limit_ms.is_some_and(|limit| snapshot.time_left_ms >= limit)
            {
                self.recorder.stop();
                println!(
                    "\n■ Stopped at {} - count-up runs are not logged.",
                    format_clock(snapshot.time_left_ms)
                );
                return Ok(());
            }
        }

        let today = chrono::Local::now().date_naive();
        match self.recorder.save_if_complete(today) {
            Some(session) => {
                println!(
                    "\n✓ Finished {} in {}",
                    session.exercise_name,
                    format_duration(session.duration_ms)
                );
                println!("✓ Session logged!");
            }
            None => {
                println!("\n✓ Finished");
                println!("Session could not be logged; see the log for details.");
            }
        }

        Ok(())
    }
}

fn spawn_control_reader() -> Receiver<Control> {
    let (tx, rx) = mpsc::channel();
    let spawned = std::thread::Builder::new()
        .name("timerfit-stdin".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                let control = match line.trim().to_lowercase().as_str() {
                    "p" => Control::Pause,
                    "r" => Control::Resume,
                    "s" => Control::Stop,
                    _ => continue,
                };
                if tx.send(control).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        tracing::warn!("Keyboard controls unavailable: {}", e);
    }
    rx
}

/// Prints one line per visible change: a new whole second, phase or state
#[derive(Default)]
struct StatusLine {
    last: Option<(u64, u32, bool, bool, bool)>,
}

impl StatusLine {
    fn render(&mut self, snapshot: &TimerSnapshot) -> Result<()> {
        let key = (
            snapshot.time_left_ms / 1000,
            snapshot.current_round,
            snapshot.is_work_phase,
            snapshot.is_running,
            snapshot.is_paused,
        );
        // The idle snapshot after a stop has nothing worth showing
        let idle = !snapshot.is_running && snapshot.total_time_ms == 0;
        if self.last == Some(key) || idle {
            return Ok(());
        }
        self.last = Some(key);

        let mut line = format!("  {}", format_clock(snapshot.time_left_ms));
        if snapshot.mode == TimerMode::Interval {
            line.push_str(&format!(
                "  round {}/{} {}",
                snapshot.current_round,
                snapshot.total_rounds,
                if snapshot.is_work_phase { "WORK" } else { "REST" }
            ));
        }
        if snapshot.mode != TimerMode::CountUp {
            line.push_str(&format!("  [{:?}]", snapshot.progress_band()));
        }
        if snapshot.is_paused && !snapshot.is_finished() {
            line.push_str("  (paused)");
        }

        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", line)?;
        stdout.flush()?;
        Ok(())
    }
}

// ============================================================================
// History
// ============================================================================

fn cmd_history(data_dir: PathBuf, date: Option<NaiveDate>, days: Option<i64>) -> Result<()> {
    let store = FileSessionStore::new(data_dir);

    let sessions = match (date, days) {
        (Some(date), _) => store.query_by_date(date)?,
        (None, Some(days)) => load_recent_sessions(
            store.wal_path(),
            &store.csv_path(),
            chrono::Local::now().date_naive(),
            days,
        )?,
        (None, None) => store.query_all()?,
    };

    if sessions.is_empty() {
        println!("No sessions logged.");
        return Ok(());
    }

    for session in &sessions {
        let mut line = format!(
            "{}  {:<20} {:<10} {}",
            session.date,
            session.exercise_name,
            session.mode,
            format_duration(session.duration_ms)
        );
        if let (Some(rounds), Some(work), Some(rest)) =
            (session.rounds, session.work_ms, session.rest_ms)
        {
            line.push_str(&format!(
                "  ({} x {}s work / {}s rest)",
                rounds,
                work / 1000,
                rest / 1000
            ));
        }
        println!("{}", line);
    }

    Ok(())
}

fn cmd_summary(data_dir: PathBuf) -> Result<()> {
    let store = FileSessionStore::new(data_dir);
    let summaries = store.query_daily_summaries()?;

    if summaries.is_empty() {
        println!("No sessions logged.");
        return Ok(());
    }

    for summary in summaries {
        println!(
            "{}  {} session{}  {}",
            summary.date,
            summary.session_count,
            if summary.session_count == 1 { "" } else { "s" },
            format_duration(summary.total_duration_ms)
        );
    }

    Ok(())
}

fn cmd_rollup(data_dir: PathBuf, cleanup: bool) -> Result<()> {
    let store = FileSessionStore::new(data_dir);

    if !store.wal_path().exists() {
        println!("No WAL file found - nothing to roll up.");
        return Ok(());
    }

    let count = store.rollup()?;

    println!("✓ Rolled up {} sessions to CSV", count);
    println!("  CSV: {}", store.csv_path().display());

    if cleanup {
        let cleaned = store.cleanup_processed()?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed WAL files", cleaned);
        }
    }

    Ok(())
}
