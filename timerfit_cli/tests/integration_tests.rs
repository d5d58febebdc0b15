//! Integration tests for the timerfit binary.
//!
//! These tests verify end-to-end behavior including:
//! - Simulated timer runs and session logging
//! - History, summary and rollup commands
//! - Argument validation

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the path to the CLI binary
fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("timerfit"))
}

fn run_fixed(data_dir: &Path, seconds: u64) {
    cli()
        .arg("fixed")
        .arg("--seconds")
        .arg(seconds.to_string())
        .arg("--simulate")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Session logged"));
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Workout timer with an exercise session log",
        ));
}

#[test]
fn test_fixed_run_counts_down_and_logs() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli()
        .arg("fixed")
        .arg("--seconds")
        .arg("3")
        .arg("--simulate")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("00:03"))
        .stdout(predicate::str::contains("00:01"))
        .stdout(predicate::str::contains("00:00"))
        .stdout(predicate::str::contains("General Exercise"))
        .stdout(predicate::str::contains("Session logged"));

    assert!(data_dir.join("wal/sessions.wal").exists());
}

#[test]
fn test_session_logged_to_wal() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli()
        .arg("fixed")
        .arg("--seconds")
        .arg("2")
        .arg("--exercise")
        .arg("plank")
        .arg("--series")
        .arg("--simulate")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success();

    let wal_content = fs::read_to_string(data_dir.join("wal/sessions.wal")).unwrap();
    let lines: Vec<&str> = wal_content.lines().collect();
    assert_eq!(lines.len(), 1);

    let session: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(session["exercise_id"], "plank");
    assert_eq!(session["exercise_name"], "Plank");
    assert_eq!(session["mode"], "series");
    assert_eq!(session["duration_ms"], 2000);
    assert!(session["rounds"].is_null());
}

#[test]
fn test_interval_run_logs_plan() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli()
        .arg("interval")
        .arg("--work")
        .arg("2")
        .arg("--rest")
        .arg("1")
        .arg("--rounds")
        .arg("2")
        .arg("--exercise")
        .arg("rowing")
        .arg("--simulate")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("round 1/2 WORK"))
        .stdout(predicate::str::contains("round 1/2 REST"))
        .stdout(predicate::str::contains("round 2/2 WORK"))
        .stdout(predicate::str::contains("round 2/2 REST").not())
        .stdout(predicate::str::contains("Finished Rowing in 5s"));

    cli()
        .arg("history")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Rowing"))
        .stdout(predicate::str::contains("interval"))
        .stdout(predicate::str::contains("(2 x 2s work / 1s rest)"));
}

#[test]
fn test_count_up_is_not_logged() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli()
        .arg("count-up")
        .arg("--limit")
        .arg("3")
        .arg("--simulate")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("00:02"))
        .stdout(predicate::str::contains("Stopped at 00:03"))
        .stdout(predicate::str::contains("Session logged").not());

    cli()
        .arg("history")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("No sessions logged."));
}

#[test]
fn test_count_up_simulate_requires_limit() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("count-up")
        .arg("--simulate")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .failure();
}

#[test]
fn test_invalid_timer_input_rejected() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli()
        .arg("fixed")
        .arg("--seconds")
        .arg("0")
        .arg("--simulate")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("duration must be greater than zero"));

    cli()
        .arg("interval")
        .arg("--rounds")
        .arg("0")
        .arg("--simulate")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .failure();

    // Nothing was logged by the rejected runs
    assert!(!data_dir.join("wal/sessions.wal").exists());
}

#[test]
fn test_oversized_durations_rejected() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli()
        .arg("fixed")
        .arg("--seconds")
        .arg("18446744073709552")
        .arg("--simulate")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--seconds is too large"))
        .stderr(predicate::str::contains("panicked").not());

    cli()
        .arg("interval")
        .arg("--rest")
        .arg(u64::MAX.to_string())
        .arg("--simulate")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--rest is too large"));

    cli()
        .arg("count-up")
        .arg("--limit")
        .arg("18446744073709552")
        .arg("--simulate")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--limit is too large"));
}

#[test]
fn test_out_of_range_history_window_rejected() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("history")
        .arg("--days")
        .arg(i64::MAX.to_string())
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("panicked").not());
}

#[test]
fn test_unknown_exercise_rejected() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("fixed")
        .arg("--exercise")
        .arg("no_such_exercise")
        .arg("--simulate")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown exercise"));
}

#[test]
fn test_exercises_listing() {
    cli()
        .arg("exercises")
        .assert()
        .success()
        .stdout(predicate::str::contains("squat"))
        .stdout(predicate::str::contains("Hamstring Stretch"));

    cli()
        .arg("exercises")
        .arg("--category")
        .arg("cardio")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rowing"))
        .stdout(predicate::str::contains("Plank").not());

    cli()
        .arg("exercises")
        .arg("--search")
        .arg("press")
        .assert()
        .success()
        .stdout(predicate::str::contains("Bench Press"))
        .stdout(predicate::str::contains("Military Press"))
        .stdout(predicate::str::contains("Squat").not());

    cli()
        .arg("exercises")
        .arg("--search")
        .arg("zzz")
        .assert()
        .success()
        .stdout(predicate::str::contains("No matching exercises."));

    cli()
        .arg("exercises")
        .arg("--category")
        .arg("bogus")
        .assert()
        .failure();
}

#[test]
fn test_history_and_summary() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli()
        .arg("summary")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("No sessions logged."));

    run_fixed(data_dir, 2);
    run_fixed(data_dir, 3);

    cli()
        .arg("summary")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 sessions  5s"));

    cli()
        .arg("history")
        .arg("--days")
        .arg("1")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("fixed_time"));

    cli()
        .arg("history")
        .arg("--date")
        .arg("2000-01-01")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("No sessions logged."));
}

#[test]
fn test_rollup_no_wal() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("rollup")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No WAL file found"));
}

#[test]
fn test_rollup_creates_csv() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    for _ in 0..3 {
        run_fixed(data_dir, 1);
    }

    cli()
        .arg("rollup")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Rolled up 3 sessions"));

    let csv_path = data_dir.join("sessions.csv");
    assert!(csv_path.exists());
    assert!(!data_dir.join("wal/sessions.wal").exists());
    assert!(data_dir.join("wal/sessions.wal.processed").exists());

    let csv_content = fs::read_to_string(&csv_path).unwrap();
    assert!(csv_content.starts_with("id,exercise_id,exercise_name,date"));
    assert_eq!(csv_content.lines().count(), 4);

    // History reads the archive
    cli()
        .arg("summary")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("3 sessions"));
}

#[test]
fn test_rollup_with_cleanup() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run_fixed(data_dir, 1);

    cli()
        .arg("rollup")
        .arg("--cleanup")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleaned up 1 processed WAL files"));

    assert!(!data_dir.join("wal/sessions.wal.processed").exists());
    assert!(data_dir.join("sessions.csv").exists());
}

#[test]
fn test_multiple_rollups_append() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run_fixed(data_dir, 1);
    cli()
        .arg("rollup")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success();

    run_fixed(data_dir, 1);
    cli()
        .arg("rollup")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success();

    let csv_content = fs::read_to_string(data_dir.join("sessions.csv")).unwrap();
    // One header plus two sessions
    assert_eq!(csv_content.lines().count(), 3);
}

#[test]
fn test_config_file_presets() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        "[timer]\nfixed_seconds = 4\n\n[resume]\nfixed_time = \"keep_total\"\n",
    )
    .unwrap();

    cli()
        .arg("fixed")
        .arg("--simulate")
        .arg("--config")
        .arg(&config_path)
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("00:04"))
        .stdout(predicate::str::contains("in 4s"));
}

#[test]
fn test_invalid_config_rejected() {
    let temp_dir = setup_test_dir();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "[timer]\nrounds = 0\n").unwrap();

    cli()
        .arg("summary")
        .arg("--config")
        .arg(&config_path)
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("timer.rounds"));
}
