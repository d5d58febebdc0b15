//! Concurrency tests for timerfit.
//!
//! These tests verify that multiple processes can safely:
//! - Write to the WAL simultaneously (file locking)
//! - Read history while others write
//! - Perform rollup operations without corruption

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("timerfit"))
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn log_session(data_dir: &Path) {
    cli()
        .arg("fixed")
        .arg("--seconds")
        .arg("1")
        .arg("--simulate")
        .arg("--data-dir")
        .arg(data_dir)
        .timeout(Duration::from_secs(10))
        .assert()
        .success();
}

fn wal_path(data_dir: &Path) -> PathBuf {
    data_dir.join("wal/sessions.wal")
}

#[test]
fn test_sequential_session_logging() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    for i in 0..5 {
        thread::sleep(Duration::from_millis(i * 5));
        log_session(&data_dir);
    }

    let wal_content = std::fs::read_to_string(wal_path(&data_dir)).expect("Failed to read WAL");
    let session_count = wal_content.lines().count();
    assert_eq!(
        session_count, 5,
        "Expected 5 sessions, got {}",
        session_count
    );
}

#[test]
fn test_reads_during_writes() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    log_session(&data_dir);

    let reader_dir = data_dir.clone();
    let reader = thread::spawn(move || {
        for _ in 0..5 {
            cli()
                .arg("history")
                .arg("--data-dir")
                .arg(&reader_dir)
                .timeout(Duration::from_secs(10))
                .assert()
                .success();
        }
    });

    for _ in 0..3 {
        log_session(&data_dir);
    }

    reader.join().expect("Reader thread panicked");

    let wal_content = std::fs::read_to_string(wal_path(&data_dir)).expect("Failed to read WAL");
    assert_eq!(wal_content.lines().count(), 4);
}

#[test]
fn test_rollup_while_writing() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    for _ in 0..3 {
        log_session(&data_dir);
    }

    let data_dir_rollup = data_dir.clone();
    let rollup_handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(10));
        cli()
            .arg("rollup")
            .arg("--data-dir")
            .arg(&data_dir_rollup)
            .assert()
            .success();
    });

    for _ in 0..2 {
        log_session(&data_dir);
        thread::sleep(Duration::from_millis(5));
    }

    rollup_handle.join().expect("Rollup thread panicked");

    assert!(data_dir.join("sessions.csv").exists());

    // Sessions written after the rollup land in a fresh WAL
    let wal_path = wal_path(&data_dir);
    if wal_path.exists() {
        let wal_content = std::fs::read_to_string(&wal_path).expect("Failed to read WAL");
        assert!(wal_content.lines().count() <= 2);
    }
}

#[test]
fn test_no_wal_corruption_under_load() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let data_dir = data_dir.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(i * 5));
                log_session(&data_dir);
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let wal_content = std::fs::read_to_string(wal_path(&data_dir)).expect("Failed to read WAL");

    let mut valid_count = 0;
    for line in wal_content.lines() {
        if line.is_empty() {
            continue;
        }
        let parsed: Result<serde_json::Value, _> = serde_json::from_str(line);
        assert!(parsed.is_ok(), "WAL contains invalid JSON line: {}", line);
        valid_count += 1;
    }

    assert_eq!(valid_count, 10, "Expected 10 valid sessions in WAL");
}
