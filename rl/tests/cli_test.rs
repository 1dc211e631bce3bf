//! End-to-end tests for the `rl` binary

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn rl(temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("rl").expect("rl binary");
    cmd.current_dir(temp.path())
        .env_remove("RUNLOG_TASK_NAME")
        .env_remove("RUNLOG_FLOW_NAME")
        .env_remove("RUNLOG_DEPLOYMENT_NAME")
        .env("XDG_CONFIG_HOME", temp.path().join("xdg"));
    cmd
}

#[test]
fn test_path_default() {
    let temp = TempDir::new().unwrap();
    rl(&temp)
        .args(["path", "/app/jobs/sync.py"])
        .assert()
        .success()
        .stdout("/app/jobs/logs/sync\n");
}

#[test]
fn test_path_with_extension() {
    let temp = TempDir::new().unwrap();
    rl(&temp)
        .args(["path", "/app/jobs/sync.py", "--ext", "log"])
        .assert()
        .success()
        .stdout("/app/jobs/logs/sync.log\n");
}

#[test]
fn test_emit_writes_task_record() {
    let temp = TempDir::new().unwrap();
    let script = temp.path().join("etl.py");

    rl(&temp)
        .env("RUNLOG_TASK_NAME", "load-1")
        .args(["emit", script.to_str().unwrap(), "Loaded 42 rows", "--level", "warn"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote to"));

    let content = fs::read_to_string(temp.path().join("logs").join("etl")).unwrap();
    assert!(content.contains("WARN"));
    assert!(content.contains("Task 'load-1' - Loaded 42 rows"));
}

#[test]
fn test_emit_custom_log_path() {
    let temp = TempDir::new().unwrap();
    let script = temp.path().join("etl.py");
    let log_path = temp.path().join("custom.log");

    rl(&temp)
        .env("RUNLOG_FLOW_NAME", "nightly")
        .args(["emit", script.to_str().unwrap(), "started", "--log-path", log_path.to_str().unwrap()])
        .assert()
        .success();

    let content = fs::read_to_string(&log_path).unwrap();
    assert!(content.contains("Flow 'nightly' - started"));
    assert!(!temp.path().join("logs").exists());
}

#[test]
fn test_emit_without_run_fails() {
    let temp = TempDir::new().unwrap();
    rl(&temp)
        .args(["emit", "etl.py", "hello"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No current run"));
}

#[test]
fn test_emit_unknown_level_fails() {
    let temp = TempDir::new().unwrap();
    rl(&temp)
        .env("RUNLOG_TASK_NAME", "t")
        .args(["emit", "etl.py", "hello", "--level", "loud"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown level"));
}

#[test]
fn test_show_config_applies_file_overrides() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("runlog.yml");
    fs::write(&config, "logger:\n  rotation_unit: H\n  interval: 6\n  backup_count: 3\n").unwrap();

    rl(&temp)
        .args(["--config", config.to_str().unwrap(), "show-config", "/app/jobs/sync.py"])
        .assert()
        .success()
        .stdout(predicate::str::contains("log_path: /app/jobs/logs/sync"))
        .stdout(predicate::str::contains("rotation_unit: H"))
        .stdout(predicate::str::contains("interval: 6"))
        .stdout(predicate::str::contains("backup_count: 3"));
}

#[test]
fn test_show_config_defaults() {
    let temp = TempDir::new().unwrap();
    rl(&temp)
        .args(["show-config", "/app/jobs/sync.py"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rotation_unit: W0"))
        .stdout(predicate::str::contains("interval: 1"))
        .stdout(predicate::str::contains("backup_count: 12"));
}
