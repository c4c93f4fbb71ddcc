//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_habitquest"))
        .env("HABITQUEST_HOME", home)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(home: &Path, args: &[&str]) -> serde_json::Value {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

#[test]
fn test_player_status_defaults() {
    let home = tempfile::tempdir().unwrap();
    let status = run_json(home.path(), &["player", "status"]);
    assert_eq!(status["level"], 1);
    assert_eq!(status["hp"], 100);
    assert_eq!(status["xp_required"], 100);
}

#[test]
fn test_add_xp_levels_up_and_persists() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["player", "add-xp", "110"]);
    assert_eq!(code, 0);
    assert!(stderr.contains("Level up"));

    let status = run_json(home.path(), &["player", "status"]);
    assert_eq!(status["level"], 2);
    assert_eq!(status["xp"], 10);
    assert_eq!(status["max_hp"], 110);
}

#[test]
fn test_negative_amount_rejected() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["player", "damage", "-5"]);
    assert_eq!(code, 1);
    assert!(stderr.starts_with("error:"));
}

#[test]
fn test_task_complete_reports_xp() {
    let home = tempfile::tempdir().unwrap();
    let out = run_json(home.path(), &["task", "complete", "--priority", "high"]);
    assert_eq!(out["xp_earned"], 16);
    assert_eq!(out["player"]["streak"], 1);
}

#[test]
fn test_habit_negative_deals_damage() {
    let home = tempfile::tempdir().unwrap();
    let out = run_json(home.path(), &["habit", "track", "--negative"]);
    assert_eq!(out["hp"], 95);
}

#[test]
fn test_timer_start_pause_status() {
    let home = tempfile::tempdir().unwrap();
    let started = run_json(home.path(), &["timer", "start"]);
    assert_eq!(started["running"], true);
    assert_eq!(started["mode"], "work");

    let paused = run_json(home.path(), &["timer", "pause"]);
    assert_eq!(paused["running"], false);
    assert_eq!(paused["status"], "paused");
}

#[test]
fn test_timer_skip_awards_xp() {
    let home = tempfile::tempdir().unwrap();
    let done = run_json(home.path(), &["timer", "skip"]);
    assert_eq!(done["completed"], "work");
    assert_eq!(done["next"], "break");
    assert_eq!(done["xp_awarded"], 15);

    let stats = run_json(home.path(), &["stats", "today"]);
    assert_eq!(stats["pomodoros"], 1);

    let stats = run_json(home.path(), &["stats", "range", "2000-01-01", "2999-12-31"]);
    assert_eq!(stats["pomodoros"], 1);
    let stats = run_json(home.path(), &["stats", "range", "2000-01-01", "2000-01-02"]);
    assert_eq!(stats["pomodoros"], 0);
}

#[test]
fn test_quick_timer_rejects_negative_minutes() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["timer", "quick", "--", "-3"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Invalid duration"));
}

#[test]
fn test_timer_mode_and_task() {
    let home = tempfile::tempdir().unwrap();
    let state = run_json(home.path(), &["timer", "mode", "long-break"]);
    assert_eq!(state["mode"], "long-break");
    assert_eq!(state["total_secs"], 20 * 60);

    let state = run_json(home.path(), &["timer", "task", "read chapter 2"]);
    assert_eq!(state["current_task"], "read chapter 2");
    let state = run_json(home.path(), &["timer", "task", "--clear"]);
    assert!(state["current_task"].is_null());
}

#[test]
fn test_config_set_and_get() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "set", "timer.work_minutes", "25"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "ok");

    let (stdout, _, _) = run_cli(home.path(), &["config", "get", "timer.work_minutes"]);
    assert_eq!(stdout.trim(), "25");

    let (_, _, code) = run_cli(home.path(), &["config", "set", "timer.work_minutes", "0"]);
    assert_eq!(code, 1);
    let (_, _, code) = run_cli(home.path(), &["config", "get", "timer.nope"]);
    assert_eq!(code, 1);
}
