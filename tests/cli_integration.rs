//! Integration tests for the `pl` CLI.
//!
//! Each test copies fixtures into a temp directory, runs `pl` as a
//! subprocess, and verifies stdout and/or written files.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn pl_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_pl"))
}

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Temp dir holding copies of the given fixtures
fn workspace(fixtures: &[&str]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for name in fixtures {
        fs::copy(fixture_path(name), dir.path().join(name)).unwrap();
    }
    dir
}

/// Run `pl` with the given args in the given directory, returning (stdout, stderr, success).
fn run_pl(dir: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(pl_bin())
        .args(args)
        .current_dir(dir)
        .env_remove("PHASELINE_LOG")
        .output()
        .expect("failed to run pl");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// Run `pl` expecting success, return stdout.
fn run_pl_ok(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run_pl(dir, args);
    if !success {
        panic!("pl {:?} failed:\nstdout: {}\nstderr: {}", args, stdout, stderr);
    }
    stdout
}

fn run_pl_json(dir: &Path, args: &[&str]) -> serde_json::Value {
    let stdout = run_pl_ok(dir, args);
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("bad json ({}): {}", e, stdout))
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

// ---------------------------------------------------------------------------
// parse / budget
// ---------------------------------------------------------------------------

#[test]
fn test_parse_text() {
    let dir = workspace(&["full_analysis.md"]);
    let out = run_pl_ok(
        dir.path(),
        &["parse", "full_analysis.md", "--anchor", "2024-03-01", "--today", "2024-03-01"],
    );
    assert!(out.starts_with("dialect: full-analysis\n"));
    assert!(out.contains("#2 2. Foundation  2024-03-11..2024-03-17  0%  on-track  [critical]"));
    assert!(out.contains("3 phases, 7 tasks (0 completed, 0 deleted), 0% complete"));
}

#[test]
fn test_parse_rows_json() {
    let dir = workspace(&["renovation.md"]);
    let value = run_pl_json(dir.path(), &["--json", "parse", "renovation.md", "--rows"]);
    assert_eq!(value["dialect"], "renovation");
    assert_eq!(value["tasks"].as_array().unwrap().len(), 6);
    assert_eq!(value["tasks"][2]["phase"], "Rough-In");
    assert_eq!(value["tasks"][2]["start"], "2024-04-05");
}

#[test]
fn test_parse_writes_records() {
    let dir = workspace(&["selected_tasks.md"]);
    run_pl_ok(
        dir.path(),
        &["parse", "selected_tasks.md", "--anchor", "2024-05-06", "--out", "out.json"],
    );
    let records = read_json(&dir.path().join("out.json"));
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 5);
    assert_eq!(records[0]["groupTitle"], "Site Work");
    assert_eq!(records[0]["startDate"], "2024-05-06");
    assert_eq!(records[4]["endDate"], "2024-05-22");
    assert_eq!(records[4]["status"], "pending");
}

#[test]
fn test_budget_json() {
    let dir = workspace(&["full_analysis.md"]);
    let value = run_pl_json(dir.path(), &["--json", "budget", "full_analysis.md"]);
    assert_eq!(value["lines"].as_array().unwrap().len(), 10);
    assert_eq!(value["total"].as_f64(), Some(110600.0));
}

// ---------------------------------------------------------------------------
// status / chain
// ---------------------------------------------------------------------------

#[test]
fn test_status_text() {
    let dir = workspace(&["records.json"]);
    let out = run_pl_ok(dir.path(), &["--today", "2024-03-10", "status", "records.json"]);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines[..3],
        [
            "#1 Site Preparation  2024-03-04..2024-03-08  50%  behind",
            "#2 Foundation  2024-03-11..2024-03-15  0%  on-track  [critical]",
            "#3 Finishes  (undated)  0%  on-track",
        ]
    );
    assert!(out.contains("3 phases, 5 tasks (1 completed, 1 deleted), 20% complete"));
    assert!(out.contains("behind: 1 phase(s)"));
}

#[test]
fn test_status_json_with_tasks() {
    let dir = workspace(&["records.json"]);
    let value = run_pl_json(dir.path(), &["--json", "--today", "2024-03-10", "status", "records.json"]);
    assert_eq!(value["summary"]["behindGroups"], 1);
    assert_eq!(value["summary"]["deletedTasks"], 1);
    assert_eq!(value["groups"][0]["scheduleStatus"], "behind");
    assert_eq!(value["groups"][1]["tasks"][2]["deleted"], true);
}

#[test]
fn test_chain_rewrites_dates() {
    let dir = workspace(&["records.json"]);
    run_pl_ok(
        dir.path(),
        &["chain", "records.json", "--anchor", "2024-04-01", "--out", "chained.json"],
    );
    let records = read_json(&dir.path().join("chained.json"));
    let dates: Vec<(String, String)> = records
        .as_array()
        .unwrap()
        .iter()
        .map(|r| {
            (
                r["startDate"].as_str().unwrap().to_string(),
                r["endDate"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    let expected: Vec<(String, String)> = [
        ("2024-04-01", "2024-04-03"),
        ("2024-04-04", "2024-04-05"),
        ("2024-04-06", "2024-04-06"),
        ("2024-04-07", "2024-04-10"),
        // deleted task keeps its dates
        ("2024-03-01", "2024-03-02"),
        ("2024-04-11", "2024-04-15"),
    ]
    .iter()
    .map(|(s, e)| (s.to_string(), e.to_string()))
    .collect();
    assert_eq!(dates, expected);
}

// ---------------------------------------------------------------------------
// shift
// ---------------------------------------------------------------------------

#[test]
fn test_shift_dry_run_leaves_file() {
    let dir = workspace(&["records.json"]);
    let before = fs::read_to_string(dir.path().join("records.json")).unwrap();
    let out = run_pl_ok(dir.path(), &["shift", "records.json", "--group", "2", "--days", "3"]);
    assert!(out.contains("shift #2 Foundation by +3 day(s): 2024-03-14..2024-03-18"));
    assert!(out.contains("dry run"));
    let after = fs::read_to_string(dir.path().join("records.json")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_shift_apply_from_pixels() {
    let dir = workspace(&["records.json"]);
    let value = run_pl_json(
        dir.path(),
        &[
            "--json", "shift", "records.json", "--group", "2", "--pixels", "-40", "--width", "300",
            "--visible-days", "30", "--yes",
        ],
    );
    assert_eq!(value["applied"], true);
    assert_eq!(value["proposal"]["dayDelta"], -4);
    assert_eq!(value["report"]["shifted"].as_array().unwrap().len(), 2);

    let records = read_json(&dir.path().join("records.json"));
    assert_eq!(records[2]["startDate"], "2024-03-07");
    assert_eq!(records[3]["endDate"], "2024-03-11");
    assert_eq!(records[4]["startDate"], "2024-03-01");
}

#[test]
fn test_shift_zero_is_noop() {
    let dir = workspace(&["records.json"]);
    let out = run_pl_ok(
        dir.path(),
        &["shift", "records.json", "--group", "1", "--pixels", "4", "--width", "300", "--visible-days", "30"],
    );
    assert_eq!(out.trim(), "nothing to shift");
}

#[test]
fn test_shift_requires_amount() {
    let dir = workspace(&["records.json"]);
    let (_, stderr, success) = run_pl(dir.path(), &["shift", "records.json", "--group", "1"]);
    assert!(!success);
    assert!(stderr.contains("error: either --days or --pixels is required"));
}

// ---------------------------------------------------------------------------
// weather / config / errors
// ---------------------------------------------------------------------------

#[test]
fn test_weather_overlay() {
    let dir = workspace(&["records.json", "forecast.json"]);
    let out = run_pl_ok(dir.path(), &["weather", "records.json", "--forecast", "forecast.json"]);
    assert!(out.contains("Rain risk on 2 day(s) during Site prep grading"));
    assert!(out.contains("Rain risk on 1 day(s) during Pour foundation walls"));
    assert!(out.contains("2 task(s) in 2 phase(s) at risk of rain"));
    assert!(!out.contains("Interior paint"));
}

#[test]
fn test_config_file_in_working_dir() {
    let dir = workspace(&["records.json", "forecast.json"]);
    fs::write(
        dir.path().join("phaseline.toml"),
        "[weather]\nrain_probability_threshold = 60\nsensitive_categories = [\"grading\"]\n",
    )
    .unwrap();
    let value = run_pl_json(
        dir.path(),
        &["--json", "weather", "records.json", "--forecast", "forecast.json"],
    );
    assert_eq!(value["flaggedTasks"], 1);
    assert_eq!(
        value["groups"][0]["tasks"][1]["weatherWarningMessage"],
        "Rain risk on 1 day(s) during Site prep grading"
    );
}

#[test]
fn test_missing_file_reports_error() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, success) = run_pl(dir.path(), &["status", "nope.json"]);
    assert!(!success);
    assert!(stderr.starts_with("error: could not read nope.json"));
}

#[test]
fn test_bad_today_reports_error() {
    let dir = workspace(&["records.json"]);
    let (_, stderr, success) = run_pl(dir.path(), &["--today", "someday", "status", "records.json"]);
    assert!(!success);
    assert!(stderr.contains("invalid date: someday"));
}
