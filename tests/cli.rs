use std::fs;
use std::path::Path;

use airborne::Summary;
use assert_cmd::Command;
use tempfile::tempdir;

fn write_config(dir: &Path, contents: &str) -> std::path::PathBuf {
    let path = dir.join("parameters.json");
    fs::write(&path, contents).unwrap();
    path
}

const SMALL: &str = r#"{
    "env_dim": 12,
    "pop_size": 60,
    "initially_infected": 2,
    "infection_rate": 0.5,
    "seed": 9,
    "tick_limit": 12
}"#;

#[test]
fn prints_summary_to_stdout() {
    let temp_dir = tempdir().unwrap();
    let config = write_config(temp_dir.path(), SMALL);
    let output = Command::cargo_bin("airborne")
        .unwrap()
        .args(["--config", config.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let summary: Summary = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary.ticks, 12);
    assert_eq!(summary.seed, 9);
}

#[test]
fn writes_ledger_and_summary() {
    let temp_dir = tempdir().unwrap();
    let config = write_config(temp_dir.path(), SMALL);
    let output_dir = temp_dir.path().join("results");
    Command::cargo_bin("airborne")
        .unwrap()
        .args([
            "--config",
            config.to_str().unwrap(),
            "--output-dir",
            output_dir.to_str().unwrap(),
            "--tick-limit",
            "5",
            "--random-seed",
            "77",
        ])
        .assert()
        .success()
        .stdout("");

    let ledger = fs::read_to_string(output_dir.join("ledger.csv")).unwrap();
    let mut lines = ledger.lines();
    assert_eq!(
        lines.next(),
        Some("tick,infectious,recovered,dead,susceptible,r_effective,new_infections,contacts")
    );
    assert_eq!(lines.count(), 6);

    let summary: Summary =
        serde_json::from_str(&fs::read_to_string(output_dir.join("summary.json")).unwrap())
            .unwrap();
    assert_eq!(summary.ticks, 5);
    assert_eq!(summary.seed, 77);
}

#[test]
fn same_seed_same_output() {
    let temp_dir = tempdir().unwrap();
    let config = write_config(temp_dir.path(), SMALL);
    let run = || {
        Command::cargo_bin("airborne")
            .unwrap()
            .args(["--config", config.to_str().unwrap()])
            .output()
            .unwrap()
            .stdout
    };
    assert_eq!(run(), run());
}

#[test]
fn rejects_population_that_does_not_fit() {
    let temp_dir = tempdir().unwrap();
    let config = write_config(temp_dir.path(), r#"{ "env_dim": 3, "pop_size": 10 }"#);
    let output = Command::cargo_bin("airborne")
        .unwrap()
        .args(["--config", config.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("capacity error"), "{stderr}");
}

#[test]
fn rejects_unknown_log_level() {
    Command::cargo_bin("airborne")
        .unwrap()
        .args(["--log-level", "chatty", "--tick-limit", "1"])
        .assert()
        .failure();
}

#[test]
fn logs_progress_to_stderr() {
    let temp_dir = tempdir().unwrap();
    let config = write_config(temp_dir.path(), SMALL);
    let output = Command::cargo_bin("airborne")
        .unwrap()
        .args(["--config", config.to_str().unwrap(), "--log-level", "info"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("tick 10:"), "{stderr}");
    // stdout still holds nothing but the summary
    let _: Summary = serde_json::from_slice(&output.stdout).unwrap();
}
