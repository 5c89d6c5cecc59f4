//! Smoke tests for the chatprobe CLI

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command for the chatprobe binary with a clean environment
fn chatprobe() -> Command {
    let mut cmd = Command::cargo_bin("chatprobe").expect("chatprobe binary should exist");
    for var in [
        "CHATPROBE_REALM_URL",
        "CHATPROBE_PASSWORD",
        "CHROMIUM_PATH",
        "CHATPROBE_ARTIFACTS_DIR",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_help_flag() {
    chatprobe()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_no_args_fails() {
    chatprobe().assert().failure();
}

#[test]
fn test_run_subcommand_help() {
    chatprobe()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--fake"))
        .stdout(predicate::str::contains("--realm-url"));
}

// ============================================================================
// list / config
// ============================================================================

#[test]
fn test_list_prints_scenarios_in_order() {
    chatprobe()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::is_match(
            "edit_tests\n  test_stream_message_edit\n  test_edit_message_with_slash_me\n  test_edit_private_message\n",
        )
        .unwrap());
}

#[test]
fn test_config_prints_defaults() {
    chatprobe()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("http://zulip.zulipdev.com:9981/"))
        .stdout(predicate::str::contains("desdemona@zulip.com"))
        .stdout(predicate::str::contains("zhome"));
}

#[test]
fn test_config_reads_file_and_env() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("suite.yaml");
    fs::write(&path, "fixtures:\n  stream: Denmark\n").unwrap();

    chatprobe()
        .args(["config", "--config"])
        .arg(&path)
        .env("CHATPROBE_REALM_URL", "http://localhost:9991/")
        .assert()
        .success()
        .stdout(predicate::str::contains("stream: Denmark"))
        .stdout(predicate::str::contains("http://localhost:9991/"));
}

#[test]
fn test_config_rejects_bad_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("suite.yaml");
    fs::write(&path, "realm_url: not-a-url\n").unwrap();

    chatprobe()
        .args(["config", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

// ============================================================================
// run --fake
// ============================================================================

#[test]
fn test_fake_run_passes() {
    let dir = TempDir::new().unwrap();
    chatprobe()
        .args(["-q", "run", "--fake", "--artifacts-dir"])
        .arg(dir.path())
        .assert()
        .success();
}

#[test]
fn test_fake_run_json_report() {
    let dir = TempDir::new().unwrap();
    let output = chatprobe()
        .args(["run", "--fake", "--format", "json", "--artifacts-dir"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["results"][0]["name"], "edit_tests");
    assert_eq!(report["results"][0]["passed"], true);
    assert!(report["run_id"].is_string());
}

#[test]
fn test_fake_fault_fails_with_screenshot() {
    let dir = TempDir::new().unwrap();
    chatprobe()
        .args([
            "run",
            "--fake",
            "--fake-fault",
            "no-edit-popover",
            "--timeout-ms",
            "200",
            "--color",
            "never",
            "--artifacts-dir",
        ])
        .arg(dir.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("FAIL edit_tests"))
        .stdout(predicate::str::contains(".popover_edit_message"));

    assert!(dir.path().join("failure-1.png").exists());
}
