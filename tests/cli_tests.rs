//! Integration tests for the workscan CLI.
//!
//! These tests run the actual binary. None of them reaches a backend: every command here
//! fails or finishes before the first request.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get the binary to test, pointed at an address nothing listens on.
fn workscan_cmd() -> Command {
    let mut cmd = Command::cargo_bin("workscan").unwrap();
    cmd.env("WORKSCAN_API_URL", "http://127.0.0.1:9")
        .env_remove("WORKSCAN_RECAPTCHA_SITE_KEY")
        .env_remove("WORKSCAN_RECAPTCHA_TOKEN")
        .env_remove("WORKSCAN_RECAPTCHA_TOKEN_CMD");
    cmd
}

#[test]
fn test_help_flag() {
    workscan_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("automation potential"))
        .stdout(predicate::str::contains("submit"))
        .stdout(predicate::str::contains("roadmap"));
}

#[test]
fn test_submit_help_lists_intake_sources() {
    workscan_cmd()
        .args(["submit", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--document"))
        .stdout(predicate::str::contains("--audio"))
        .stdout(predicate::str::contains("--from-text"))
        .stdout(predicate::str::contains("--settle-delay"));
}

#[test]
fn test_submit_without_name_is_rejected() {
    workscan_cmd()
        .args(["--text", "submit", "--task", "Write posts"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please provide a workflow name"));
}

#[test]
fn test_submit_without_tasks_is_rejected() {
    workscan_cmd()
        .args(["--text", "submit", "--name", "Marketing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please add at least one task"));
}

#[test]
fn test_submit_json_reports_validation_kind() {
    workscan_cmd()
        .args(["--json", "submit", "--name", "  "])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"kind\": \"validation\""));
}

#[test]
fn test_bad_task_spec_is_a_usage_error() {
    workscan_cmd()
        .args(["--text", "submit", "--name", "Ops", "--task", "Write posts:hourly"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown frequency"));
}

#[test]
fn test_draft_file_is_validated() {
    let temp_dir = TempDir::new().unwrap();
    let draft = temp_dir.path().join("draft.json");
    fs::write(
        &draft,
        r#"{ "name": "", "tasks": [ { "name": "Reconcile invoices" } ] }"#,
    )
    .unwrap();

    workscan_cmd()
        .args(["--text", "submit", "--draft"])
        .arg(&draft)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please provide a workflow name"));
}

#[test]
fn test_missing_draft_file() {
    workscan_cmd()
        .args(["--text", "submit", "--draft", "/nonexistent/draft.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("read draft"));
}

#[test]
fn test_export_requires_format() {
    workscan_cmd()
        .args(["export", "42"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--format"));
}
