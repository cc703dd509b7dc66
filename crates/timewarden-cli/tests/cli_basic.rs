//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against a temporary store.

use std::path::Path;
use std::process::Command;

/// Run a CLI command against the given store and return output.
fn run_cli(db: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "timewarden-cli", "--quiet", "--"])
        .arg("--db")
        .arg(db)
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn assert_success(result: &(String, String, i32), context: &str) {
    let (_stdout, stderr, code) = result;
    if *code != 0 {
        panic!("{context} failed with code {code}: {stderr}");
    }
}

#[test]
fn sites_add_list_remove() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("cli.db");

    let output = run_cli(&db, &["sites", "add", "News.Site.test", "600"]);
    assert_success(&output, "sites add");

    let output = run_cli(&db, &["sites", "list"]);
    assert_success(&output, "sites list");
    assert!(output.0.contains("news.site.test"));
    assert!(output.0.contains("limit=600s"));

    let output = run_cli(&db, &["sites", "remove", "news.site.test"]);
    assert_success(&output, "sites remove");

    let output = run_cli(&db, &["sites", "list"]);
    assert_success(&output, "sites list after remove");
    assert!(!output.0.contains("news.site.test"));
}

#[test]
fn invalid_limit_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("cli.db");

    let output = run_cli(&db, &["sites", "add", "a.test", "100000"]);
    assert_ne!(output.2, 0);
    assert!(output.1.contains("dailyLimitSeconds"));
}

#[test]
fn settings_set_and_show() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("cli.db");

    let output = run_cli(
        &db,
        &["settings", "set", "--reset-time", "06:00", "--grace", "30"],
    );
    assert_success(&output, "settings set");

    let output = run_cli(&db, &["settings", "show"]);
    assert_success(&output, "settings show");
    assert!(output.0.contains("resetTime: 06:00"));
    assert!(output.0.contains("gracePeriodSeconds: 30"));
}

#[test]
fn usage_json_is_valid() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("cli.db");

    let output = run_cli(&db, &["usage", "--json"]);
    assert_success(&output, "usage --json");
    let parsed: Result<serde_json::Value, _> = serde_json::from_str(&output.0);
    assert!(parsed.is_ok(), "Failed to parse JSON: {}", output.0);
}
