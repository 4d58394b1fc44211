//! Integration tests for creditgate-cli
//!
//! These tests verify the CLI commands work end-to-end against a throwaway
//! database. Tests run serially to avoid database lock conflicts.

use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;
use tempfile::TempDir;

/// Get a Command for the creditgate binary pointed at a temp database
fn creditgate(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("creditgate").unwrap();
    cmd.env("CREDITGATE_DB_PATH", dir.path().join("cli.db"));
    cmd.env_remove("CREDITGATE_ADMISSION");
    cmd
}

fn record(dir: &TempDir, user: &str, feature: &str) {
    creditgate(dir)
        .args(["usage", "record", "--user", user, "--feature", feature, "--quiet"])
        .assert()
        .success();
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
#[serial]
fn test_cli_help() {
    let dir = TempDir::new().unwrap();
    creditgate(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("creditgate"))
        .stdout(predicate::str::contains("usage"))
        .stdout(predicate::str::contains("ledger"));
}

#[test]
#[serial]
fn test_cli_version() {
    let dir = TempDir::new().unwrap();
    creditgate(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("creditgate"));
}

// =============================================================================
// Plan Command Tests
// =============================================================================

#[test]
#[serial]
fn test_plan_list() {
    let dir = TempDir::new().unwrap();
    creditgate(&dir)
        .args(["plan", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("FREE"))
        .stdout(predicate::str::contains("CREATOR_PRO"))
        .stdout(predicate::str::contains("unlimited"));
}

#[test]
#[serial]
fn test_plan_show_defaults_to_free() {
    let dir = TempDir::new().unwrap();
    creditgate(&dir)
        .args(["plan", "show", "--user", "nobody", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"id\": \"FREE\""));
}

#[test]
#[serial]
fn test_subscription_set_changes_plan() {
    let dir = TempDir::new().unwrap();
    creditgate(&dir)
        .args(["subscription", "set", "--user", "u1", "--plan", "pro"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PRO"));

    creditgate(&dir)
        .args(["plan", "show", "--user", "u1", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"id\": \"PRO\""));
}

#[test]
#[serial]
fn test_subscription_set_rejects_unknown_plan() {
    let dir = TempDir::new().unwrap();
    creditgate(&dir)
        .args(["subscription", "set", "--user", "u1", "--plan", "enterprise"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown plan"));
}

// =============================================================================
// Usage Command Tests
// =============================================================================

#[test]
#[serial]
fn test_usage_show_new_user() {
    let dir = TempDir::new().unwrap();
    creditgate(&dir)
        .args(["usage", "show", "--user", "fresh", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"HOOK_GENERATION\": 0"))
        .stdout(predicate::str::contains("\"HOOK_GENERATION\": 5"));
}

#[test]
#[serial]
fn test_usage_check_denied_after_limit() {
    let dir = TempDir::new().unwrap();
    for _ in 0..5 {
        record(&dir, "u1", "hooks");
    }

    creditgate(&dir)
        .args(["usage", "check", "--user", "u1", "--feature", "HOOK_GENERATION"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Quota exceeded for HOOK_GENERATION: 5 of 5"));
}

#[test]
#[serial]
fn test_usage_check_allowed_under_limit() {
    let dir = TempDir::new().unwrap();
    record(&dir, "u1", "assets");

    creditgate(&dir)
        .args(["usage", "check", "--user", "u1", "--feature", "assets", "--cost", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Allowed"));
}

#[test]
#[serial]
fn test_usage_check_video_disabled_on_free() {
    let dir = TempDir::new().unwrap();
    creditgate(&dir)
        .args(["usage", "check", "--user", "u1", "--feature", "video"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("0 of 0"));
}

#[test]
#[serial]
fn test_usage_check_zero_cost_invalid() {
    let dir = TempDir::new().unwrap();
    creditgate(&dir)
        .args(["usage", "check", "--user", "u1", "--feature", "hooks", "--cost", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid argument"));
}

#[test]
#[serial]
fn test_usage_record_unknown_feature() {
    let dir = TempDir::new().unwrap();
    creditgate(&dir)
        .args(["usage", "record", "--user", "u1", "--feature", "podcast"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown feature"));
}

// =============================================================================
// Ledger Command Tests
// =============================================================================

#[test]
#[serial]
fn test_ledger_list_empty() {
    let dir = TempDir::new().unwrap();
    creditgate(&dir)
        .args(["ledger", "list", "--user", "u1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No usage records found."));
}

#[test]
#[serial]
fn test_ledger_list_shows_records() {
    let dir = TempDir::new().unwrap();
    record(&dir, "u1", "hooks");
    record(&dir, "u1", "assets");

    creditgate(&dir)
        .args(["ledger", "list", "--user", "u1", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("HOOK_GENERATION"))
        .stdout(predicate::str::contains("ASSET_GENERATION"));
}
