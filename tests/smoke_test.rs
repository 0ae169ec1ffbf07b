//! Smoke tests for the gprops CLI.
//!
//! These tests verify basic CLI functionality:
//! - `gprops --version` outputs version info
//! - `gprops --help` outputs help text
//! - errors are reported as JSON on stderr

mod common;

use assert_cmd::Command;
use common::TestEnv;
use predicates::prelude::*;

/// Get a Command for the gprops binary.
fn gprops() -> Command {
    Command::new(env!("CARGO_BIN_EXE_gprops"))
}

#[test]
fn test_version_flag() {
    gprops()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("gprops"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_flag() {
    gprops()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("properties"));
}

#[test]
fn test_missing_subcommand_fails() {
    gprops().assert().failure();
}

#[test]
fn test_profiles_in_empty_project() {
    let env = TestEnv::new();
    env.gprops()
        .arg("profiles")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""key":"<default>""#));
}

#[test]
fn test_error_is_json_on_stderr() {
    let env = TestEnv::new();
    env.gprops()
        .args(["get", "colour"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(r#""error""#))
        .stderr(predicate::str::contains("Unknown property: colour"));
}

#[test]
fn test_error_is_plain_with_human_flag() {
    let env = TestEnv::new();
    env.gprops()
        .args(["-H", "get", "colour"])
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("Error: Unknown property"));
}

#[test]
fn test_missing_project_dir_fails() {
    let env = TestEnv::new();
    env.gprops()
        .args(["-C", "/definitely/not/a/project", "profiles"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}
