//! Tests for the serve CLI command

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_lists_serve_command() {
    let mut cmd = Command::cargo_bin("revbot").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("AI code review relay"))
        .stdout(predicate::str::contains("serve"));
}

#[test]
fn test_serve_help_lists_configuration() {
    let mut cmd = Command::cargo_bin("revbot").unwrap();
    cmd.arg("serve").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("--github-token"))
        .stdout(predicate::str::contains("--openai-api-key"))
        .stdout(predicate::str::contains("--webhook-secret"))
        .stdout(predicate::str::contains("GITHUB_TOKEN"))
        .stdout(predicate::str::contains("OPENAI_API_KEY"))
        .stdout(predicate::str::contains("3000"));
}

#[test]
fn test_serve_requires_credentials() {
    let mut cmd = Command::cargo_bin("revbot").unwrap();
    cmd.arg("serve")
        .env_remove("PORT")
        .env_remove("GITHUB_TOKEN")
        .env_remove("OPENAI_API_KEY");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--github-token"))
        .stderr(predicate::str::contains("--openai-api-key"));
}

#[test]
fn test_unknown_command_is_rejected() {
    let mut cmd = Command::cargo_bin("revbot").unwrap();
    cmd.arg("review-everything");

    cmd.assert().failure();
}

#[test]
fn test_version_flag() {
    let mut cmd = Command::cargo_bin("revbot").unwrap();
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("revbot"));
}
