//! CLI integration tests for mysql-table-mover.
//!
//! These tests cover argument parsing, help output and exit codes for
//! failures that happen before any database is contacted.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

const CONNECTION_VARS: [&str; 10] = [
    "SS_DATABASE_HOST_OLD_DB",
    "SS_DATABASE_PORT_OLD_DB",
    "SS_DATABASE_USERNAME_OLD_DB",
    "SS_DATABASE_PASSWORD_OLD_DB",
    "SS_DATABASE_NAME_OLD_DB",
    "SS_DATABASE_SERVER",
    "SS_DATABASE_PORT",
    "SS_DATABASE_USERNAME",
    "SS_DATABASE_PASSWORD",
    "SS_DATABASE_NAME",
];

/// Get a command for the binary with no connection variables inherited.
fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("mysql-table-mover").unwrap();
    for var in CONNECTION_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", contents).unwrap();
    file
}

const COMPLETE_CONFIG: &str = r#"
source:
  host: old-db
  database: legacy
  user: reader
  password: secret
target:
  host: new-db
  database: site
  user: writer
  password: secret
migration:
  tables: [SiteTree, File]
  tables_to_skip: [File]
  always_update: [SiteTree]
  fields_to_skip:
    SiteTree: [Legacy]
"#;

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("table"))
        .stdout(predicate::str::contains("entity"))
        .stdout(predicate::str::contains("verify"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("health-check"));
}

#[test]
fn test_run_subcommand_help() {
    cmd()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--continue-on-error"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mysql-table-mover"));
}

#[test]
fn test_global_flag_defaults() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("[default: config.yaml]"))
        .stdout(predicate::str::contains("[default: text]"))
        .stdout(predicate::str::contains("[default: info]"))
        .stdout(predicate::str::contains("--output-json"));
}

#[test]
fn test_table_requires_name() {
    cmd().arg("table").assert().failure();
}

#[test]
fn test_no_subcommand_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

// =============================================================================
// Exit Code Tests
// =============================================================================

#[test]
fn test_missing_config_file_exits_with_code_1() {
    cmd()
        .args(["--config", "nonexistent_config_file.yaml", "plan"])
        .assert()
        .code(1);
}

#[test]
fn test_invalid_yaml_exits_with_code_2() {
    let file = config_file("migration: [unclosed\n");

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "plan"])
        .assert()
        .code(2);
}

#[test]
fn test_missing_connection_params_exits_with_code_2() {
    let file = config_file("migration:\n  tables: [SiteTree]\n");

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "plan"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("SS_DATABASE_USERNAME_OLD_DB"));
}

#[test]
fn test_connection_params_from_environment() {
    let file = config_file("migration:\n  tables: [SiteTree]\n");

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "plan"])
        .env("SS_DATABASE_USERNAME_OLD_DB", "reader")
        .env("SS_DATABASE_PASSWORD_OLD_DB", "secret")
        .env("SS_DATABASE_NAME_OLD_DB", "legacy")
        .env("SS_DATABASE_USERNAME", "writer")
        .env("SS_DATABASE_PASSWORD", "secret")
        .env("SS_DATABASE_NAME", "site")
        .assert()
        .success()
        .stdout(predicate::str::contains("SiteTree\treplace"));
}

#[test]
fn test_unknown_log_format_is_config_error() {
    let file = config_file(COMPLETE_CONFIG);

    cmd()
        .args([
            "--config",
            file.path().to_str().unwrap(),
            "--log-format",
            "xml",
            "plan",
        ])
        .assert()
        .code(2);
}

// =============================================================================
// Plan / Dry Run Tests (no database needed)
// =============================================================================

#[test]
fn test_plan_lists_modes() {
    let file = config_file(COMPLETE_CONFIG);

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "plan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SiteTree\tupdate"))
        .stdout(predicate::str::contains("File\tskip"));
}

#[test]
fn test_dry_run_json() {
    let file = config_file(COMPLETE_CONFIG);

    cmd()
        .args([
            "--config",
            file.path().to_str().unwrap(),
            "--output-json",
            "run",
            "--dry-run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"skipped_fields\": [\n      \"Legacy\"\n    ]"));
}

#[test]
fn test_unknown_entity_exits_with_code_2() {
    let file = config_file(COMPLETE_CONFIG);

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "entity", "App\\Missing"])
        .assert()
        .code(2);
}
