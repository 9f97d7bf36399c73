//! Integration tests for the scrivener binary.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn scrivener(root: &Path, args: &[&str]) -> Output {
    let workspace = root.join("ws");
    let home = root.join("home");
    let config_home = root.join("config-home");
    let data_home = root.join("data");
    for dir in [&workspace, &home, &config_home, &data_home] {
        std::fs::create_dir_all(dir).unwrap();
    }

    Command::new(env!("CARGO_BIN_EXE_scrivener"))
        .env("HOME", &home)
        .env("XDG_CONFIG_HOME", &config_home)
        .env("XDG_DATA_HOME", &data_home)
        .env_remove("SCRIVENER_ENV")
        .env_remove("SCRIVENER_LOG")
        .env_remove("SCRIVENER__PROVIDER__API_KEY")
        .arg("--workspace")
        .arg(&workspace)
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn test_list_on_empty_store() {
    let temp_dir = TempDir::new().unwrap();
    let output = scrivener(temp_dir.path(), &["list"]);
    assert!(
        output.status.success(),
        "list should succeed: stderr={:?}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No projects found."));
    assert!(temp_dir.path().join("data").join("scrivener").join("store").exists());
}

#[test]
fn test_logs_go_to_stderr_and_quiet_silences_them() {
    let temp_dir = TempDir::new().unwrap();
    let output = scrivener(temp_dir.path(), &["list", "--format", "json"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let value: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(value["total"], 0);
    assert!(String::from_utf8_lossy(&output.stderr).contains("Scrivener CLI starting"));

    let quiet = scrivener(temp_dir.path(), &["--quiet", "list"]);
    assert!(quiet.status.success());
    assert!(quiet.stderr.is_empty());
}

#[test]
fn test_show_unknown_project_fails_with_hint() {
    let temp_dir = TempDir::new().unwrap();
    let output = scrivener(temp_dir.path(), &["--quiet", "show", "42"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Project not found: 42"));
    assert!(stderr.contains("scrivener list"));
}

#[test]
fn test_start_requires_an_api_key() {
    let temp_dir = TempDir::new().unwrap();
    let output = scrivener(
        temp_dir.path(),
        &["--quiet", "start", "--title", "Sea Glass", "--chapters", "2"],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no API key"));

    let listed = scrivener(temp_dir.path(), &["--quiet", "list"]);
    assert!(String::from_utf8_lossy(&listed.stdout).contains("No projects found."));
}

#[test]
fn test_start_rejects_out_of_range_chapter_count() {
    let temp_dir = TempDir::new().unwrap();
    let output = scrivener(
        temp_dir.path(),
        &[
            "--quiet",
            "start",
            "--title",
            "Too Long",
            "--chapters",
            "101",
            "--api-key",
            "sk-test",
        ],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("between 1 and 100"));
}
