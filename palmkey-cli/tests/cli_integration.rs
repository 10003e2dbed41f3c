//! CLI integration tests for palmkey-cli.
//!
//! These tests run the actual binary and check the JSON envelope on stdout,
//! exit codes, and store artifacts on disk.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Get a Command for the palmkey binary.
fn palmkey() -> Command {
    let mut cmd = Command::cargo_bin("palmkey").unwrap();
    cmd.env_remove("PALM_DETECTOR_URL");
    cmd
}

/// Write a placeholder image file the mock detector can be pointed at.
fn write_image(dir: &Path, name: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, b"fake image content").unwrap();
    path.to_str().unwrap().to_string()
}

fn parse_stdout(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).expect("stdout should be a single JSON document")
}

// ============================================================================
// Help and Usage Tests
// ============================================================================

#[test]
fn test_help_displays_subcommands() {
    palmkey()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("register"))
        .stdout(predicate::str::contains("recognize"))
        .stdout(predicate::str::contains("delete"))
        .stdout(predicate::str::contains("list"));
}

#[test]
fn test_version_displays_version() {
    palmkey()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("palmkey"));
}

#[test]
fn test_unknown_command_is_usage_error() {
    palmkey().arg("frobnicate").assert().code(1);
}

#[test]
fn test_missing_arguments_is_usage_error() {
    palmkey().arg("register").assert().code(1);
}

// ============================================================================
// Register Tests
// ============================================================================

#[test]
fn test_register_creates_record_and_reports_success() {
    let temp = TempDir::new().unwrap();
    let image = write_image(temp.path(), "palm.jpg");
    let data_dir = temp.path().join("palm_data");

    let output = palmkey()
        .args([
            "--data-dir",
            data_dir.to_str().unwrap(),
            "--mock",
            "register",
            &image,
            "555-1111",
        ])
        .assert()
        .success();

    let envelope = parse_stdout(&output.get_output().stdout);
    assert_eq!(envelope["success"], true);
    assert_eq!(envelope["data"]["identity"], "555-1111");
    assert_eq!(envelope["data"]["signature"].as_str().unwrap().len(), 16);

    let record_path = data_dir.join("555-1111.json");
    assert!(record_path.exists(), "registration record should be created");

    let record: serde_json::Value =
        serde_json::from_slice(&fs::read(&record_path).unwrap()).unwrap();
    assert_eq!(record["identity"], "555-1111");
    assert_eq!(record["normalizedDistances"].as_object().unwrap().len(), 10);
}

#[test]
fn test_register_duplicate_rejected_with_exit_zero() {
    let temp = TempDir::new().unwrap();
    let image = write_image(temp.path(), "palm.jpg");
    let data_dir = temp.path().join("palm_data");
    let data_dir_arg = data_dir.to_str().unwrap();

    palmkey()
        .args(["--data-dir", data_dir_arg, "--mock", "register", &image, "555-3333"])
        .assert()
        .success();

    let output = palmkey()
        .args(["--data-dir", data_dir_arg, "--mock", "register", &image, "555-3333"])
        .assert()
        .success();

    let envelope = parse_stdout(&output.get_output().stdout);
    assert_eq!(envelope["success"], false);
    assert!(envelope["message"]
        .as_str()
        .unwrap()
        .contains("already registered"));
}

#[test]
fn test_register_missing_image_reports_failure() {
    let temp = TempDir::new().unwrap();
    let data_dir = temp.path().join("palm_data");

    let output = palmkey()
        .args([
            "--data-dir",
            data_dir.to_str().unwrap(),
            "--mock",
            "register",
            "no_such_image.jpg",
            "555-1111",
        ])
        .assert()
        .success();

    let envelope = parse_stdout(&output.get_output().stdout);
    assert_eq!(envelope["success"], false);
    assert!(envelope["message"].as_str().unwrap().contains("Image not found"));
}

#[test]
fn test_register_without_detector_reports_unavailable() {
    let temp = TempDir::new().unwrap();
    let image = write_image(temp.path(), "palm.jpg");
    let data_dir = temp.path().join("palm_data");

    // No --mock, no --detector-url, no environment: the detector cannot be
    // selected, but the call is still structurally successful.
    let output = palmkey()
        .args([
            "--data-dir",
            data_dir.to_str().unwrap(),
            "register",
            &image,
            "555-1111",
        ])
        .assert()
        .success();

    let envelope = parse_stdout(&output.get_output().stdout);
    assert_eq!(envelope["success"], false);
    assert!(envelope["message"]
        .as_str()
        .unwrap()
        .contains("detector not available"));
}

// ============================================================================
// Recognize Tests
// ============================================================================

#[test]
fn test_register_then_recognize_open_set() {
    let temp = TempDir::new().unwrap();
    let image = write_image(temp.path(), "palm.jpg");
    let data_dir = temp.path().join("palm_data");
    let data_dir_arg = data_dir.to_str().unwrap();

    palmkey()
        .args(["--data-dir", data_dir_arg, "--mock", "register", &image, "555-1111"])
        .assert()
        .success();

    let output = palmkey()
        .args(["--data-dir", data_dir_arg, "--mock", "recognize", &image])
        .assert()
        .success();

    let envelope = parse_stdout(&output.get_output().stdout);
    assert_eq!(envelope["success"], true);
    assert_eq!(envelope["match"], true);
    assert_eq!(envelope["data"]["identity"], "555-1111");
    assert!(envelope["data"]["distance"].as_f64().unwrap() <= 0.13);
}

#[test]
fn test_register_then_recognize_targeted() {
    let temp = TempDir::new().unwrap();
    let image = write_image(temp.path(), "palm.jpg");
    let data_dir = temp.path().join("palm_data");
    let data_dir_arg = data_dir.to_str().unwrap();

    palmkey()
        .args(["--data-dir", data_dir_arg, "--mock", "register", &image, "555-1111"])
        .assert()
        .success();

    let output = palmkey()
        .args([
            "--data-dir",
            data_dir_arg,
            "--mock",
            "recognize",
            &image,
            "555-1111",
            "--threshold",
            "0.1",
        ])
        .assert()
        .success();

    let envelope = parse_stdout(&output.get_output().stdout);
    assert_eq!(envelope["match"], true);
    assert_eq!(envelope["data"]["threshold"], 0.1);
}

#[test]
fn test_recognize_empty_store_reports_no_registrations() {
    let temp = TempDir::new().unwrap();
    let image = write_image(temp.path(), "palm.jpg");
    let data_dir = temp.path().join("palm_data");

    let output = palmkey()
        .args([
            "--data-dir",
            data_dir.to_str().unwrap(),
            "--mock",
            "recognize",
            &image,
        ])
        .assert()
        .success();

    let envelope = parse_stdout(&output.get_output().stdout);
    assert_eq!(envelope["success"], false);
    assert_eq!(envelope["match"], false);
    assert!(envelope["message"]
        .as_str()
        .unwrap()
        .contains("No registered palms"));
}

#[test]
fn test_recognize_targeted_unregistered_identity() {
    let temp = TempDir::new().unwrap();
    let image = write_image(temp.path(), "palm.jpg");
    let data_dir = temp.path().join("palm_data");
    let data_dir_arg = data_dir.to_str().unwrap();

    // Store is non-empty so the targeted path is exercised.
    palmkey()
        .args(["--data-dir", data_dir_arg, "--mock", "register", &image, "555-1111"])
        .assert()
        .success();

    let output = palmkey()
        .args(["--data-dir", data_dir_arg, "--mock", "recognize", &image, "555-9999"])
        .assert()
        .success();

    let envelope = parse_stdout(&output.get_output().stdout);
    assert_eq!(envelope["success"], false);
    assert_eq!(envelope["match"], false);
    assert!(envelope["message"]
        .as_str()
        .unwrap()
        .contains("No palm registered for 555-9999"));
}

// ============================================================================
// Delete and List Tests
// ============================================================================

#[test]
fn test_delete_then_delete_again() {
    let temp = TempDir::new().unwrap();
    let image = write_image(temp.path(), "palm.jpg");
    let data_dir = temp.path().join("palm_data");
    let data_dir_arg = data_dir.to_str().unwrap();

    palmkey()
        .args(["--data-dir", data_dir_arg, "--mock", "register", &image, "555-1111"])
        .assert()
        .success();

    let output = palmkey()
        .args(["--data-dir", data_dir_arg, "delete", "555-1111"])
        .assert()
        .success();
    let envelope = parse_stdout(&output.get_output().stdout);
    assert_eq!(envelope["success"], true);

    let output = palmkey()
        .args(["--data-dir", data_dir_arg, "delete", "555-1111"])
        .assert()
        .success();
    let envelope = parse_stdout(&output.get_output().stdout);
    assert_eq!(envelope["success"], false);
    assert!(!data_dir.join("555-1111.json").exists());
}

#[test]
fn test_list_reports_registered_identities() {
    let temp = TempDir::new().unwrap();
    let image = write_image(temp.path(), "palm.jpg");
    let data_dir = temp.path().join("palm_data");
    let data_dir_arg = data_dir.to_str().unwrap();

    let output = palmkey()
        .args(["--data-dir", data_dir_arg, "list"])
        .assert()
        .success();
    let envelope = parse_stdout(&output.get_output().stdout);
    assert_eq!(envelope["count"], 0);

    palmkey()
        .args(["--data-dir", data_dir_arg, "--mock", "register", &image, "555-1111"])
        .assert()
        .success();

    let output = palmkey()
        .args(["--data-dir", data_dir_arg, "list"])
        .assert()
        .success();

    let envelope = parse_stdout(&output.get_output().stdout);
    assert_eq!(envelope["success"], true);
    assert_eq!(envelope["count"], 1);
    assert_eq!(envelope["records"][0]["identity"], "555-1111");
    assert!(envelope["records"][0]["registeredAt"].is_string());
    assert!(envelope["records"][0]["lastUsed"].is_string());
}

#[test]
fn test_list_skips_corrupt_records() {
    let temp = TempDir::new().unwrap();
    let image = write_image(temp.path(), "palm.jpg");
    let data_dir = temp.path().join("palm_data");
    let data_dir_arg = data_dir.to_str().unwrap();

    palmkey()
        .args(["--data-dir", data_dir_arg, "--mock", "register", &image, "555-1111"])
        .assert()
        .success();
    fs::write(data_dir.join("555-2222.json"), b"{corrupt").unwrap();

    let output = palmkey()
        .args(["--data-dir", data_dir_arg, "list"])
        .assert()
        .success();

    let envelope = parse_stdout(&output.get_output().stdout);
    assert_eq!(envelope["count"], 1);
    assert_eq!(envelope["records"][0]["identity"], "555-1111");
}

// ============================================================================
// Stdout Hygiene Tests
// ============================================================================

#[test]
fn test_stdout_carries_only_json() {
    let temp = TempDir::new().unwrap();
    let image = write_image(temp.path(), "palm.jpg");
    let data_dir = temp.path().join("palm_data");

    let output = palmkey()
        .args([
            "--data-dir",
            data_dir.to_str().unwrap(),
            "--mock",
            "register",
            &image,
            "555-1111",
        ])
        .assert()
        .success();

    // The whole of stdout must parse as one JSON document; diagnostics stay
    // on stderr.
    parse_stdout(&output.get_output().stdout);
}
