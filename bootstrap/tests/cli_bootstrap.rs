//! CLI tests spawning the `bootstrap` binary.
//!
//! A POSIX shell script stands in for the interpreter. It answers
//! `--version`, creates a minimal environment for `-m venv`, accepts every
//! `-m pip` and `-m uvicorn` call, and appends each invocation to `$FAKE_LOG`.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::OnceLock;

use bootstrap::exit_codes;
use bootstrap::test_support::FixtureProject;
use tempfile::TempDir;

const FAKE_INTERPRETER: &str = r#"#!/bin/sh
echo "$*" >> "${FAKE_LOG:-/dev/null}"
case "$1" in
  --version)
    echo "Python 3.12.1"
    exit 0
    ;;
  -m)
    case "$2" in
      venv)
        mkdir -p "$3/bin" && cp "$0" "$3/bin/python" && chmod 755 "$3/bin/python"
        exit $?
        ;;
    esac
    exit 0
    ;;
  *.py)
    echo "CHECK: settings loaded"
    exit "${FAKE_HEALTH_EXIT:-0}"
    ;;
esac
exit 0
"#;

/// Written once per test binary, before any test spawns a child.
fn fake_interpreter() -> &'static Path {
    static DIR: OnceLock<(TempDir, PathBuf)> = OnceLock::new();
    let (_, path) = DIR.get_or_init(|| {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fake-python");
        fs::write(&path, FAKE_INTERPRETER).expect("write fake interpreter");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
        (dir, path)
    });
    path
}

fn project() -> FixtureProject {
    let project = FixtureProject::new().expect("project");
    project.write(
        "bootstrap.toml",
        &format!(
            "[runtime]\ncandidates = [\"{}\"]\n",
            fake_interpreter().display()
        ),
    );
    project
}

fn bootstrap(project: &FixtureProject, args: &[&str], health_exit: i32) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bootstrap"))
        .arg("--project-dir")
        .arg(project.root())
        .args(args)
        .env("FAKE_LOG", project.root().join("calls.log"))
        .env("FAKE_HEALTH_EXIT", health_exit.to_string())
        .env_remove("RUST_LOG")
        .output()
        .expect("run bootstrap")
}

fn calls(project: &FixtureProject) -> String {
    fs::read_to_string(project.root().join("calls.log")).unwrap_or_default()
}

#[test]
fn full_run_launches_server_with_development_flags() {
    let project = project();

    let output = bootstrap(&project, &["--port", "8123"], 0);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[1/7] Checking project prerequisites..."));
    assert!(stdout.contains("[7/7] Launching server..."));
    assert!(stdout.contains("http://localhost:8123"));
    assert!(!stdout.contains("CHECK: settings loaded"));

    let log = calls(&project);
    assert!(log.contains("-m pip install --upgrade pip"));
    assert!(log.contains(
        "-m uvicorn app.main:app --host 0.0.0.0 --port 8123 --log-level debug --reload"
    ));
    assert!(project.root().join(".venv/bin/python").is_file());
    assert!(project.read(".env").contains("APP_ENV=dev\n"));
}

#[test]
fn unhealthy_diagnostic_does_not_change_exit_code() {
    let project = project();

    let output = bootstrap(&project, &["--environment", "production"], 2);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("health check unhealthy"));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("| CHECK: settings loaded"));
    let log = calls(&project);
    assert!(log.contains("--log-level info"));
    assert!(!log.contains("--reload"));
}

#[test]
fn missing_manifest_exits_with_failure_and_never_launches() {
    let project = project();
    project.remove("requirements.txt");

    let output = bootstrap(&project, &[], 0);

    assert_eq!(output.status.code(), Some(exit_codes::FAILURE));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("validating failed"));
    assert!(stderr.contains("Run 'bootstrap --help' for usage."));
    assert!(!calls(&project).contains("uvicorn"));
    assert!(!project.root().join(".env").exists());
}

#[test]
fn invalid_settings_exit_with_failure() {
    let project = project();
    project.write("bootstrap.toml", "[paths]\nenvironment_dir = \"..\"\n");

    let output = bootstrap(&project, &[], 0);

    assert_eq!(output.status.code(), Some(exit_codes::FAILURE));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("paths.environment_dir"));
}

#[test]
fn help_exits_zero_without_running_anything() {
    let project = project();

    let output = bootstrap(&project, &["--help"], 0);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--skip-environment"));
    assert!(calls(&project).is_empty());
}

#[test]
fn unknown_flag_exits_with_failure() {
    let project = project();

    let output = bootstrap(&project, &["--frobnicate"], 0);

    assert_eq!(output.status.code(), Some(exit_codes::FAILURE));
    assert!(calls(&project).is_empty());
}
