//! CLI tests for startup failures and `devcrew init`.
//!
//! Spawns the devcrew binary in a scratch directory and checks exit codes.

use std::fs;
use std::process::Command;

use devcrew::exit_codes;
use devcrew::io::config::{AppConfig, load_config};

#[test]
fn run_without_api_key_fails_at_startup() {
    let temp = tempfile::tempdir().expect("tempdir");

    let output = Command::new(env!("CARGO_BIN_EXE_devcrew"))
        .current_dir(temp.path())
        .env_remove("ANTHROPIC_API_KEY")
        .env_remove("RUST_LOG")
        .args(["run", "--prompt", "hello", "--yes"])
        .output()
        .expect("devcrew run");

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ANTHROPIC_API_KEY"), "stderr: {stderr}");

    let log = fs::read_to_string(temp.path().join("main.log")).expect("diagnostic log");
    assert!(log.contains("ERROR"));
    assert!(log.contains("Failed to initialize Anthropic client"));
    assert!(!temp.path().join("promptsanderrors.txt").exists());
}

#[test]
fn run_with_invalid_config_fails_at_startup() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("devcrew.toml"), "[sandbox]\ntimeout_secs = 0\n")
        .expect("write config");

    let status = Command::new(env!("CARGO_BIN_EXE_devcrew"))
        .current_dir(temp.path())
        .env("ANTHROPIC_API_KEY", "test-key")
        .args(["run", "--prompt", "hello"])
        .status()
        .expect("devcrew run");

    assert_eq!(status.code(), Some(exit_codes::INVALID));
}

#[test]
fn init_writes_default_config_once() {
    let temp = tempfile::tempdir().expect("tempdir");
    let run_init = |force: bool| {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_devcrew"));
        cmd.current_dir(temp.path()).arg("init");
        if force {
            cmd.arg("--force");
        }
        cmd.status().expect("devcrew init")
    };

    assert_eq!(run_init(false).code(), Some(exit_codes::OK));
    let cfg = load_config(&temp.path().join("devcrew.toml")).expect("load");
    assert_eq!(cfg, AppConfig::default());

    assert_eq!(run_init(false).code(), Some(exit_codes::INVALID));
    assert_eq!(run_init(true).code(), Some(exit_codes::OK));
}
