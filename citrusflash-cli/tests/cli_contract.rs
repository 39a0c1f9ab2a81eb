//! Integration tests for core CLI contract behavior.

use {predicates::prelude::*, std::fs, tempfile::tempdir};

fn cli_cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("citrusflash");
    cmd.env_remove("CITRUSFLASH_PORT")
        .env_remove("CITRUSFLASH_TARGET")
        .env_remove("CITRUSFLASH_BAUD")
        .env_remove("RUST_LOG");
    cmd
}

/// A port name no host has.
const MISSING_PORT: &str = "/nonexistent/citrusflash-tty";

#[test]
fn help_exits_zero_and_writes_stdout_only() {
    let mut cmd = cli_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("citrusflash"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn subcommand_help_exits_zero() {
    let mut cmd = cli_cmd();
    cmd.args(["kernel", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Kernel binary"));
}

#[test]
fn version_exits_zero_and_writes_stdout_only() {
    let mut cmd = cli_cmd();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("citrusflash"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn completions_exit_zero() {
    let mut cmd = cli_cmd();
    cmd.args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("citrusflash"));
}

#[test]
fn list_ports_json_returns_valid_json() {
    let dir = tempdir().expect("tempdir should be created");
    let mut cmd = cli_cmd();
    let output = cmd
        .current_dir(dir.path())
        .args(["list-ports", "--json"])
        .output()
        .expect("command should execute");

    assert!(
        output
            .status
            .success()
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value =
        serde_json::from_str(&stdout).expect("stdout should be valid JSON");
    assert!(parsed.is_array(), "should be a JSON array");
}

#[test]
fn invalid_config_file_is_a_warning() {
    let dir = tempdir().expect("tempdir should be created");
    fs::write(dir.path().join("citrusflash.toml"), "invalid toml [[[").expect("write config");

    let mut cmd = cli_cmd();
    cmd.current_dir(dir.path())
        .args(["list-ports", "--json"])
        .assert()
        .success()
        .stderr(predicate::str::contains("citrusflash.toml"));
}

// ============================================================================
// Exit Code Tests
// ============================================================================

/// Exit code 1: usage error (unknown command, invalid arguments)
#[test]
fn exit_code_one_for_unknown_command() {
    let mut cmd = cli_cmd();
    cmd.arg("unknown-command-xyz")
        .assert()
        .failure()
        .code(1);
}

#[test]
fn exit_code_one_for_invalid_flag() {
    let mut cmd = cli_cmd();
    cmd.arg("--invalid-flag-xyz")
        .assert()
        .failure()
        .code(1);
}

#[test]
fn exit_code_one_for_missing_argument() {
    let mut cmd = cli_cmd();
    cmd.arg("kill")
        .assert()
        .failure()
        .code(1);
}

#[test]
fn exit_code_one_for_unknown_target() {
    let mut cmd = cli_cmd();
    cmd.args(["-t", "ws63", "kill", "1"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn exit_code_one_for_unreadable_source() {
    let dir = tempdir().expect("tempdir should be created");
    let missing = dir
        .path()
        .join("missing.bin");

    let mut cmd = cli_cmd();
    cmd.current_dir(dir.path())
        .args(["-p", MISSING_PORT, "app"])
        .arg(&missing)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error"))
        .stderr(predicate::str::contains("missing.bin"));
}

/// Unsupported operations fail before the port is touched.
#[test]
fn exit_code_one_for_unsupported_operation() {
    let dir = tempdir().expect("tempdir should be created");
    let image = dir
        .path()
        .join("app.bin");
    fs::write(&image, [0u8; 16]).expect("write image");

    let mut cmd = cli_cmd();
    cmd.current_dir(dir.path())
        .args(["-p", MISSING_PORT, "-t", "cboot", "app"])
        .arg(&image)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Unsupported"));

    let mut cmd = cli_cmd();
    cmd.current_dir(dir.path())
        .env("CITRUSFLASH_TARGET", "cinnamon")
        .args(["-p", MISSING_PORT, "kill", "1234"])
        .assert()
        .failure()
        .code(1);
}

/// Exit code 2: the serial port cannot be opened
#[test]
fn exit_code_two_for_port_open_failure() {
    let dir = tempdir().expect("tempdir should be created");
    let image = dir
        .path()
        .join("kernel.bin");
    fs::write(&image, vec![0xA5u8; 1024]).expect("write image");

    let mut cmd = cli_cmd();
    cmd.current_dir(dir.path())
        .args(["-p", MISSING_PORT, "kernel"])
        .arg(&image)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains(MISSING_PORT));

    let mut cmd = cli_cmd();
    cmd.current_dir(dir.path())
        .env("CITRUSFLASH_PORT", MISSING_PORT)
        .args(["kill", "1234"])
        .assert()
        .failure()
        .code(2);
}
