use std::fs;

use assert_cmd::Command;
use predicates::str::contains;

fn tasknest(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tasknest").expect("binary");
    cmd.current_dir(dir.path()).env_remove("TASKNEST_CONFIG");
    cmd
}

#[test]
fn tasknest_help_works() {
    Command::cargo_bin("tasknest")
        .expect("binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("task planning"));
}

#[test]
fn subcommand_help_works() {
    for cmd in ["simulate", "settings"] {
        Command::cargo_bin("tasknest")
            .expect("binary")
            .arg(cmd)
            .arg("--help")
            .assert()
            .success();
    }
}

#[test]
fn simulate_reports_json_envelope() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = tasknest(&dir)
        .args(["simulate", "--days", "3", "--seed", "7", "--json"])
        .output()
        .expect("run simulate");
    assert!(output.status.success());

    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(payload["schema_version"], "tasknest.v1");
    assert_eq!(payload["command"], "simulate");
    assert_eq!(payload["status"], "success");
    assert_eq!(payload["data"]["days_simulated"], 3);
    assert_eq!(payload["data"]["history"].as_array().map(Vec::len), Some(3));
    assert_eq!(payload["data"]["trend"].as_array().map(Vec::len), Some(7));
    assert_eq!(payload["data"]["sample"]["tasks"], 9);
}

#[test]
fn simulate_rejects_bad_ratio() {
    let dir = tempfile::tempdir().expect("tempdir");
    tasknest(&dir)
        .args(["simulate", "--complete-ratio", "1.5"])
        .assert()
        .code(2)
        .stderr(contains("complete-ratio"));
}

#[test]
fn settings_show_uses_defaults_without_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    tasknest(&dir)
        .args(["settings", "show"])
        .assert()
        .success()
        .stdout(contains("tasknest settings: defaults"))
        .stdout(contains("daily task limit: 4"));
}

#[test]
fn settings_check_accepts_valid_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join(".tasknest.toml"),
        "[settings]\ndaily_task_limit = 3\n",
    )
    .expect("write config");

    tasknest(&dir)
        .args(["settings", "check"])
        .assert()
        .success()
        .stdout(contains("ok"));
}

#[test]
fn settings_check_rejects_out_of_range_limit() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join(".tasknest.toml"),
        "[settings]\ndaily_task_limit = 9\n",
    )
    .expect("write config");

    tasknest(&dir)
        .args(["settings", "check", "--json"])
        .assert()
        .code(2)
        .stdout(contains("invalid_config"))
        .stdout(contains("tasknest settings check"));
}
