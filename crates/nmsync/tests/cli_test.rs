//! Integration tests for the `nmsync` CLI binary.
//!
//! Every test replays a small capture written to a temp directory, so no
//! live bus and no user configuration are involved.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

// ── Helpers ─────────────────────────────────────────────────────────

const CAPTURE: &str = r#"# enumeration, then live updates
{"event":"object_added","path":"/mgr","kind":"Manager","properties":{"Version":"1.46.0","Devices":["/dev/1"]}}
{"event":"object_added","path":"/dev/1","kind":"Device","properties":{"Interface":"wlan0","DeviceType":2,"State":30,"AccessPoints":["/ap/1"]}}
{"event":"object_added","path":"/ap/1","kind":"AccessPoint","properties":{"Ssid":[104,111,109,101],"Strength":70,"Frequency":5180,"LastSeen":100}}
{"event":"properties_changed","path":"/dev/1","properties":{"State":100}}
{"event":"properties_changed","path":"/mystery","properties":{"Foo":1}}
"#;

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn with_capture(contents: &str) -> Self {
        let sandbox = Self::new();
        std::fs::write(sandbox.capture(), contents).unwrap();
        sandbox
    }

    fn capture(&self) -> PathBuf {
        self.dir.path().join("capture.jsonl")
    }

    fn config(&self) -> PathBuf {
        self.dir.path().join("config").join("config.toml")
    }

    /// `nmsync` with env isolation: no `NMSYNC_*` variables leak in and
    /// config directories point inside the sandbox.
    fn cmd(&self) -> assert_cmd::Command {
        let home = self.dir.path().join("home");
        let mut cmd = cargo_bin_cmd!("nmsync");
        cmd.env("HOME", &home)
            .env("XDG_CONFIG_HOME", &home)
            .env("NMSYNC_CONFIG", self.config())
            .env_remove("NMSYNC_CAPTURE")
            .env_remove("NMSYNC_OUTPUT")
            .env_remove("RUST_LOG");
        cmd
    }

    fn replay(&self) -> assert_cmd::Command {
        let mut cmd = self.cmd();
        cmd.arg("--capture").arg(self.capture());
        cmd
    }
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = Sandbox::new().cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = String::from_utf8_lossy(&output.stderr);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_lists_commands() {
    Sandbox::new().cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("snapshot")
            .and(predicate::str::contains("devices"))
            .and(predicate::str::contains("watch")),
    );
}

#[test]
fn test_version_flag() {
    Sandbox::new()
        .cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("nmsync"));
}

#[test]
fn test_completions_bash() {
    Sandbox::new()
        .cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Capture errors ──────────────────────────────────────────────────

#[test]
fn test_missing_capture_exits_7() {
    Sandbox::new()
        .cmd()
        .arg("snapshot")
        .assert()
        .code(7)
        .stderr(predicate::str::contains("No capture file"));
}

#[test]
fn test_malformed_capture_exits_7() {
    Sandbox::with_capture("{\"event\":\"nope\"}\n")
        .replay()
        .arg("snapshot")
        .assert()
        .code(7);
}

// ── Queries ─────────────────────────────────────────────────────────

#[test]
fn test_snapshot_json_lists_every_entity() {
    let sandbox = Sandbox::with_capture(CAPTURE);
    let output = sandbox
        .replay()
        .args(["snapshot", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let kinds: Vec<&str> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds.len(), 3);
    assert!(kinds.contains(&"Manager"));
    assert!(kinds.contains(&"Device"));
    assert!(kinds.contains(&"AccessPoint"));
}

#[test]
fn test_snapshot_filters_by_kind() {
    Sandbox::with_capture(CAPTURE)
        .replay()
        .args(["snapshot", "--kind", "device", "-o", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/dev/1").and(predicate::str::contains("/ap/1").not()));
}

#[test]
fn test_get_reports_latest_state() {
    Sandbox::with_capture(CAPTURE)
        .replay()
        .args(["get", "/dev/1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("wlan0").and(predicate::str::contains("Activated")));
}

#[test]
fn test_get_with_depth_follows_references() {
    Sandbox::with_capture(CAPTURE)
        .replay()
        .args(["get", "/dev/1", "--depth", "1", "-o", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/ap/1"));
}

#[test]
fn test_get_missing_path_exits_4() {
    Sandbox::with_capture(CAPTURE)
        .replay()
        .args(["get", "/dev/404"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_devices_plain() {
    Sandbox::with_capture(CAPTURE)
        .replay()
        .args(["devices", "-o", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::diff("/dev/1\n"));
}

#[test]
fn test_access_points_table_shows_ssid() {
    Sandbox::with_capture(CAPTURE)
        .replay()
        .args(["access-points"])
        .assert()
        .success()
        .stdout(predicate::str::contains("home").and(predicate::str::contains("70%")));
}

#[test]
fn test_diagnostics_lists_skipped_event() {
    Sandbox::with_capture(CAPTURE)
        .replay()
        .args(["diagnostics", "-o", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unknown_kind").and(predicate::str::contains("/mystery")));
}

#[test]
fn test_watch_streams_enumeration_and_transitions() {
    Sandbox::with_capture(CAPTURE)
        .replay()
        .args(["watch", "--path", "/dev/1", "-o", "plain"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("added /dev/1")
                .and(predicate::str::contains("device_state_changed /dev/1"))
                .and(predicate::str::contains("/mgr").not()),
        );
}

// ── Config commands ─────────────────────────────────────────────────

#[test]
fn test_config_path_honors_override() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(path_arg(&sandbox.config())));
}

#[test]
fn test_config_init_refuses_to_overwrite() {
    let sandbox = Sandbox::new();
    sandbox.cmd().args(["config", "init"]).assert().success();
    assert!(sandbox.config().exists());

    sandbox
        .cmd()
        .args(["config", "init"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--force"));

    sandbox
        .cmd()
        .args(["config", "init", "--force"])
        .assert()
        .success();
}

#[test]
fn test_config_file_supplies_capture() {
    let sandbox = Sandbox::with_capture(CAPTURE);
    std::fs::create_dir_all(sandbox.config().parent().unwrap()).unwrap();
    std::fs::write(
        sandbox.config(),
        format!("capture = {:?}\n", path_arg(&sandbox.capture())),
    )
    .unwrap();

    sandbox
        .cmd()
        .args(["devices", "-o", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/dev/1"));
}
