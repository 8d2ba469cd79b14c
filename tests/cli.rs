//! End-to-end tests for the browserd binary.
//!
//! A shell script stands in for Chromium: it publishes `DevToolsActivePort`
//! in the profile directory it is handed and then idles.

#![cfg(unix)]

use std::io::{BufRead, BufReader};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use serde_json::Value;
use tempfile::TempDir;

const FAKE_BROWSER: &str = r#"#!/bin/sh
for arg in "$@"; do
  case "$arg" in
    --user-data-dir=*) profile="${arg#--user-data-dir=}" ;;
  esac
done
echo "$$ $profile" > "$FAKE_BROWSER_INFO"
printf '%s\n%s\n' "1" "/devtools/browser/e2e" > "$profile/DevToolsActivePort"
exec sleep 30
"#;

/// Takes its time to exit on SIGTERM, like a browser flushing its profile.
const SLOW_EXIT_BROWSER: &str = r#"#!/bin/sh
for arg in "$@"; do
  case "$arg" in
    --user-data-dir=*) profile="${arg#--user-data-dir=}" ;;
  esac
done
echo "$$ $profile" > "$FAKE_BROWSER_INFO"
trap 'sleep 3; exit 0' TERM
printf '%s\n%s\n' "1" "/devtools/browser/e2e" > "$profile/DevToolsActivePort"
while :; do sleep 1; done
"#;

/// Never exits on SIGTERM.
const DEAF_BROWSER: &str = r#"#!/bin/sh
for arg in "$@"; do
  case "$arg" in
    --user-data-dir=*) profile="${arg#--user-data-dir=}" ;;
  esac
done
echo "$$ $profile" > "$FAKE_BROWSER_INFO"
trap '' TERM
printf '%s\n%s\n' "1" "/devtools/browser/e2e" > "$profile/DevToolsActivePort"
while :; do sleep 1; done
"#;

// ============================================================================
// Test Helpers
// ============================================================================

struct TestEnv {
    dir: TempDir,
    config: PathBuf,
}

/// A `start` or `restart` running in the background.
struct Owner {
    pid: u32,
    report: Value,
    exit: JoinHandle<ExitStatus>,
}

impl TestEnv {
    fn new() -> Self {
        Self::with_script(FAKE_BROWSER)
    }

    fn with_script(body: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fake-chrome");
        std::fs::write(&path, body).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        Self::build(dir, &path)
    }

    fn with_executable(executable: &Path) -> Self {
        Self::build(TempDir::new().unwrap(), executable)
    }

    /// Config with default grace and close timings.
    fn build(dir: TempDir, browser: &Path) -> Self {
        let config = dir.path().join("config.toml");
        std::fs::write(
            &config,
            format!(
                r#"
[daemon]
state_dir = "{}"
restart_delay_ms = 50

[browser]
executable = "{}"

[logging]
file = false
"#,
                dir.path().join("run").display(),
                browser.display()
            ),
        )
        .unwrap();

        Self { dir, config }
    }

    /// PID and profile directory reported by the last fake browser.
    fn browser_info(&self) -> (u32, PathBuf) {
        let info = std::fs::read_to_string(self.dir.path().join("browser-info")).unwrap();
        let (pid, profile) = info.trim().split_once(' ').unwrap();
        (pid.parse().unwrap(), PathBuf::from(profile))
    }

    fn state_dir(&self) -> PathBuf {
        self.dir.path().join("run")
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_browserd"));
        cmd.args(args)
            .env("BROWSERD_CONFIG", &self.config)
            .env_remove("BROWSERD_STATE_DIR")
            .env_remove("BROWSERD_BROWSER")
            .env("FAKE_BROWSER_INFO", self.dir.path().join("browser-info"))
            .env("RUST_LOG", "info")
            .stdin(Stdio::null());
        cmd
    }

    /// Run a verb to completion; returns the exit code and the JSON report.
    fn run(&self, verb: &str) -> (i32, Value) {
        let output = self.command(&[verb]).output().unwrap();
        let stdout = String::from_utf8_lossy(&output.stdout);
        let report = stdout
            .lines()
            .next()
            .map(|line| serde_json::from_str(line).unwrap())
            .unwrap_or(Value::Null);
        (output.status.code().unwrap_or(-1), report)
    }

    /// Spawn a parking verb and wait for its first report.
    fn spawn(&self, verb: &str) -> Owner {
        let mut child = self
            .command(&[verb])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .unwrap();
        let pid = child.id();

        let mut line = String::new();
        let stdout = child.stdout.take().unwrap();
        BufReader::new(stdout).read_line(&mut line).unwrap();
        let report: Value = serde_json::from_str(&line).unwrap();

        let exit = std::thread::spawn(move || child.wait().unwrap());
        Owner { pid, report, exit }
    }
}

/// Live and not a zombie.
fn is_running(pid: u32) -> bool {
    match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        Ok(stat) => stat
            .rsplit_once(')')
            .map(|(_, rest)| !rest.trim_start().starts_with('Z'))
            .unwrap_or(false),
        Err(_) => false,
    }
}

fn wait_until_gone(pid: u32, limit: Duration) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if !is_running(pid) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    !is_running(pid)
}

fn kill_hard(pid: u32) {
    let status = Command::new("kill")
        .args(["-9", &pid.to_string()])
        .status()
        .unwrap();
    assert!(status.success());
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_status_fresh_environment() {
    let env = TestEnv::new();
    let (code, report) = env.run("status");
    assert_eq!(code, 0);
    assert_eq!(report, serde_json::json!({ "status": "not_running" }));
}

#[test]
fn test_missing_verb_is_usage_error() {
    let env = TestEnv::new();
    let output = env.command(&[]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_unknown_verb_is_usage_error() {
    let env = TestEnv::new();
    let output = env.command(&["launch"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_stop_when_not_running() {
    let env = TestEnv::new();
    for _ in 0..2 {
        let (code, report) = env.run("stop");
        assert_eq!(code, 0);
        assert_eq!(report["success"], true);
        assert!(report["message"].as_str().unwrap().contains("not running"));
    }
}

#[test]
fn test_start_status_conflict_stop() {
    let env = TestEnv::new();

    let owner = env.spawn("start");
    assert_eq!(owner.report["success"], true);
    assert_eq!(owner.report["endpoint"], "ws://127.0.0.1:1/devtools/browser/e2e");
    assert_eq!(owner.report["pid"], owner.pid);

    let state_dir = env.state_dir();
    assert_eq!(
        std::fs::read_to_string(state_dir.join("ws-endpoint")).unwrap(),
        "ws://127.0.0.1:1/devtools/browser/e2e"
    );
    assert_eq!(
        std::fs::read_to_string(state_dir.join("browser.pid")).unwrap(),
        owner.pid.to_string()
    );

    let (code, report) = env.run("status");
    assert_eq!(code, 0);
    assert_eq!(report["status"], "running");
    assert_eq!(report["pid"], owner.pid);

    let (code, report) = env.run("start");
    assert_eq!(code, 1);
    assert_eq!(report["success"], false);
    assert_eq!(report["error"], "conflict");
    assert!(state_dir.join("ws-endpoint").exists());

    let (code, report) = env.run("stop");
    assert_eq!(code, 0);
    assert_eq!(report["success"], true);

    let exit = owner.exit.join().unwrap();
    assert!(exit.success(), "owner exited with {exit}");
    assert!(!state_dir.join("ws-endpoint").exists());
    assert!(!state_dir.join("browser.pid").exists());

    let (_, report) = env.run("status");
    assert_eq!(report["status"], "not_running");
}

#[test]
fn test_stale_after_owner_killed() {
    let env = TestEnv::new();
    let owner = env.spawn("start");
    assert_eq!(owner.report["success"], true);

    kill_hard(owner.pid);
    owner.exit.join().unwrap();

    let (code, report) = env.run("status");
    assert_eq!(code, 0);
    assert_eq!(report["status"], "stale");
    assert_eq!(report["reason"], "process_gone");

    let (code, report) = env.run("start");
    assert_eq!(code, 1);
    assert_eq!(report["error"], "conflict");

    let (code, report) = env.run("stop");
    assert_eq!(code, 0);
    assert!(report["message"].as_str().unwrap().contains("already terminated"));

    let (_, report) = env.run("status");
    assert_eq!(report["status"], "not_running");
}

#[test]
fn test_stale_after_owner_record_deleted() {
    let env = TestEnv::new();
    let owner = env.spawn("start");
    std::fs::remove_file(env.state_dir().join("browser.pid")).unwrap();

    let (_, report) = env.run("status");
    assert_eq!(report["status"], "stale");
    assert_eq!(report["reason"], "missing_owner");

    let (code, _) = env.run("stop");
    assert_eq!(code, 0);
    assert!(!env.state_dir().join("ws-endpoint").exists());

    // The owner never heard about it; release it directly.
    let status = Command::new("kill")
        .arg(owner.pid.to_string())
        .status()
        .unwrap();
    assert!(status.success());
    owner.exit.join().unwrap();
}

#[test]
fn test_restart_replaces_owner() {
    let env = TestEnv::new();
    let first = env.spawn("start");

    let second = env.spawn("restart");
    assert_eq!(second.report["success"], true);
    assert_eq!(second.report["pid"], second.pid);
    assert_ne!(first.pid, second.pid);

    assert!(first.exit.join().unwrap().success());

    let (_, report) = env.run("status");
    assert_eq!(report["status"], "running");
    assert_eq!(report["pid"], second.pid);

    let (code, _) = env.run("stop");
    assert_eq!(code, 0);
    assert!(second.exit.join().unwrap().success());
}

#[test]
fn test_launch_failure() {
    let env = TestEnv::with_executable(Path::new("/nonexistent/browserd/chrome"));
    let (code, report) = env.run("start");

    assert_eq!(code, 1);
    assert_eq!(report["success"], false);
    assert_eq!(report["error"], "launch_failed");
    let message = report["message"].as_str().unwrap();
    assert!(message.contains("/nonexistent/browserd/chrome"));
    assert_eq!(message.matches("Failed to launch browser").count(), 1);
    assert!(!env.state_dir().join("ws-endpoint").exists());
    assert!(!env.state_dir().join("browser.pid").exists());
}

#[test]
fn test_invalid_config_file() {
    let env = TestEnv::new();
    std::fs::write(&env.config, "[daemon]\ngrace_period_ms = 0\n").unwrap();

    let (code, report) = env.run("status");
    assert_eq!(code, 1);
    assert_eq!(report["error"], "config");
}

#[test]
fn test_stop_waits_for_slow_browser_release() {
    let env = TestEnv::with_script(SLOW_EXIT_BROWSER);
    let owner = env.spawn("start");
    assert_eq!(owner.report["success"], true);
    let (browser_pid, profile) = env.browser_info();
    assert!(profile.exists());

    let (code, report) = env.run("stop");
    assert_eq!(code, 0);
    let message = report["message"].as_str().unwrap();
    assert!(!message.contains("killed"), "owner was escalated: {message}");

    let exit = owner.exit.join().unwrap();
    assert!(exit.success(), "owner exited with {exit}");
    assert!(wait_until_gone(browser_pid, Duration::from_secs(1)));
    assert!(!profile.exists());

    // The slot is really free: a fresh start gets a fresh browser.
    let next = env.spawn("start");
    assert_eq!(next.report["success"], true);
    let (next_pid, _) = env.browser_info();
    assert_ne!(next_pid, browser_pid);
    let (code, _) = env.run("stop");
    assert_eq!(code, 0);
    assert!(next.exit.join().unwrap().success());
}

#[cfg(target_os = "linux")]
#[test]
fn test_browser_dies_with_killed_owner() {
    let env = TestEnv::with_script(DEAF_BROWSER);
    let owner = env.spawn("start");
    assert_eq!(owner.report["success"], true);
    let (browser_pid, _) = env.browser_info();
    assert!(is_running(browser_pid));

    kill_hard(owner.pid);
    owner.exit.join().unwrap();

    assert!(wait_until_gone(browser_pid, Duration::from_secs(3)));

    let (code, _) = env.run("stop");
    assert_eq!(code, 0);
}
