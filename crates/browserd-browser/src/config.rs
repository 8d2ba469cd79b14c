//! Launch configuration.

use std::path::PathBuf;
use std::time::Duration;

/// How the managed browser is launched.
#[derive(Debug, Clone)]
pub struct LaunchConfig {
    /// Browser executable. Auto-detected when `None`.
    pub executable: Option<PathBuf>,
    /// Whether to run the browser headless.
    pub headless: bool,
    /// Extra flags appended after the standard ones.
    pub args: Vec<String>,
    /// Readiness deadline. `None` waits until the browser is ready or exits.
    pub launch_timeout: Option<Duration>,
    /// Grace period for a closing browser before it is killed.
    pub close_timeout: Duration,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            executable: None,
            headless: true,
            args: Vec::new(),
            launch_timeout: None,
            close_timeout: Duration::from_millis(500),
        }
    }
}

impl LaunchConfig {
    /// Standard flags for a fresh, quiet, remotely debuggable browser.
    pub(crate) fn command_args(&self, profile_dir: &std::path::Path) -> Vec<String> {
        let mut args = vec![
            "--remote-debugging-port=0".to_string(),
            format!("--user-data-dir={}", profile_dir.display()),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            "--disable-background-networking".to_string(),
            "--disable-sync".to_string(),
            "--disable-translate".to_string(),
            "--metrics-recording-only".to_string(),
        ];
        if self.headless {
            args.push("--headless=new".to_string());
        }
        args.extend(self.args.iter().cloned());
        args.push("about:blank".to_string());
        args
    }
}
