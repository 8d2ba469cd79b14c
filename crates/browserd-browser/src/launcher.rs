//! Browser process launch and release.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::config::LaunchConfig;
use crate::discovery::ActivePort;
use crate::error::BrowserError;

const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A running browser owned by the lifecycle controller.
#[async_trait]
pub trait ManagedBrowser: Send + Sync {
    /// Opaque address sibling processes attach to.
    fn endpoint(&self) -> &str;

    /// OS process id of the browser, if known.
    fn pid(&self) -> Option<u32>;

    /// Release the browser. Calling it again is a no-op.
    async fn close(&mut self) -> Result<(), BrowserError>;
}

/// Something that can bring up a [`ManagedBrowser`].
#[async_trait]
pub trait Launcher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn ManagedBrowser>, BrowserError>;
}

/// Launches Chrome/Chromium with remote debugging on an ephemeral port.
#[derive(Debug, Clone, Default)]
pub struct ChromiumLauncher {
    config: LaunchConfig,
}

impl ChromiumLauncher {
    pub fn new(config: LaunchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LaunchConfig {
        &self.config
    }

    /// Find a Chrome/Chromium executable in well-known locations or `PATH`.
    pub fn find_chrome() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        let paths: &[&str] = &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
        ];

        #[cfg(target_os = "linux")]
        let paths: &[&str] = &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
        ];

        #[cfg(target_os = "windows")]
        let paths: &[&str] = &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ];

        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        let paths: &[&str] = &[];

        if let Some(found) = paths.iter().map(PathBuf::from).find(|p| p.exists()) {
            return Some(found);
        }

        let names = ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser"];
        let search = std::env::var_os("PATH")?;
        std::env::split_paths(&search)
            .flat_map(|dir| names.iter().map(move |name| dir.join(name)))
            .find(|candidate| candidate.is_file())
    }

    fn resolve_executable(&self) -> Result<PathBuf, BrowserError> {
        match &self.config.executable {
            Some(path) => Ok(path.clone()),
            None => Self::find_chrome().ok_or(BrowserError::ChromeNotFound),
        }
    }

    /// Have the kernel SIGKILL the browser when its owner dies without
    /// releasing it (e.g. SIGKILL from an escalated stop).
    ///
    /// The death signal is tied to the spawning thread, which is a runtime
    /// thread living as long as the owner.
    #[cfg(target_os = "linux")]
    fn die_with_owner(command: &mut Command) {
        use nix::errno::Errno;
        use nix::sys::prctl;
        use nix::sys::signal::Signal;
        use nix::unistd::{getppid, Pid};

        let owner = Pid::this();
        // SAFETY: the hook runs between fork and exec and only issues
        // async-signal-safe syscalls without allocating.
        unsafe {
            command.pre_exec(move || {
                prctl::set_pdeathsig(Signal::SIGKILL)?;
                // The owner may have died before the death signal was armed.
                if getppid() != owner {
                    return Err(Errno::ESRCH.into());
                }
                Ok(())
            });
        }
    }

    /// Poll until the browser publishes its DevTools port or exits.
    async fn wait_until_ready(
        child: &mut Child,
        profile_dir: &Path,
    ) -> Result<ActivePort, BrowserError> {
        loop {
            if let Some(status) = child.try_wait()? {
                return Err(BrowserError::ExitedEarly(status.to_string()));
            }
            if let Some(active) = ActivePort::read(profile_dir)? {
                return Ok(active);
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl Launcher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn ManagedBrowser>, BrowserError> {
        let executable = self.resolve_executable()?;
        let profile = tempfile::Builder::new()
            .prefix("browserd-profile-")
            .tempdir()?;

        info!(
            "Launching {} (profile: {})",
            executable.display(),
            profile.path().display()
        );

        let mut command = Command::new(&executable);
        command
            .args(self.config.command_args(profile.path()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        #[cfg(target_os = "linux")]
        Self::die_with_owner(&mut command);

        let mut child = command
            .spawn()
            .map_err(|e| BrowserError::LaunchFailed(format!("{}: {}", executable.display(), e)))?;

        let pid = child.id();
        debug!("Browser spawned with PID: {:?}", pid);

        let ready = Self::wait_until_ready(&mut child, profile.path());
        let outcome = match self.config.launch_timeout {
            Some(limit) => tokio::time::timeout(limit, ready)
                .await
                .unwrap_or(Err(BrowserError::LaunchTimeout(limit.as_secs()))),
            None => ready.await,
        };

        let active = match outcome {
            Ok(active) => active,
            Err(e) => {
                let _ = child.kill().await;
                return Err(e);
            }
        };

        let endpoint = active.resolve_endpoint().await;
        info!("Browser ready at {} (PID: {:?})", endpoint, pid);

        Ok(Box::new(ChromiumInstance {
            child: Some(child),
            pid,
            endpoint,
            profile: Some(profile),
            close_timeout: self.config.close_timeout,
        }))
    }
}

/// A browser process launched by [`ChromiumLauncher`].
pub struct ChromiumInstance {
    child: Option<Child>,
    pid: Option<u32>,
    endpoint: String,
    profile: Option<TempDir>,
    close_timeout: Duration,
}

impl ChromiumInstance {
    #[cfg(unix)]
    fn request_terminate(child: &mut Child) {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        if let Some(pid) = child.id() {
            if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                debug!("SIGTERM to browser PID {} failed: {}", pid, e);
            }
        }
    }

    #[cfg(not(unix))]
    fn request_terminate(child: &mut Child) {
        let _ = child.start_kill();
    }
}

#[async_trait]
impl ManagedBrowser for ChromiumInstance {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn pid(&self) -> Option<u32> {
        self.pid
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        if child.try_wait()?.is_none() {
            info!("Shutting down browser (PID: {:?})...", self.pid);
            Self::request_terminate(&mut child);

            match tokio::time::timeout(self.close_timeout, child.wait()).await {
                Ok(status) => {
                    debug!("Browser exited: {}", status?);
                }
                Err(_) => {
                    warn!(
                        "Browser did not exit within {:?}, killing",
                        self.close_timeout
                    );
                    child
                        .kill()
                        .await
                        .map_err(|e| BrowserError::CloseFailed(e.to_string()))?;
                }
            }
        }

        if let Some(profile) = self.profile.take() {
            if let Err(e) = profile.close() {
                warn!("Failed to remove browser profile: {}", e);
            }
        }

        info!("Browser closed");
        Ok(())
    }
}

#[cfg(all(test, unix))]
#[path = "launcher_tests.rs"]
mod tests;
