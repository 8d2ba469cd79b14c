//! Lifecycle controller: start, stop, status and restart over one state directory.

use std::sync::Arc;
use std::time::Duration;

use browserd_browser::{Launcher, ManagedBrowser};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::DaemonConfig;
use crate::error::{DaemonError, LifecycleState};
use crate::handoff::{HandoffStore, StateLock};
use crate::process::{is_process_running, send_signal, Delivery, ProcessSignal};
use crate::signal::SignalHandler;
use crate::status::StatusReport;

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(100);
const KILL_WAIT: Duration = Duration::from_secs(1);

/// How the recorded owner went away during stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The process was gone before any signal landed.
    AlreadyGone,
    /// Exited within the grace period after SIGTERM.
    Graceful,
    /// Needed SIGKILL.
    Forced,
}

/// Result of a stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StopOutcome {
    /// No endpoint record.
    NotRunning,
    /// Endpoint without a usable ownership record; records removed.
    StaleCleared { endpoint: Option<String> },
    /// The owner was terminated and records removed.
    Stopped {
        pid: u32,
        termination: Termination,
    },
}

impl StopOutcome {
    pub fn message(&self) -> String {
        match self {
            StopOutcome::NotRunning => "Browser server is not running".to_string(),
            StopOutcome::StaleCleared { .. } => {
                "Removed stale browser server state (no owning process)".to_string()
            }
            StopOutcome::Stopped {
                pid,
                termination: Termination::AlreadyGone,
            } => format!("Browser server process {} was already terminated; state removed", pid),
            StopOutcome::Stopped {
                pid,
                termination: Termination::Graceful,
            } => format!("Browser server stopped (PID: {})", pid),
            StopOutcome::Stopped {
                pid,
                termination: Termination::Forced,
            } => format!("Browser server killed after grace period (PID: {})", pid),
        }
    }
}

/// Drives the managed browser through its lifecycle.
pub struct Controller {
    config: DaemonConfig,
    store: HandoffStore,
    launcher: Arc<dyn Launcher>,
}

impl Controller {
    pub fn new(config: DaemonConfig, launcher: Arc<dyn Launcher>) -> Result<Self, DaemonError> {
        config.validate().map_err(DaemonError::Config)?;
        let store = HandoffStore::new(&config.state_dir);
        Ok(Self {
            config,
            store,
            launcher,
        })
    }

    pub fn config(&self) -> &DaemonConfig {
        &self.config
    }

    pub fn store(&self) -> &HandoffStore {
        &self.store
    }

    /// Launch the browser and publish its records.
    ///
    /// Fails with [`DaemonError::Conflict`] while an endpoint record exists,
    /// whether or not its owner is alive. The returned [`RunningBrowser`]
    /// holds the state directory lock until it is shut down.
    pub async fn start(&self) -> Result<RunningBrowser, DaemonError> {
        self.store.ensure_dir()?;
        let lock = self.store.try_lock()?;

        if self.store.has_endpoint() {
            let endpoint = self.store.read_endpoint().ok().flatten();
            warn!(
                "Endpoint record present in {}, refusing to start",
                self.store.dir().display()
            );
            return Err(DaemonError::Conflict {
                state_dir: self.store.dir().to_path_buf(),
                endpoint,
            });
        }

        debug!("Lifecycle: {} -> {}", LifecycleState::Absent, LifecycleState::Starting);
        info!("Launching browser...");

        let mut browser = match self.launcher.launch().await {
            Ok(browser) => browser,
            Err(e) => {
                error!("Browser launch failed: {}", e);
                if let Err(clear_err) = self.store.clear() {
                    warn!("Cleanup after failed launch: {}", clear_err);
                }
                return Err(DaemonError::LaunchFailed(e));
            }
        };

        let pid = std::process::id();
        if let Err(e) = self.store.write(browser.endpoint(), pid) {
            error!("Failed to publish records: {}", e);
            if let Err(close_err) = browser.close().await {
                warn!("Failed to close browser after record failure: {}", close_err);
            }
            if let Err(clear_err) = self.store.clear() {
                warn!("Cleanup after failed record write: {}", clear_err);
            }
            return Err(e);
        }

        debug!("Lifecycle: {} -> {}", LifecycleState::Starting, LifecycleState::Running);
        match browser.pid() {
            Some(browser_pid) => info!("Browser server running (PID: {}, browser PID: {})", pid, browser_pid),
            None => info!("Browser server running (PID: {})", pid),
        }

        Ok(RunningBrowser {
            browser,
            store: self.store.clone(),
            pid,
            _lock: lock,
        })
    }

    /// Terminate the recorded owner and remove both records.
    pub async fn stop(&self) -> Result<StopOutcome, DaemonError> {
        if !self.store.has_endpoint() {
            info!("Browser server is not running");
            return Ok(StopOutcome::NotRunning);
        }
        let endpoint = self.store.read_endpoint().ok().flatten();

        let pid = match self.store.read_pid() {
            Ok(Some(pid)) => pid,
            Ok(None) => {
                warn!("Stale state: endpoint record without ownership record, cleaning up");
                self.store.clear()?;
                return Ok(StopOutcome::StaleCleared { endpoint });
            }
            Err(e) => {
                warn!("Stale state: {}, cleaning up", e);
                self.store.clear()?;
                return Ok(StopOutcome::StaleCleared { endpoint });
            }
        };

        debug!("Lifecycle: {} -> {}", LifecycleState::Running, LifecycleState::Stopping);
        info!("Stopping browser server (PID: {})...", pid);

        let terminated = self.terminate(pid).await;
        let cleared = self.store.clear();
        let termination = terminated?;
        cleared?;

        debug!("Lifecycle: {} -> {}", LifecycleState::Stopping, LifecycleState::Absent);
        Ok(StopOutcome::Stopped { pid, termination })
    }

    /// Report the current state without modifying anything.
    pub fn status(&self) -> StatusReport {
        StatusReport::inspect(&self.store)
    }

    /// Stop, pause, then start again.
    pub async fn restart(&self) -> Result<(StopOutcome, RunningBrowser), DaemonError> {
        info!("Restarting browser server...");
        let stopped = self.stop().await?;
        tokio::time::sleep(self.config.restart_delay()).await;
        let running = self.start().await?;
        Ok((stopped, running))
    }

    async fn terminate(&self, pid: u32) -> Result<Termination, DaemonError> {
        if send_signal(pid, ProcessSignal::Terminate)? == Delivery::ProcessGone {
            info!("Process {} already terminated", pid);
            return Ok(Termination::AlreadyGone);
        }

        if wait_for_exit(pid, self.config.grace_period()).await {
            info!("Browser server stopped");
            return Ok(Termination::Graceful);
        }

        warn!(
            "Process {} still alive after {:?}, sending SIGKILL",
            pid,
            self.config.grace_period()
        );
        if send_signal(pid, ProcessSignal::Kill)? == Delivery::ProcessGone {
            return Ok(Termination::Graceful);
        }
        if !wait_for_exit(pid, KILL_WAIT).await {
            warn!("Process {} still visible after SIGKILL", pid);
        }
        Ok(Termination::Forced)
    }
}

/// Poll until the process is gone or the timeout elapses.
async fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if !is_process_running(pid) {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        tokio::time::sleep(EXIT_POLL_INTERVAL.min(deadline - now)).await;
    }
}

/// A launched browser with published records, owned by this process.
pub struct RunningBrowser {
    browser: Box<dyn ManagedBrowser>,
    store: HandoffStore,
    pid: u32,
    _lock: StateLock,
}

impl RunningBrowser {
    pub fn endpoint(&self) -> &str {
        self.browser.endpoint()
    }

    /// PID written to the ownership record.
    pub fn owner_pid(&self) -> u32 {
        self.pid
    }

    /// Park until a shutdown signal arrives, then release everything.
    pub async fn serve(self, signals: &SignalHandler) -> Result<(), DaemonError> {
        info!("Waiting for shutdown signal");
        signals.wait_for_shutdown().await;
        info!("Shutdown requested, releasing browser");
        self.shutdown().await
    }

    /// Close the browser and remove both records.
    pub async fn shutdown(mut self) -> Result<(), DaemonError> {
        let closed = self.browser.close().await;
        let cleared = self.store.clear();
        closed.map_err(DaemonError::Release)?;
        cleared?;
        info!("Browser server shut down");
        Ok(())
    }
}

#[cfg(all(test, unix))]
#[path = "controller_tests.rs"]
mod tests;
