//! Lifecycle errors.

use std::path::PathBuf;

use browserd_browser::BrowserError;
use thiserror::Error;

/// Errors that can occur during lifecycle operations.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// An endpoint record exists, or another start holds the state directory.
    #[error(
        "Browser server already running (state dir: {}). Use 'status' to check or 'stop' to stop it.",
        state_dir.display()
    )]
    Conflict {
        state_dir: PathBuf,
        endpoint: Option<String>,
    },

    /// The managed browser could not be brought up.
    #[error(transparent)]
    LaunchFailed(#[from] BrowserError),

    /// The managed browser could not be released cleanly.
    #[error("Failed to release browser: {0}")]
    Release(#[source] BrowserError),

    #[error("Failed to read record {path}: {reason}")]
    RecordRead { path: PathBuf, reason: String },

    #[error("Failed to write record {path}: {reason}")]
    RecordWrite { path: PathBuf, reason: String },

    #[error("Failed to remove record {path}: {reason}")]
    RecordRemoval { path: PathBuf, reason: String },

    #[error("Failed to lock state directory {path}: {reason}")]
    Lock { path: PathBuf, reason: String },

    #[error("Failed to set up signal handlers: {0}")]
    SignalSetup(String),

    #[error("Failed to send {signal} to PID {pid}: {reason}")]
    SignalDelivery {
        pid: u32,
        signal: String,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Lifecycle state of the managed browser as seen through the hand-off store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// No records.
    Absent,
    /// A start is launching the browser.
    Starting,
    /// Records present and the owner is live.
    Running,
    /// A stop is terminating the owner.
    Stopping,
    /// Records present but the owner is gone.
    Stale,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleState::Absent => write!(f, "absent"),
            LifecycleState::Starting => write!(f, "starting"),
            LifecycleState::Running => write!(f, "running"),
            LifecycleState::Stopping => write!(f, "stopping"),
            LifecycleState::Stale => write!(f, "stale"),
        }
    }
}
