//! Status reports derived from the hand-off store.

use serde::Serialize;

use crate::error::LifecycleState;
use crate::handoff::HandoffStore;
use crate::process::is_process_running;

/// Why an endpoint record is considered stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleReason {
    /// No ownership record beside the endpoint.
    MissingOwner,
    /// The ownership record could not be parsed.
    UnreadableOwner,
    /// The endpoint record exists but could not be read.
    UnreadableEndpoint,
    /// The recorded owner is no longer alive.
    ProcessGone,
}

impl std::fmt::Display for StaleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StaleReason::MissingOwner => write!(f, "ownership record missing"),
            StaleReason::UnreadableOwner => write!(f, "ownership record unreadable"),
            StaleReason::UnreadableEndpoint => write!(f, "endpoint record unreadable"),
            StaleReason::ProcessGone => write!(f, "owning process is gone"),
        }
    }
}

/// Observed state of the browser server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatusReport {
    NotRunning,
    Stale {
        #[serde(skip_serializing_if = "Option::is_none")]
        pid: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        endpoint: Option<String>,
        reason: StaleReason,
    },
    Running {
        pid: u32,
        endpoint: String,
    },
}

impl StatusReport {
    /// Inspect the store without touching it.
    pub fn inspect(store: &HandoffStore) -> Self {
        let endpoint = match store.read_endpoint() {
            Ok(Some(endpoint)) => endpoint,
            Ok(None) => return StatusReport::NotRunning,
            Err(_) => {
                return StatusReport::Stale {
                    pid: store.read_pid().ok().flatten(),
                    endpoint: None,
                    reason: StaleReason::UnreadableEndpoint,
                };
            }
        };

        match store.read_pid() {
            Ok(Some(pid)) if is_process_running(pid) => StatusReport::Running { pid, endpoint },
            Ok(Some(pid)) => StatusReport::Stale {
                pid: Some(pid),
                endpoint: Some(endpoint),
                reason: StaleReason::ProcessGone,
            },
            Ok(None) => StatusReport::Stale {
                pid: None,
                endpoint: Some(endpoint),
                reason: StaleReason::MissingOwner,
            },
            Err(_) => StatusReport::Stale {
                pid: None,
                endpoint: Some(endpoint),
                reason: StaleReason::UnreadableOwner,
            },
        }
    }

    pub fn state(&self) -> LifecycleState {
        match self {
            StatusReport::NotRunning => LifecycleState::Absent,
            StatusReport::Stale { .. } => LifecycleState::Stale,
            StatusReport::Running { .. } => LifecycleState::Running,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, StatusReport::Running { .. })
    }

    /// Human-readable summary.
    pub fn message(&self) -> String {
        match self {
            StatusReport::NotRunning => "Browser server is not running".to_string(),
            StatusReport::Stale { reason, .. } => format!(
                "Browser server state is stale ({}). Run 'stop' to clean up.",
                reason
            ),
            StatusReport::Running { pid, endpoint } => {
                format!("Browser server is running (PID: {}, endpoint: {})", pid, endpoint)
            }
        }
    }
}

impl std::fmt::Display for StatusReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}
