//! Lifecycle controller configuration.
//!
//! Defaults and file parsing live in `browserd-config`; this is the resolved
//! view the controller runs with.

use std::path::PathBuf;
use std::time::Duration;

/// Lifecycle controller configuration.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Directory holding the endpoint and ownership records.
    pub state_dir: PathBuf,

    /// Wait between graceful and forced termination (in milliseconds).
    pub grace_period_ms: u64,

    /// Pause between stop and start during restart (in milliseconds).
    pub restart_delay_ms: u64,
}

impl DaemonConfig {
    /// Get the grace period as a Duration.
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    /// Get the restart delay as a Duration.
    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.state_dir.as_os_str().is_empty() {
            return Err("state_dir must not be empty".to_string());
        }

        if self.grace_period_ms == 0 {
            return Err("grace_period_ms must be > 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
