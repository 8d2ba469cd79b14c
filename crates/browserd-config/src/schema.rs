//! Configuration schema definitions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub daemon: DaemonSection,

    #[serde(default)]
    pub browser: BrowserSection,

    #[serde(default)]
    pub logging: LoggingSection,
}

impl Config {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.daemon.state_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "daemon.state_dir".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        if self.daemon.grace_period_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "daemon.grace_period_ms".to_string(),
                message: "must be > 0".to_string(),
            });
        }

        // The owner must finish releasing the browser before stop escalates.
        if self.browser.close_timeout_ms >= self.daemon.grace_period_ms {
            return Err(ConfigError::InvalidValue {
                field: "browser.close_timeout_ms".to_string(),
                message: format!(
                    "must be shorter than daemon.grace_period_ms ({})",
                    self.daemon.grace_period_ms
                ),
            });
        }

        if let Some(0) = self.browser.launch_timeout_secs {
            return Err(ConfigError::InvalidValue {
                field: "browser.launch_timeout_secs".to_string(),
                message: "must be > 0 when set".to_string(),
            });
        }

        if self.logging.max_files == 0 {
            return Err(ConfigError::InvalidValue {
                field: "logging.max_files".to_string(),
                message: "must be > 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Base directory for everything browserd keeps on disk.
pub fn browserd_home() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".browserd"))
        .unwrap_or_else(|| std::env::temp_dir().join("browserd"))
}

/// Lifecycle controller settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonSection {
    /// Directory holding the endpoint and ownership records.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    /// Wait between SIGTERM and SIGKILL when stopping.
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,

    /// Pause between the stop and start halves of a restart.
    #[serde(default = "default_restart_delay_ms")]
    pub restart_delay_ms: u64,
}

impl Default for DaemonSection {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
            grace_period_ms: default_grace_period_ms(),
            restart_delay_ms: default_restart_delay_ms(),
        }
    }
}

fn default_state_dir() -> PathBuf {
    browserd_home().join("run")
}

fn default_grace_period_ms() -> u64 {
    1000
}

fn default_restart_delay_ms() -> u64 {
    1000
}

/// Managed browser settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserSection {
    /// Browser executable. Auto-detected when absent.
    #[serde(default)]
    pub executable: Option<PathBuf>,

    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Extra command-line flags passed to the browser.
    #[serde(default)]
    pub args: Vec<String>,

    /// Give up on a browser that never becomes ready. No limit when absent.
    #[serde(default)]
    pub launch_timeout_secs: Option<u64>,

    /// How long a closing browser gets before it is killed. Must stay below
    /// `daemon.grace_period_ms`.
    #[serde(default = "default_close_timeout_ms")]
    pub close_timeout_ms: u64,
}

impl Default for BrowserSection {
    fn default() -> Self {
        Self {
            executable: None,
            headless: default_headless(),
            args: Vec::new(),
            launch_timeout_secs: None,
            close_timeout_ms: default_close_timeout_ms(),
        }
    }
}

fn default_headless() -> bool {
    true
}

fn default_close_timeout_ms() -> u64 {
    500
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Whether to write a rolling log file next to console output.
    #[serde(default = "default_file")]
    pub file: bool,

    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,

    /// Number of daily log files to keep.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            file: default_file(),
            dir: default_log_dir(),
            max_files: default_max_files(),
        }
    }
}

fn default_file() -> bool {
    true
}

fn default_log_dir() -> PathBuf {
    browserd_home().join("logs")
}

fn default_max_files() -> usize {
    7
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
