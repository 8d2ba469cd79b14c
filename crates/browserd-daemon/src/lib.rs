//! # browserd Daemon
//!
//! Lifecycle management for a background browser server shared with
//! sibling automation tools.
//!
//! ## Features
//!
//! - Hand-off store: endpoint and ownership records in a per-user state directory
//! - Mutual exclusion on start (advisory lock plus record check)
//! - Graceful-then-forced stop with stale state detection
//! - SIGTERM/SIGINT handling for the process owning the browser
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use browserd_browser::{ChromiumLauncher, LaunchConfig};
//! use browserd_daemon::{Controller, DaemonConfig, SignalHandler};
//!
//! let signals = SignalHandler::new();
//! signals.setup_os_signals()?;
//!
//! let launcher = Arc::new(ChromiumLauncher::new(LaunchConfig::default()));
//! let config = DaemonConfig {
//!     state_dir: "/run/user/1000/browserd".into(),
//!     grace_period_ms: 1000,
//!     restart_delay_ms: 1000,
//! };
//! let controller = Controller::new(config, launcher)?;
//! let running = controller.start().await?;
//! println!("{}", running.endpoint());
//! running.serve(&signals).await?;
//! ```
//!
//! Tools that only need the address read it through [`HandoffStore`]:
//!
//! ```rust,ignore
//! let store = browserd_daemon::HandoffStore::new(state_dir);
//! if let Some(endpoint) = store.attach_endpoint()? {
//!     // connect over the DevTools protocol
//! }
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod handoff;
pub mod process;
pub mod signal;
pub mod status;

pub use config::DaemonConfig;
pub use controller::{Controller, RunningBrowser, StopOutcome, Termination};
pub use error::{DaemonError, LifecycleState};
pub use handoff::{HandoffStore, StateLock, ENDPOINT_FILE, PID_FILE};
pub use process::{is_process_running, send_signal, Delivery, ProcessSignal};
pub use signal::{ShutdownSignal, SignalHandler};
pub use status::{StaleReason, StatusReport};
