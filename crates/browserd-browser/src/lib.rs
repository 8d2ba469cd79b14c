//! Managed browser resource for browserd.
//!
//! Launches a headless Chromium-family browser with remote debugging on an
//! ephemeral port and resolves the DevTools WebSocket endpoint that sibling
//! automation tools attach to.
//!
//! ```text
//! ┌─────────────────┐   spawn + flags   ┌──────────────────┐
//! │ ChromiumLauncher│ ────────────────► │ Chrome/Chromium  │
//! └────────┬────────┘                   └────────┬─────────┘
//!          │   DevToolsActivePort (profile dir)  │
//!          │ ◄───────────────────────────────────┘
//!          │   GET /json/version
//!          ▼
//!   ws://127.0.0.1:<port>/devtools/browser/<id>
//! ```
//!
//! The [`Launcher`] and [`ManagedBrowser`] traits are the seam the lifecycle
//! controller is written against.

mod config;
mod discovery;
mod error;
mod launcher;

pub use config::LaunchConfig;
pub use discovery::{ActivePort, BrowserVersion, ACTIVE_PORT_FILE};
pub use error::BrowserError;
pub use launcher::{ChromiumInstance, ChromiumLauncher, Launcher, ManagedBrowser};
