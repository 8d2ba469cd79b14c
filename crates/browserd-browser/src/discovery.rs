//! DevTools endpoint discovery.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::BrowserError;

/// File Chromium writes into its profile directory once remote debugging
/// is listening: the port on the first line, the browser target path on
/// the second.
pub const ACTIVE_PORT_FILE: &str = "DevToolsActivePort";

const VERSION_TIMEOUT: Duration = Duration::from_secs(2);

/// Browser version info from the `/json/version` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserVersion {
    #[serde(rename = "Browser")]
    pub browser: String,
    #[serde(rename = "webSocketDebuggerUrl")]
    pub web_socket_debugger_url: String,
}

/// Contents of a `DevToolsActivePort` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivePort {
    pub port: u16,
    pub path: String,
}

impl ActivePort {
    /// Parse the file contents. Returns `None` for a partially written file.
    pub fn parse(contents: &str) -> Option<Self> {
        let mut lines = contents.lines();
        let port = lines.next()?.trim().parse::<u16>().ok()?;
        if port == 0 {
            return None;
        }
        let path = lines.next()?.trim();
        if !path.starts_with('/') {
            return None;
        }
        Some(Self {
            port,
            path: path.to_string(),
        })
    }

    /// Read the active port file from a profile directory, if it exists yet.
    pub fn read(profile_dir: &Path) -> Result<Option<Self>, BrowserError> {
        match std::fs::read_to_string(profile_dir.join(ACTIVE_PORT_FILE)) {
            Ok(contents) => Ok(Self::parse(&contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// HTTP endpoint for DevTools discovery.
    pub fn http_endpoint(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// WebSocket endpoint derived from the file alone.
    pub fn ws_endpoint(&self) -> String {
        format!("ws://127.0.0.1:{}{}", self.port, self.path)
    }

    /// Resolve the browser WebSocket endpoint.
    ///
    /// Prefers the URL reported by `/json/version`; falls back to the
    /// address derived from the active port file when that request fails.
    pub async fn resolve_endpoint(&self) -> String {
        match self.fetch_version().await {
            Ok(version) => {
                debug!(
                    "DevTools reports {} at {}",
                    version.browser, version.web_socket_debugger_url
                );
                version.web_socket_debugger_url
            }
            Err(e) => {
                debug!("Version lookup failed ({}), using {}", e, self.ws_endpoint());
                self.ws_endpoint()
            }
        }
    }

    /// Fetch `/json/version` from the browser.
    pub async fn fetch_version(&self) -> Result<BrowserVersion, BrowserError> {
        let client = reqwest::Client::builder()
            .timeout(VERSION_TIMEOUT)
            .build()?;
        let version = client
            .get(format!("{}/json/version", self.http_endpoint()))
            .send()
            .await?
            .error_for_status()?
            .json::<BrowserVersion>()
            .await?;
        Ok(version)
    }
}
