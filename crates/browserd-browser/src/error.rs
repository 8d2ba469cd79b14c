//! Browser launch errors.

use thiserror::Error;

/// Errors raised while launching or releasing the managed browser.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Chrome not found. Install Chromium/Chrome or set BROWSERD_BROWSER.")]
    ChromeNotFound,

    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Browser exited before becoming ready ({0})")]
    ExitedEarly(String),

    #[error("Browser did not become ready within {0}s")]
    LaunchTimeout(u64),

    #[error("Failed to close browser: {0}")]
    CloseFailed(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for BrowserError {
    fn from(e: reqwest::Error) -> Self {
        BrowserError::Http(e.to_string())
    }
}
