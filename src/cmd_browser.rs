//! Verb handlers. Each prints one JSON report on stdout and yields an exit code.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info};

use browserd_browser::{ChromiumLauncher, LaunchConfig};
use browserd_config::Config;
use browserd_daemon::{Controller, DaemonConfig, DaemonError, RunningBrowser, SignalHandler};

use crate::cli::Commands;

pub(crate) const EXIT_OK: u8 = 0;
pub(crate) const EXIT_FAILURE: u8 = 1;

/// Outcome of start, stop and restart.
#[derive(Debug, Serialize)]
pub(crate) struct CommandReport {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
}

impl CommandReport {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
            endpoint: None,
            pid: None,
        }
    }

    pub(crate) fn failure(kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: Some(kind),
            endpoint: None,
            pid: None,
        }
    }

    fn running(message: impl Into<String>, running: &RunningBrowser) -> Self {
        Self {
            endpoint: Some(running.endpoint().to_string()),
            pid: Some(running.owner_pid()),
            ..Self::ok(message)
        }
    }
}

/// Print a value as one JSON line on stdout.
pub(crate) fn emit<T: Serialize>(report: &T) {
    match serde_json::to_string(report) {
        Ok(line) => println!("{}", line),
        Err(e) => error!("Failed to serialize report: {}", e),
    }
}

fn error_kind(err: &DaemonError) -> &'static str {
    match err {
        DaemonError::Conflict { .. } => "conflict",
        DaemonError::LaunchFailed(_) => "launch_failed",
        DaemonError::SignalDelivery { .. } | DaemonError::SignalSetup(_) => "signal",
        DaemonError::Config(_) => "config",
        _ => "internal",
    }
}

fn fail(err: DaemonError) -> u8 {
    error!("{}", err);
    emit(&CommandReport::failure(error_kind(&err), err.to_string()));
    EXIT_FAILURE
}

pub(crate) fn daemon_config(config: &Config) -> DaemonConfig {
    DaemonConfig {
        state_dir: config.daemon.state_dir.clone(),
        grace_period_ms: config.daemon.grace_period_ms,
        restart_delay_ms: config.daemon.restart_delay_ms,
    }
}

pub(crate) fn launch_config(config: &Config) -> LaunchConfig {
    LaunchConfig {
        executable: config.browser.executable.clone(),
        headless: config.browser.headless,
        args: config.browser.args.clone(),
        launch_timeout: config.browser.launch_timeout_secs.map(Duration::from_secs),
        close_timeout: Duration::from_millis(config.browser.close_timeout_ms),
    }
}

/// Dispatch a verb.
pub(crate) async fn run(command: Commands, config: Config) -> u8 {
    let launcher = Arc::new(ChromiumLauncher::new(launch_config(&config)));
    let controller = match Controller::new(daemon_config(&config), launcher) {
        Ok(controller) => controller,
        Err(e) => return fail(e),
    };

    match command {
        Commands::Start => browser_start(&controller).await,
        Commands::Stop => browser_stop(&controller).await,
        Commands::Status => browser_status(&controller),
        Commands::Restart => browser_restart(&controller).await,
    }
}

fn install_signals() -> Result<SignalHandler, DaemonError> {
    let signals = SignalHandler::new();
    signals.setup_os_signals()?;
    Ok(signals)
}

async fn serve(running: RunningBrowser, signals: &SignalHandler) -> u8 {
    match running.serve(signals).await {
        Ok(()) => EXIT_OK,
        Err(e) => {
            error!("Shutdown failed: {}", e);
            EXIT_FAILURE
        }
    }
}

async fn browser_start(controller: &Controller) -> u8 {
    let signals = match install_signals() {
        Ok(signals) => signals,
        Err(e) => return fail(e),
    };

    info!("Starting browser server...");
    let running = match controller.start().await {
        Ok(running) => running,
        Err(e) => return fail(e),
    };

    emit(&CommandReport::running("Browser server started", &running));
    serve(running, &signals).await
}

async fn browser_stop(controller: &Controller) -> u8 {
    match controller.stop().await {
        Ok(outcome) => {
            emit(&CommandReport::ok(outcome.message()));
            EXIT_OK
        }
        Err(e) => fail(e),
    }
}

fn browser_status(controller: &Controller) -> u8 {
    let report = controller.status();
    info!("{}", report);
    emit(&report);
    EXIT_OK
}

async fn browser_restart(controller: &Controller) -> u8 {
    let signals = match install_signals() {
        Ok(signals) => signals,
        Err(e) => return fail(e),
    };

    let (stopped, running) = match controller.restart().await {
        Ok(result) => result,
        Err(e) => return fail(e),
    };

    let message = format!("{}; browser server started", stopped.message());
    emit(&CommandReport::running(message, &running));
    serve(running, &signals).await
}
