//! browserd - background browser server lifecycle manager
//!
//! Launches a headless browser, publishes its DevTools endpoint for sibling
//! automation tools and manages it through `start | stop | status | restart`.

mod cli;
mod cmd_browser;

use std::io::IsTerminal;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use browserd_config::{ConfigLoader, LoggingSection};

use crate::cli::Cli;
use crate::cmd_browser::{emit, CommandReport, EXIT_FAILURE};

fn open_log_file(logging: &LoggingSection) -> Result<RollingFileAppender, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(&logging.dir)?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("browserd")
        .filename_suffix("log")
        .max_log_files(logging.max_files)
        .build(&logging.dir)?;
    Ok(appender)
}

/// Console logging on stderr, plus a daily log file when enabled.
///
/// stdout carries the JSON reports and is never written to by tracing.
fn init_tracing(logging: Option<&LoggingSection>) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let mut file_error = None;
    let (file_layer, guard) = match logging.filter(|l| l.file).map(open_log_file) {
        Some(Ok(appender)) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(non_blocking).with_ansi(false);
            (Some(layer), Some(guard))
        }
        Some(Err(e)) => {
            file_error = Some(e.to_string());
            (None, None)
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(std::io::stderr().is_terminal())
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    if let Some(e) = file_error {
        warn!("File logging disabled: {}", e);
    }
    guard
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = ConfigLoader::load_effective();
    let _guard = init_tracing(config.as_ref().ok().map(|c| &c.logging));

    let code = match config {
        Ok(config) => cmd_browser::run(cli.command, config).await,
        Err(e) => {
            error!("{}", e);
            emit(&CommandReport::failure("config", e.to_string()));
            EXIT_FAILURE
        }
    };

    ExitCode::from(code)
}
