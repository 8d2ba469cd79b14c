//! CLI definitions for browserd.

use clap::{Parser, Subcommand};

/// browserd CLI.
#[derive(Parser)]
#[command(name = "browserd")]
#[command(about = "Run a background browser server that automation tools attach to")]
#[command(version)]
#[command(subcommand_required = true, arg_required_else_help = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Commands {
    /// Launch the browser and keep it running until SIGTERM/SIGINT
    Start,

    /// Stop the running browser server
    Stop,

    /// Report whether the browser server is running
    Status,

    /// Stop the browser server, then start it again in this process
    Restart,
}
