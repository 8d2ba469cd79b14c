//! # browserd Config
//!
//! Configuration loading for the browserd lifecycle manager.
//!
//! The configuration file is optional. When present it lives at
//! `$BROWSERD_CONFIG` or `~/.browserd/config.toml` and may reference
//! environment variables as `${VAR}`.

mod error;
mod loader;
mod schema;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
