//! Docview CLI library
//!
//! Host-side demonstration of the Docview radio file transfer: sends a file
//! through a simulated BLE radio to an in-process peer that rebuilds it on
//! disk.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod peer;

pub use cli::{Cli, Commands};
pub use config::AppConfig;
pub use error::{CliError, Result};
