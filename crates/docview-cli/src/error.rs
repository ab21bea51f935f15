//! Error handling for the Docview CLI

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Transfer error: {0}")]
    Transfer(#[from] docview_core::TransferError),

    #[error("Radio error: {0}")]
    Radio(#[from] docview_ble::BleTransportError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    #[error("Peer error: {0}")]
    Peer(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
