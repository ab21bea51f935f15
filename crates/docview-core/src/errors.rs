//! Error types for the Docview transfer subsystem
//!
//! This module contains the error kinds a transfer can end with (link, send,
//! file, disconnect, timeout and resource failures), the transport and codec
//! errors they are built from, and the unified `TransferError`.

use std::io;

// ----------------------------------------------------------------------------
// Specific Error Types
// ----------------------------------------------------------------------------

/// Errors reported by a Transport Adapter for a single packet
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("Radio link is not active")]
    LinkInactive,
    #[error("Packet too large: {size} bytes (max: {max_size})")]
    PacketTooLarge { size: usize, max_size: usize },
    #[error("Short write: link accepted {sent} of {expected} bytes")]
    ShortWrite { sent: i32, expected: usize },
}

impl TransportError {
    /// Whether another attempt at the same packet can succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, TransportError::ShortWrite { .. })
    }
}

/// Errors raised while building or parsing wire frames
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("Packet size {max_packet_size} cannot hold a START frame")]
    PacketTooSmall { max_packet_size: usize },
    #[error("Empty packet")]
    Empty,
    #[error("Unknown control tag 0x{tag:02x}")]
    UnknownTag { tag: u8 },
    #[error("Truncated frame: expected at least {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("Unexpected {frame} frame while {phase}")]
    UnexpectedFrame {
        frame: &'static str,
        phase: &'static str,
    },
    #[error("Data overflow: {extra} bytes beyond the declared size")]
    Overflow { extra: usize },
}

/// Invalid configuration values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
    #[error("{field} is out of range: {value}")]
    OutOfRange { field: &'static str, value: u64 },
}

// ----------------------------------------------------------------------------
// Main Error Type
// ----------------------------------------------------------------------------

/// Error kinds a transfer session can surface
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("Radio link is not active")]
    LinkInactive,

    #[error("Packet send failed after {attempts} attempts: {source}")]
    SendFailed {
        attempts: u8,
        #[source]
        source: TransportError,
    },

    #[error("File read error: {0}")]
    FileRead(#[from] io::Error),

    #[error("Peer disconnected")]
    Disconnected,

    #[error("Transfer timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    #[error("Failed to allocate {resource}: {source}")]
    ResourceExhaustion {
        resource: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Transfer cancelled")]
    Cancelled,

    #[error("A transfer is already active")]
    AlreadyActive,

    #[error("No file selected")]
    NoFileSelected,

    #[error("File too large for transfer: {size} bytes")]
    FileTooLarge { size: u64 },

    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

// ----------------------------------------------------------------------------
// Conversions and Constructors
// ----------------------------------------------------------------------------

impl From<TransportError> for TransferError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::LinkInactive => TransferError::LinkInactive,
            other => TransferError::SendFailed {
                attempts: 1,
                source: other,
            },
        }
    }
}

impl TransferError {
    /// Create a file read error for a source that ended early
    pub fn unexpected_eof(sent: u64, expected: u64) -> Self {
        TransferError::FileRead(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("file ended after {} of {} bytes", sent, expected),
        ))
    }

    /// Create a resource exhaustion error
    pub fn resource(resource: &'static str, source: io::Error) -> Self {
        TransferError::ResourceExhaustion { resource, source }
    }
}

// ----------------------------------------------------------------------------
// Type Aliases
// ----------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, TransferError>;
