//! Docview Core Transfer Implementation
//!
//! This crate provides the radio-agnostic half of Docview's file transfer:
//! the framing codec, the chunked sender with bounded retries, the transfer
//! state machine and the controller that runs one transfer at a time on a
//! worker thread while reacting to connection-status changes and a timeout.
//! Radio adapters implement the `Transport` and `ConnectionStatusSource`
//! traits; UIs receive `TransferSnapshot`s through a `StatusReporter`.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod config;
pub mod controller;
pub mod errors;
pub mod file;
pub mod protocol;
pub mod reporter;
pub mod sender;
pub mod session;
pub mod timer;
pub mod transport;
pub mod types;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use config::TransferConfig;
pub use controller::TransferController;
pub use file::{FileStore, FsFileStore, MemoryFileStore};
pub use protocol::{
    AssemblyEvent, ControlFrame, FileAssembler, ReceivedFile, TransferEvent, TransferStatus,
};
pub use reporter::{ChannelReporter, LogReporter, StatusReporter};
pub use sender::{CancelFlag, ChunkedSender, SendObserver, SendSummary};
pub use transport::{
    ConnectionStatus, ConnectionStatusSource, StatusCallback, StatusSubscription, Transport,
};
pub use types::{FileName, TransferSnapshot};

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

pub use errors::{ConfigError, FrameError, Result, TransferError, TransportError};
