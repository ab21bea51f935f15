//! Bluetooth Low Energy transport for Docview file transfer
//!
//! This crate adapts a BLE serial-profile radio to the `Transport` and
//! `ConnectionStatusSource` traits from `docview-core`.
//!
//! ## Architecture
//!
//! - [`hal`] - Raw radio interface (power state, packet size, serial write)
//! - [`transport`] - Transport Adapter over a `RadioHal`
//! - [`service`] - Single-subscriber connection-status hub
//! - [`sim`] - Simulated radio with fault injection for host builds
//! - [`config`] - Simulated radio configuration
//! - [`error`] - Error types specific to the BLE transport
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use docview_ble::{BleTransport, SimulatedRadio, SimulatedRadioConfig};
//! use docview_core::{LogReporter, MemoryFileStore, TransferConfig, TransferController};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (radio, _peer_rx) = SimulatedRadio::new(SimulatedRadioConfig::default())?;
//! let transport = BleTransport::new(radio.clone());
//! transport.init()?;
//!
//! let controller = TransferController::new(
//!     Arc::new(transport),
//!     radio.service(),
//!     Arc::new(MemoryFileStore::new()),
//!     Arc::new(LogReporter),
//!     TransferConfig::default(),
//! )?;
//! controller.start("/ext/documents/readme.txt")?;
//! radio.connect_peer();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod hal;
pub mod service;
pub mod sim;
pub mod transport;

// Public API exports
pub use config::SimulatedRadioConfig;
pub use error::BleTransportError;
pub use hal::RadioHal;
pub use service::BtService;
pub use sim::{RadioStats, SimulatedRadio};
pub use transport::BleTransport;

// Re-export core traits for convenience
pub use docview_core::{ConnectionStatus, ConnectionStatusSource, Transport};
