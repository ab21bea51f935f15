//! Simulated BLE radio
//!
//! A host-side `RadioHal` for demos and tests. Packets written while a peer
//! is connected are handed to an async consumer over an unbounded channel;
//! status changes go through the attached `BtService`. Faults can be
//! injected per write attempt.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use docview_core::ConnectionStatus;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use crate::config::SimulatedRadioConfig;
use crate::error::BleTransportError;
use crate::hal::RadioHal;
use crate::service::BtService;

/// Counters of a simulated radio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RadioStats {
    /// Every `serial_tx` call
    pub attempts: u64,
    /// Packets handed to the connected peer
    pub delivered: u64,
    /// Packets written while no peer was connected
    pub dropped: u64,
    /// Attempts failed by fault injection
    pub faults: u64,
}

// ----------------------------------------------------------------------------
// Simulated Radio
// ----------------------------------------------------------------------------

/// In-process radio with a single virtual peer
pub struct SimulatedRadio {
    config: SimulatedRadioConfig,
    service: BtService,
    powered: AtomicBool,
    peer_connected: AtomicBool,
    attempts: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
    faults: AtomicU64,
    peer_tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl SimulatedRadio {
    /// Create a radio and the receiving end of its peer channel
    pub fn new(
        config: SimulatedRadioConfig,
    ) -> Result<(Arc<Self>, mpsc::UnboundedReceiver<Vec<u8>>), BleTransportError> {
        config.validate()?;
        let (peer_tx, peer_rx) = mpsc::unbounded_channel();

        let radio = Arc::new(Self {
            service: BtService::new(config.powered),
            powered: AtomicBool::new(config.powered),
            peer_connected: AtomicBool::new(false),
            attempts: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            faults: AtomicU64::new(0),
            peer_tx,
            config,
        });
        Ok((radio, peer_rx))
    }

    /// Status service fed by this radio
    pub fn service(&self) -> &BtService {
        &self.service
    }

    pub fn config(&self) -> &SimulatedRadioConfig {
        &self.config
    }

    /// Connect the virtual peer
    pub fn connect_peer(&self) {
        if !self.powered.load(Ordering::SeqCst) {
            warn!("Cannot connect peer: radio is off");
            return;
        }
        info!("Simulated peer connected");
        self.peer_connected.store(true, Ordering::SeqCst);
        self.service.notify(ConnectionStatus::Connected);
    }

    /// Disconnect the virtual peer
    pub fn disconnect_peer(&self) {
        if self.peer_connected.swap(false, Ordering::SeqCst) {
            info!("Simulated peer disconnected");
            self.service.notify(ConnectionStatus::Disconnected);
        }
    }

    /// Switch the radio on or off
    pub fn set_powered(&self, powered: bool) {
        self.powered.store(powered, Ordering::SeqCst);
        if powered {
            self.service.notify(ConnectionStatus::Advertising);
        } else {
            self.peer_connected.store(false, Ordering::SeqCst);
            self.service.notify(ConnectionStatus::Off);
        }
    }

    pub fn is_peer_connected(&self) -> bool {
        self.peer_connected.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> RadioStats {
        RadioStats {
            attempts: self.attempts.load(Ordering::SeqCst),
            delivered: self.delivered.load(Ordering::SeqCst),
            dropped: self.dropped.load(Ordering::SeqCst),
            faults: self.faults.load(Ordering::SeqCst),
        }
    }

    fn injected_fault(&self, attempt: u64, len: usize) -> Option<i32> {
        let every = |n: Option<u32>| n.is_some_and(|n| attempt % u64::from(n) == 0);

        if every(self.config.fail_every) {
            return Some(-1);
        }
        if every(self.config.short_write_every) && len > 0 {
            return Some(len as i32 - 1);
        }
        None
    }

    /// Drop the peer from a separate thread, as a radio stack would
    fn schedule_disconnect(&self) {
        if !self.peer_connected.swap(false, Ordering::SeqCst) {
            return;
        }
        let service = self.service.clone();
        let spawned = thread::Builder::new()
            .name("radio-events".to_string())
            .spawn(move || {
                info!("Simulated peer dropped the connection");
                service.notify(ConnectionStatus::Disconnected);
            });
        if let Err(e) = spawned {
            error!("Failed to deliver disconnect event: {}", e);
        }
    }
}

impl RadioHal for SimulatedRadio {
    fn is_active(&self) -> bool {
        self.powered.load(Ordering::SeqCst)
    }

    fn max_packet_size(&self) -> u16 {
        self.config.max_packet_size
    }

    fn serial_tx(&self, data: &[u8]) -> i32 {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(written) = self.injected_fault(attempt, data.len()) {
            self.faults.fetch_add(1, Ordering::SeqCst);
            debug!("Injected fault on write {}: {} bytes", attempt, written);
            return written;
        }

        if !self.peer_connected.load(Ordering::SeqCst) {
            self.dropped.fetch_add(1, Ordering::SeqCst);
            trace!("No peer, dropped {}", hex::encode(data));
            return data.len() as i32;
        }

        trace!("TX {}", hex::encode(data));
        if self.peer_tx.send(data.to_vec()).is_err() {
            debug!("Peer channel closed, packet discarded");
        }
        let delivered = self.delivered.fetch_add(1, Ordering::SeqCst) + 1;

        if self.config.disconnect_after == Some(delivered) {
            self.schedule_disconnect();
        }
        data.len() as i32
    }
}
