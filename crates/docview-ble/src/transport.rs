//! BLE Transport Adapter
//!
//! Wraps a `RadioHal` into the core `Transport` trait. Keeps no transfer
//! state and never retries; the chunked sender owns retries.

use docview_core::protocol::check_packet_size;
use docview_core::{Transport, TransportError};
use tracing::{debug, info, trace, warn};

use crate::error::BleTransportError;
use crate::hal::RadioHal;

// ----------------------------------------------------------------------------
// BLE Transport
// ----------------------------------------------------------------------------

/// Packet transport over a BLE serial profile
pub struct BleTransport<H: RadioHal + ?Sized> {
    hal: H,
}

impl<H: RadioHal> BleTransport<H> {
    /// Create a transport over `hal`
    pub fn new(hal: H) -> Self {
        Self { hal }
    }
}

impl<H: RadioHal + ?Sized> BleTransport<H> {
    /// Check that the radio is ready to carry a transfer
    pub fn init(&self) -> Result<(), BleTransportError> {
        if !self.hal.is_active() {
            warn!("BLE radio is not active");
            return Err(BleTransportError::RadioOff);
        }
        info!(
            "BLE transport ready, packet size {} bytes",
            self.hal.max_packet_size()
        );
        Ok(())
    }

    /// Underlying radio
    pub fn hal(&self) -> &H {
        &self.hal
    }

    fn write(&self, packet: &[u8]) -> Result<(), BleTransportError> {
        if !self.hal.is_active() {
            debug!("Dropping {} byte packet: radio inactive", packet.len());
            return Err(BleTransportError::RadioOff);
        }
        check_packet_size(packet.len(), self.hal.max_packet_size() as usize)?;

        let written = self.hal.serial_tx(packet);
        if written < 0 || written as usize != packet.len() {
            debug!(
                "Serial write accepted {} of {} bytes",
                written,
                packet.len()
            );
            return Err(BleTransportError::ShortWrite {
                written,
                expected: packet.len(),
            });
        }

        trace!("Sent {} byte packet", packet.len());
        Ok(())
    }
}

impl<H: RadioHal + ?Sized> Transport for BleTransport<H> {
    fn is_link_active(&self) -> bool {
        self.hal.is_active()
    }

    fn max_packet_size(&self) -> u16 {
        self.hal.max_packet_size()
    }

    fn send(&self, packet: &[u8]) -> Result<(), TransportError> {
        self.write(packet).map_err(TransportError::from)
    }
}
