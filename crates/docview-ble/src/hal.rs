//! Raw radio interface
//!
//! The thin layer a BLE stack exposes for serial-profile data: power state,
//! packet capacity and a write that reports how many bytes went out.

use std::sync::Arc;

/// Serial-profile access to a BLE radio
pub trait RadioHal: Send + Sync {
    /// True when the radio is powered and the serial profile is up
    fn is_active(&self) -> bool;

    /// Bytes per radio packet
    fn max_packet_size(&self) -> u16;

    /// Write one packet, returning the number of bytes accepted or a negative
    /// value when the write failed outright
    fn serial_tx(&self, data: &[u8]) -> i32;
}

impl<T: RadioHal + ?Sized> RadioHal for Arc<T> {
    fn is_active(&self) -> bool {
        (**self).is_active()
    }

    fn max_packet_size(&self) -> u16 {
        (**self).max_packet_size()
    }

    fn serial_tx(&self, data: &[u8]) -> i32 {
        (**self).serial_tx(data)
    }
}
