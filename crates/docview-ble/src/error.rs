//! Error types for the BLE transport

use docview_core::TransportError;
use thiserror::Error;

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Errors specific to the BLE transport
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BleTransportError {
    #[error("Radio is powered off")]
    RadioOff,

    #[error("Packet too large: {size} bytes (max: {max_size})")]
    PacketTooLarge { size: usize, max_size: usize },

    #[error("Serial write accepted {written} of {expected} bytes")]
    ShortWrite { written: i32, expected: usize },

    #[error("Invalid radio configuration: {0}")]
    InvalidConfiguration(String),
}

impl From<BleTransportError> for TransportError {
    fn from(err: BleTransportError) -> Self {
        match err {
            BleTransportError::RadioOff | BleTransportError::InvalidConfiguration(_) => {
                TransportError::LinkInactive
            }
            BleTransportError::PacketTooLarge { size, max_size } => {
                TransportError::PacketTooLarge { size, max_size }
            }
            BleTransportError::ShortWrite { written, expected } => TransportError::ShortWrite {
                sent: written,
                expected,
            },
        }
    }
}

impl From<TransportError> for BleTransportError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::LinkInactive => BleTransportError::RadioOff,
            TransportError::PacketTooLarge { size, max_size } => {
                BleTransportError::PacketTooLarge { size, max_size }
            }
            TransportError::ShortWrite { sent, expected } => BleTransportError::ShortWrite {
                written: sent,
                expected,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_write_stays_transient() {
        let err: TransportError = BleTransportError::ShortWrite {
            written: -1,
            expected: 20,
        }
        .into();
        assert!(err.is_transient());
    }

    #[test]
    fn test_radio_off_maps_to_link_inactive() {
        assert_eq!(
            TransportError::from(BleTransportError::RadioOff),
            TransportError::LinkInactive
        );
    }
}
