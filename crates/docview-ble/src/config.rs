//! Simulated radio configuration

use docview_core::protocol::{DEFAULT_MAX_PACKET_SIZE, START_HEADER_LEN};

use crate::error::BleTransportError;

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

/// Configuration for the simulated radio
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SimulatedRadioConfig {
    /// Bytes per radio packet (BLE serial profile default)
    pub max_packet_size: u16,
    /// Fail every Nth write attempt outright
    pub fail_every: Option<u32>,
    /// Accept only part of every Nth write attempt
    pub short_write_every: Option<u32>,
    /// Drop the peer connection after this many delivered packets
    pub disconnect_after: Option<u64>,
    /// Whether the radio starts powered
    pub powered: bool,
}

impl Default for SimulatedRadioConfig {
    fn default() -> Self {
        Self {
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
            fail_every: None,
            short_write_every: None,
            disconnect_after: None,
            powered: true,
        }
    }
}

impl SimulatedRadioConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum packet size
    pub fn with_max_packet_size(mut self, size: u16) -> Self {
        self.max_packet_size = size;
        self
    }

    /// Fail every `n`th write attempt
    pub fn with_fail_every(mut self, n: u32) -> Self {
        self.fail_every = Some(n);
        self
    }

    /// Short-write every `n`th write attempt
    pub fn with_short_write_every(mut self, n: u32) -> Self {
        self.short_write_every = Some(n);
        self
    }

    /// Disconnect the peer after `packets` delivered packets
    pub fn with_disconnect_after(mut self, packets: u64) -> Self {
        self.disconnect_after = Some(packets);
        self
    }

    /// Start powered or off
    pub fn with_powered(mut self, powered: bool) -> Self {
        self.powered = powered;
        self
    }

    /// A packet must at least hold a START frame with an empty name
    pub fn validate(&self) -> Result<(), BleTransportError> {
        if (self.max_packet_size as usize) < START_HEADER_LEN {
            return Err(BleTransportError::InvalidConfiguration(format!(
                "max_packet_size {} cannot hold a START frame",
                self.max_packet_size
            )));
        }
        if self.fail_every == Some(0) || self.short_write_every == Some(0) {
            return Err(BleTransportError::InvalidConfiguration(
                "fault injection interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = SimulatedRadioConfig::default();
        assert_eq!(config.max_packet_size, 20);
        assert!(config.powered);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_tiny_packets() {
        assert!(SimulatedRadioConfig::new()
            .with_max_packet_size(4)
            .validate()
            .is_err());
        assert!(SimulatedRadioConfig::new()
            .with_max_packet_size(5)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_rejects_zero_interval() {
        assert!(SimulatedRadioConfig::new()
            .with_fail_every(0)
            .validate()
            .is_err());
    }
}
