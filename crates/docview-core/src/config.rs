//! Transfer configuration
//!
//! Tuning constants for the chunked sender and the session controller. The
//! defaults match the reference device: 512 byte file reads, three send
//! attempts per packet, 10ms between attempts, 5ms between packets and a
//! 30 second overall window.

use core::time::Duration;

use crate::errors::ConfigError;

// ----------------------------------------------------------------------------
// Defaults
// ----------------------------------------------------------------------------

/// Default size of one file read, sub-chunked into radio packets
pub const DEFAULT_READ_BUFFER_SIZE: usize = 512;

/// Default number of send attempts per radio packet
pub const DEFAULT_SEND_ATTEMPTS: u8 = 3;

/// Default overall transfer window in milliseconds
pub const DEFAULT_TRANSFER_TIMEOUT_MS: u64 = 30_000;

// ----------------------------------------------------------------------------
// Transfer Configuration
// ----------------------------------------------------------------------------

/// Configuration for a transfer controller and its worker
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Bytes read from the file per read call
    pub read_buffer_size: usize,
    /// Attempts per radio packet before the chunk is declared failed
    pub send_attempts: u8,
    /// Delay between attempts for the same packet
    pub retry_delay_ms: u64,
    /// Fixed delay between successive radio packets
    pub packet_delay_ms: u64,
    /// Overall window from start to completion
    pub transfer_timeout_ms: u64,
    /// Report progress every N data packets
    pub progress_interval: u32,
    /// How often a worker waiting for a connection re-checks cancellation
    pub connect_poll_ms: u64,
    /// Stack size of the worker thread
    pub worker_stack_size: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            send_attempts: DEFAULT_SEND_ATTEMPTS,
            retry_delay_ms: 10,
            packet_delay_ms: 5,
            transfer_timeout_ms: DEFAULT_TRANSFER_TIMEOUT_MS,
            progress_interval: 1,
            connect_poll_ms: 50,
            worker_stack_size: 64 * 1024,
        }
    }
}

impl TransferConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration with all delays removed, for tests and simulations
    pub fn immediate() -> Self {
        Self {
            retry_delay_ms: 0,
            packet_delay_ms: 0,
            connect_poll_ms: 5,
            ..Self::default()
        }
    }

    /// Set the file read size
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// Set the number of send attempts per packet
    pub fn with_send_attempts(mut self, attempts: u8) -> Self {
        self.send_attempts = attempts;
        self
    }

    /// Set the delay between attempts
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Set the delay between packets
    pub fn with_packet_delay(mut self, delay: Duration) -> Self {
        self.packet_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Set the overall transfer timeout
    pub fn with_transfer_timeout(mut self, timeout: Duration) -> Self {
        self.transfer_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the progress reporting interval in packets
    pub fn with_progress_interval(mut self, interval: u32) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn packet_delay(&self) -> Duration {
        Duration::from_millis(self.packet_delay_ms)
    }

    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_millis(self.transfer_timeout_ms)
    }

    pub fn connect_poll(&self) -> Duration {
        Duration::from_millis(self.connect_poll_ms)
    }

    /// Check that every value is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.read_buffer_size == 0 {
            return Err(ConfigError::Zero {
                field: "read_buffer_size",
            });
        }
        if self.send_attempts == 0 {
            return Err(ConfigError::Zero {
                field: "send_attempts",
            });
        }
        if self.transfer_timeout_ms == 0 {
            return Err(ConfigError::Zero {
                field: "transfer_timeout_ms",
            });
        }
        if self.progress_interval == 0 {
            return Err(ConfigError::Zero {
                field: "progress_interval",
            });
        }
        if self.connect_poll_ms == 0 {
            return Err(ConfigError::Zero {
                field: "connect_poll_ms",
            });
        }
        if self.worker_stack_size < 16 * 1024 {
            return Err(ConfigError::OutOfRange {
                field: "worker_stack_size",
                value: self.worker_stack_size as u64,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = TransferConfig::default();
        assert_eq!(config.send_attempts, 3);
        assert_eq!(config.read_buffer_size, 512);
        assert_eq!(config.transfer_timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
        assert!(TransferConfig::immediate().validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = TransferConfig::new()
            .with_send_attempts(5)
            .with_packet_delay(Duration::from_millis(8))
            .with_transfer_timeout(Duration::from_secs(2));
        assert_eq!(config.send_attempts, 5);
        assert_eq!(config.packet_delay(), Duration::from_millis(8));
        assert_eq!(config.transfer_timeout_ms, 2000);
    }

    #[test]
    fn test_validation_rejects_zero() {
        let config = TransferConfig::new().with_send_attempts(0);
        assert_eq!(
            config.validate(),
            Err(ConfigError::Zero {
                field: "send_attempts"
            })
        );

        let config = TransferConfig::new().with_read_buffer_size(0);
        assert!(config.validate().is_err());
    }
}
