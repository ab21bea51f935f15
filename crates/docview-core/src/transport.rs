//! Transport abstraction for the radio link
//!
//! The transfer subsystem only needs three things from the radio: whether the
//! link is up, how large one packet may be, and a send primitive for a single
//! packet. Connection changes arrive separately through a
//! `ConnectionStatusSource` subscription.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::TransportError;

// ----------------------------------------------------------------------------
// Transport Trait
// ----------------------------------------------------------------------------

/// Fixed-size packet send over the radio link
///
/// Implementations keep no transfer state and never retry; the chunked sender
/// owns the retry policy.
pub trait Transport: Send + Sync {
    /// True when the radio subsystem is powered and operational
    fn is_link_active(&self) -> bool;

    /// Capacity of one radio packet
    fn max_packet_size(&self) -> u16;

    /// Transmit exactly `packet.len()` bytes as one radio packet
    ///
    /// Fails with `LinkInactive` without attempting a send when the link is down.
    fn send(&self, packet: &[u8]) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn is_link_active(&self) -> bool {
        (**self).is_link_active()
    }

    fn max_packet_size(&self) -> u16 {
        (**self).max_packet_size()
    }

    fn send(&self, packet: &[u8]) -> Result<(), TransportError> {
        (**self).send(packet)
    }
}

// ----------------------------------------------------------------------------
// Connection Status
// ----------------------------------------------------------------------------

/// Connection events delivered by the radio stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionStatus {
    /// Radio is up and advertising, no peer connected
    Advertising,
    /// A peer is connected
    Connected,
    /// The peer went away
    Disconnected,
    /// The radio was switched off
    Off,
}

impl ConnectionStatus {
    /// Disconnected and Off both end any connection
    pub fn is_link_lost(&self) -> bool {
        matches!(self, ConnectionStatus::Disconnected | ConnectionStatus::Off)
    }
}

/// Callback invoked on every connection status change
pub type StatusCallback = Arc<dyn Fn(ConnectionStatus) + Send + Sync>;

/// Asynchronous source of connection status events with one subscriber
pub trait ConnectionStatusSource: Send + Sync {
    /// Register `callback`, replacing any previous subscriber
    ///
    /// The callback may run on the radio stack's own thread. Releasing the
    /// returned subscription unregisters it.
    fn subscribe(&self, callback: StatusCallback) -> StatusSubscription;
}

impl<T: ConnectionStatusSource + ?Sized> ConnectionStatusSource for Arc<T> {
    fn subscribe(&self, callback: StatusCallback) -> StatusSubscription {
        (**self).subscribe(callback)
    }
}

// ----------------------------------------------------------------------------
// Subscription Handle
// ----------------------------------------------------------------------------

/// Capability returned by `subscribe`; unsubscribes on release or drop
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct StatusSubscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl StatusSubscription {
    /// Create a subscription that runs `release` once when released
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Unsubscribe now
    pub fn release(mut self) {
        self.run_release();
    }

    fn run_release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for StatusSubscription {
    fn drop(&mut self) {
        self.run_release();
    }
}

impl fmt::Debug for StatusSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusSubscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_subscription_releases_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let subscription = StatusSubscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        subscription.release();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscription_releases_on_drop() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        {
            let _subscription = StatusSubscription::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_link_lost() {
        assert!(ConnectionStatus::Disconnected.is_link_lost());
        assert!(ConnectionStatus::Off.is_link_lost());
        assert!(!ConnectionStatus::Connected.is_link_lost());
        assert!(!ConnectionStatus::Advertising.is_link_lost());
    }
}
