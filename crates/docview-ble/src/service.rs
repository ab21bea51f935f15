//! Connection-status service
//!
//! Single-subscriber hub between the radio stack and the transfer
//! controller. The stack reports power and peer changes through `notify`;
//! the subscriber gets them on whatever thread the stack used. A new
//! subscriber replaces the old one and immediately learns the current state.

use std::sync::Arc;

use docview_core::{ConnectionStatus, ConnectionStatusSource, StatusCallback, StatusSubscription};
use parking_lot::Mutex;
use tracing::debug;

#[derive(Default)]
struct ServiceState {
    subscriber: Option<(u64, StatusCallback)>,
    next_id: u64,
    powered: bool,
    peer_connected: bool,
}

impl ServiceState {
    fn status(&self) -> ConnectionStatus {
        if !self.powered {
            ConnectionStatus::Off
        } else if self.peer_connected {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Advertising
        }
    }
}

/// Radio connection-status hub
#[derive(Clone)]
pub struct BtService {
    state: Arc<Mutex<ServiceState>>,
}

impl BtService {
    /// Create a service for a radio that is `powered` with no peer
    pub fn new(powered: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(ServiceState {
                powered,
                ..Default::default()
            })),
        }
    }

    /// Status a new subscriber would be told
    pub fn current_status(&self) -> ConnectionStatus {
        self.state.lock().status()
    }

    pub fn is_peer_connected(&self) -> bool {
        self.state.lock().peer_connected
    }

    pub fn has_subscriber(&self) -> bool {
        self.state.lock().subscriber.is_some()
    }

    /// Record a status change from the radio stack and forward it
    ///
    /// The callback runs on the calling thread after the service lock is
    /// released.
    pub fn notify(&self, status: ConnectionStatus) {
        let callback = {
            let mut state = self.state.lock();
            match status {
                ConnectionStatus::Connected => {
                    state.powered = true;
                    state.peer_connected = true;
                }
                ConnectionStatus::Advertising => {
                    state.powered = true;
                    state.peer_connected = false;
                }
                ConnectionStatus::Disconnected => state.peer_connected = false,
                ConnectionStatus::Off => {
                    state.powered = false;
                    state.peer_connected = false;
                }
            }
            state.subscriber.as_ref().map(|(_, callback)| callback.clone())
        };

        debug!("Connection status: {:?}", status);
        if let Some(callback) = callback {
            callback(status);
        }
    }
}

impl ConnectionStatusSource for BtService {
    fn subscribe(&self, callback: StatusCallback) -> StatusSubscription {
        let (id, current) = {
            let mut state = self.state.lock();
            let id = state.next_id;
            state.next_id += 1;
            if state.subscriber.replace((id, callback.clone())).is_some() {
                debug!("Replacing connection status subscriber");
            }
            (id, state.status())
        };

        callback(current);

        let state = Arc::downgrade(&self.state);
        StatusSubscription::new(move || {
            if let Some(state) = state.upgrade() {
                let mut state = state.lock();
                if state
                    .subscriber
                    .as_ref()
                    .is_some_and(|(current, _)| *current == id)
                {
                    state.subscriber = None;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (StatusCallback, Arc<Mutex<Vec<ConnectionStatus>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: StatusCallback = Arc::new(move |s: ConnectionStatus| sink.lock().push(s));
        (callback, seen)
    }

    #[test]
    fn test_subscribe_reports_current_status() {
        let service = BtService::new(true);
        let (callback, seen) = recorder();
        let _sub = service.subscribe(callback);
        assert_eq!(*seen.lock(), vec![ConnectionStatus::Advertising]);

        let off = BtService::new(false);
        let (callback, seen) = recorder();
        let _sub = off.subscribe(callback);
        assert_eq!(*seen.lock(), vec![ConnectionStatus::Off]);
    }

    #[test]
    fn test_notify_tracks_peer() {
        let service = BtService::new(true);
        let (callback, seen) = recorder();
        let _sub = service.subscribe(callback);

        service.notify(ConnectionStatus::Connected);
        assert_eq!(service.current_status(), ConnectionStatus::Connected);
        service.notify(ConnectionStatus::Disconnected);
        assert_eq!(service.current_status(), ConnectionStatus::Advertising);

        assert_eq!(
            *seen.lock(),
            vec![
                ConnectionStatus::Advertising,
                ConnectionStatus::Connected,
                ConnectionStatus::Disconnected,
            ]
        );
    }

    #[test]
    fn test_release_keeps_newer_subscriber() {
        let service = BtService::new(true);
        let (first, _) = recorder();
        let (second, seen) = recorder();

        let old = service.subscribe(first);
        let _new = service.subscribe(second);
        old.release();

        assert!(service.has_subscriber());
        service.notify(ConnectionStatus::Off);
        assert_eq!(seen.lock().last(), Some(&ConnectionStatus::Off));
    }

    #[test]
    fn test_drop_unsubscribes() {
        let service = BtService::new(true);
        let (callback, _) = recorder();
        drop(service.subscribe(callback));
        assert!(!service.has_subscriber());
    }
}
