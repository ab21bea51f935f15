//! Transfer State Machine
//!
//! Pure transition table for the lifecycle of one transfer session. The
//! controller applies events to the session's status under the session lock;
//! anything this table rejects leaves the status untouched.

use core::fmt;

use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// States and Events
// ----------------------------------------------------------------------------

/// Lifecycle state of a transfer session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TransferStatus {
    /// Nothing in progress
    #[default]
    Idle,
    /// Link is up, waiting for a peer to connect
    Advertising,
    /// Peer connected, START frame not yet sent
    Connected,
    /// START frame accepted, data flowing
    Transferring,
    /// All bytes and the END frame were sent
    Complete,
    /// The session ended with an error
    Failed,
}

impl TransferStatus {
    /// Get state name for logging
    pub fn state_name(&self) -> &'static str {
        match self {
            TransferStatus::Idle => "Idle",
            TransferStatus::Advertising => "Advertising",
            TransferStatus::Connected => "Connected",
            TransferStatus::Transferring => "Transferring",
            TransferStatus::Complete => "Complete",
            TransferStatus::Failed => "Failed",
        }
    }

    /// Complete and Failed end a session instance
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferStatus::Complete | TransferStatus::Failed)
    }

    /// States in which a session holds a worker and a timer
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            TransferStatus::Advertising | TransferStatus::Connected | TransferStatus::Transferring
        )
    }

    /// Process an event and compute the next state
    pub fn transition(self, event: TransferEvent) -> Result<TransferStatus, StateTransitionError> {
        use TransferEvent as E;
        use TransferStatus as S;

        let next = match (self, event) {
            (S::Idle, E::StartRequested) => S::Advertising,
            (S::Idle, E::LinkInitFailed) => S::Failed,
            (S::Advertising, E::PeerConnected) => S::Connected,
            (S::Connected, E::StartFrameSent) => S::Transferring,
            (S::Transferring, E::WorkerSucceeded) => S::Complete,
            (s, E::WorkerFailed) if s.is_in_progress() => S::Failed,
            (s, E::Disconnected) if s.is_in_progress() => S::Failed,
            (s, E::TimedOut) if s.is_in_progress() => S::Failed,
            (s, E::UserCancelled) if !s.is_terminal() => S::Idle,
            (from, event) => return Err(StateTransitionError { from, event }),
        };

        Ok(next)
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.state_name())
    }
}

/// Events that drive the transfer state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferEvent {
    /// User asked to send a file and the link initialized
    StartRequested,
    /// User asked to send a file but the link could not be initialized
    LinkInitFailed,
    /// Connection-status source reported a connected peer
    PeerConnected,
    /// Worker sent the START frame
    StartFrameSent,
    /// Worker sent every byte and the END frame
    WorkerSucceeded,
    /// Worker gave up
    WorkerFailed,
    /// Connection-status source reported a disconnect or radio off
    Disconnected,
    /// Timeout timer fired
    TimedOut,
    /// Explicit user cancellation
    UserCancelled,
}

// ----------------------------------------------------------------------------
// Errors
// ----------------------------------------------------------------------------

/// Event not accepted in the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("event {event:?} not allowed in state {from}")]
pub struct StateTransitionError {
    pub from: TransferStatus,
    pub event: TransferEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATES: [TransferStatus; 6] = [
        TransferStatus::Idle,
        TransferStatus::Advertising,
        TransferStatus::Connected,
        TransferStatus::Transferring,
        TransferStatus::Complete,
        TransferStatus::Failed,
    ];

    #[test]
    fn test_happy_path() {
        let status = TransferStatus::Idle
            .transition(TransferEvent::StartRequested)
            .and_then(|s| s.transition(TransferEvent::PeerConnected))
            .and_then(|s| s.transition(TransferEvent::StartFrameSent))
            .and_then(|s| s.transition(TransferEvent::WorkerSucceeded))
            .unwrap();
        assert_eq!(status, TransferStatus::Complete);
    }

    #[test]
    fn test_link_init_failure() {
        assert_eq!(
            TransferStatus::Idle.transition(TransferEvent::LinkInitFailed),
            Ok(TransferStatus::Failed)
        );
    }

    #[test]
    fn test_failed_start_frame_goes_to_failed() {
        assert_eq!(
            TransferStatus::Connected.transition(TransferEvent::WorkerFailed),
            Ok(TransferStatus::Failed)
        );
    }

    #[test]
    fn test_disconnect_and_timeout_fail_in_progress_states() {
        for state in ALL_STATES {
            for event in [TransferEvent::Disconnected, TransferEvent::TimedOut] {
                let result = state.transition(event);
                if state.is_in_progress() {
                    assert_eq!(result, Ok(TransferStatus::Failed), "{state} {event:?}");
                } else {
                    assert!(result.is_err(), "{state} {event:?}");
                }
            }
        }
    }

    #[test]
    fn test_user_cancel_returns_to_idle() {
        for state in ALL_STATES {
            let result = state.transition(TransferEvent::UserCancelled);
            if state.is_terminal() {
                assert!(result.is_err());
            } else {
                assert_eq!(result, Ok(TransferStatus::Idle));
            }
        }
    }

    #[test]
    fn test_terminal_states_reject_progress_events() {
        for state in [TransferStatus::Complete, TransferStatus::Failed] {
            for event in [
                TransferEvent::StartRequested,
                TransferEvent::PeerConnected,
                TransferEvent::StartFrameSent,
                TransferEvent::WorkerSucceeded,
                TransferEvent::WorkerFailed,
            ] {
                let err = state.transition(event).unwrap_err();
                assert_eq!(err.from, state);
                assert_eq!(err.event, event);
            }
        }
    }

    #[test]
    fn test_no_skipping_connected() {
        assert!(TransferStatus::Advertising
            .transition(TransferEvent::StartFrameSent)
            .is_err());
        assert!(TransferStatus::Advertising
            .transition(TransferEvent::WorkerSucceeded)
            .is_err());
        assert!(TransferStatus::Connected
            .transition(TransferEvent::PeerConnected)
            .is_err());
    }
}
