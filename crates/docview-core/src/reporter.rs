//! Status reporters
//!
//! The controller pushes a `TransferSnapshot` on every state transition and
//! progress milestone. Reporters run while the session lock is held, so they
//! must return quickly and must not call back into the controller.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::protocol::TransferStatus;
use crate::types::TransferSnapshot;

// ----------------------------------------------------------------------------
// Reporter Trait
// ----------------------------------------------------------------------------

/// Receives session snapshots
pub trait StatusReporter: Send + Sync {
    fn report(&self, snapshot: &TransferSnapshot);
}

impl<F> StatusReporter for F
where
    F: Fn(&TransferSnapshot) + Send + Sync,
{
    fn report(&self, snapshot: &TransferSnapshot) {
        self(snapshot)
    }
}

// ----------------------------------------------------------------------------
// Channel Reporter
// ----------------------------------------------------------------------------

/// Forwards snapshots into an unbounded tokio channel
///
/// Sending never blocks, so this is safe to call from the worker and from the
/// radio stack's callback thread.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    tx: mpsc::UnboundedSender<TransferSnapshot>,
}

impl ChannelReporter {
    /// Create a reporter and the receiving end of its channel
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TransferSnapshot>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn new(tx: mpsc::UnboundedSender<TransferSnapshot>) -> Self {
        Self { tx }
    }
}

impl StatusReporter for ChannelReporter {
    fn report(&self, snapshot: &TransferSnapshot) {
        if self.tx.send(snapshot.clone()).is_err() {
            debug!("Status channel closed, dropping snapshot");
        }
    }
}

// ----------------------------------------------------------------------------
// Log Reporter
// ----------------------------------------------------------------------------

/// Renders snapshots as log lines
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl StatusReporter for LogReporter {
    fn report(&self, snapshot: &TransferSnapshot) {
        let line = snapshot.status_line().replace('\n', " | ");
        match snapshot.status {
            TransferStatus::Failed => warn!("[{}] {}", snapshot.status_header(), line),
            TransferStatus::Transferring => debug!("[{}] {}", snapshot.status_header(), line),
            _ => info!("[{}] {}", snapshot.status_header(), line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_channel_reporter_forwards() {
        let (reporter, mut rx) = ChannelReporter::channel();
        let snapshot = TransferSnapshot {
            status: TransferStatus::Advertising,
            ..Default::default()
        };
        reporter.report(&snapshot);
        assert_eq!(rx.try_recv().unwrap(), snapshot);
    }

    #[test]
    fn test_channel_reporter_tolerates_closed_channel() {
        let (reporter, rx) = ChannelReporter::channel();
        drop(rx);
        reporter.report(&TransferSnapshot::default());
    }

    #[test]
    fn test_closure_reporter() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reporter = move |s: &TransferSnapshot| sink.lock().push(s.status);
        reporter.report(&TransferSnapshot::default());
        assert_eq!(*seen.lock(), vec![TransferStatus::Idle]);
    }
}
