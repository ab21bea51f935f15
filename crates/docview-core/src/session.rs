//! Transfer session data model
//!
//! One `TransferSession` lives for the whole application; its content is
//! reset at the start of every transfer. All mutation happens under the
//! controller's session lock.

use crate::protocol::{total_chunks, StateTransitionError, TransferEvent, TransferStatus};
use crate::types::{FileName, TransferSnapshot};

/// Mutable state of the current (or last) transfer attempt
#[derive(Debug, Clone, Default)]
pub struct TransferSession {
    /// Session number, bumped on every start
    pub generation: u64,
    pub status: TransferStatus,
    /// Path of the source file in the file store
    pub file_path: String,
    pub file_name: FileName,
    /// Fixed at start
    pub file_size: u64,
    pub bytes_sent: u64,
    pub chunks_sent: u32,
    /// `ceil(file_size / packet size)`, fixed at start
    pub total_chunks: u32,
    /// True from a successful start until teardown completes
    pub active: bool,
    /// Last connection state reported by the status source
    pub peer_connected: bool,
    /// Why the session failed, cleared on every start
    pub failure: Option<String>,
}

impl TransferSession {
    /// Create an empty, idle session
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the previous attempt and load a new file
    pub fn begin(&mut self, file_path: &str, file_size: u64, chunk_size: usize) {
        self.generation += 1;
        self.status = TransferStatus::Idle;
        self.file_path = file_path.to_string();
        self.file_name = FileName::from_path(file_path);
        self.file_size = file_size;
        self.bytes_sent = 0;
        self.chunks_sent = 0;
        self.total_chunks = total_chunks(file_size, chunk_size);
        self.failure = None;
    }

    /// Apply a state machine event to the status
    pub fn apply(&mut self, event: TransferEvent) -> Result<TransferStatus, StateTransitionError> {
        let next = self.status.transition(event)?;
        self.status = next;
        Ok(next)
    }

    /// Count one data packet that the link accepted
    pub fn record_chunk(&mut self, len: usize) {
        self.bytes_sent = (self.bytes_sent + len as u64).min(self.file_size);
        self.chunks_sent = self.chunks_sent.saturating_add(1);
    }

    /// Copy out the fields reporters see
    pub fn snapshot(&self) -> TransferSnapshot {
        TransferSnapshot {
            generation: self.generation,
            status: self.status,
            file_name: self.file_name.clone(),
            bytes_sent: self.bytes_sent,
            file_size: self.file_size,
            chunks_sent: self.chunks_sent,
            total_chunks: self.total_chunks,
            failure: self.failure.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_resets_counters() {
        let mut session = TransferSession::new();
        session.begin("/ext/docs/first.txt", 45, 20);
        session.record_chunk(20);
        session.status = TransferStatus::Failed;
        session.failure = Some("Peer disconnected".to_string());

        session.begin("/ext/docs/second.txt", 10, 20);
        assert_eq!(session.generation, 2);
        assert_eq!(session.status, TransferStatus::Idle);
        assert_eq!(session.file_name.as_str(), "second.txt");
        assert_eq!(session.bytes_sent, 0);
        assert_eq!(session.chunks_sent, 0);
        assert_eq!(session.total_chunks, 1);
        assert!(session.failure.is_none());
    }

    #[test]
    fn test_bytes_never_exceed_file_size() {
        let mut session = TransferSession::new();
        session.begin("a", 5, 20);
        session.record_chunk(20);
        assert_eq!(session.bytes_sent, 5);
    }

    #[test]
    fn test_apply_rejects_invalid_event() {
        let mut session = TransferSession::new();
        assert!(session.apply(TransferEvent::WorkerSucceeded).is_err());
        assert_eq!(session.status, TransferStatus::Idle);

        assert_eq!(
            session.apply(TransferEvent::StartRequested),
            Ok(TransferStatus::Advertising)
        );
        assert_eq!(session.snapshot().status, TransferStatus::Advertising);
    }
}
