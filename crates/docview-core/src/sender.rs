//! Chunked sender
//!
//! Streams one file over the transport: a START frame, the file bytes cut
//! into radio packets, then an END frame. Each data packet gets a bounded
//! number of attempts; a packet that exhausts them aborts the transfer.
//! Packets go out in file order with one in flight at a time.

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use tracing::{debug, error, warn};

use crate::config::TransferConfig;
use crate::errors::{FrameError, Result, TransferError};
use crate::file::read_full;
use crate::protocol::{encode_start, ControlFrame};
use crate::transport::Transport;

// ----------------------------------------------------------------------------
// Cancellation
// ----------------------------------------------------------------------------

/// Cooperative cancellation signal, polled at every packet boundary
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

// ----------------------------------------------------------------------------
// Progress Observer
// ----------------------------------------------------------------------------

/// Hooks the sender calls as the stream advances
///
/// Returning an error from a hook aborts the transfer with that error.
pub trait SendObserver {
    /// The START frame was accepted by the link
    fn on_start_sent(&mut self) -> Result<()> {
        Ok(())
    }

    /// One data packet of `len` bytes was accepted by the link
    fn on_chunk_sent(&mut self, _len: usize) -> Result<()> {
        Ok(())
    }
}

impl SendObserver for () {}

/// Totals of a completed send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SendSummary {
    pub bytes_sent: u64,
    pub chunks_sent: u32,
}

// ----------------------------------------------------------------------------
// Chunked Sender
// ----------------------------------------------------------------------------

/// Sends one file as START, data packets, END
pub struct ChunkedSender<'a, T: Transport + ?Sized> {
    transport: &'a T,
    config: &'a TransferConfig,
    cancel: &'a CancelFlag,
}

impl<'a, T: Transport + ?Sized> ChunkedSender<'a, T> {
    pub fn new(transport: &'a T, config: &'a TransferConfig, cancel: &'a CancelFlag) -> Self {
        Self {
            transport,
            config,
            cancel,
        }
    }

    /// Stream `file_size` bytes from `source` to the peer
    pub fn send_file(
        &self,
        source: &mut dyn Read,
        file_size: u32,
        file_name: &str,
        observer: &mut dyn SendObserver,
    ) -> Result<SendSummary> {
        let max_packet_size = self.transport.max_packet_size() as usize;
        if max_packet_size == 0 {
            return Err(FrameError::PacketTooSmall { max_packet_size }.into());
        }

        self.check_cancelled()?;
        let start = encode_start(file_size, file_name, max_packet_size)?;
        self.transport.send(&start).map_err(|e| {
            error!("Failed to send START frame: {}", e);
            TransferError::from(e)
        })?;
        debug!("START frame sent: {} ({} bytes)", file_name, file_size);
        observer.on_start_sent()?;

        let summary = self.send_body(source, u64::from(file_size), max_packet_size, observer)?;

        self.check_cancelled()?;
        let end = ControlFrame::End.encode(max_packet_size)?;
        self.transport.send(&end).map_err(|e| {
            error!("Failed to send END frame: {}", e);
            TransferError::from(e)
        })?;
        debug!(
            "END frame sent after {} bytes in {} packets",
            summary.bytes_sent, summary.chunks_sent
        );

        Ok(summary)
    }

    fn send_body(
        &self,
        source: &mut dyn Read,
        file_size: u64,
        max_packet_size: usize,
        observer: &mut dyn SendObserver,
    ) -> Result<SendSummary> {
        // Whole packets per read so only the final packet can be short
        let read_size = (self.config.read_buffer_size / max_packet_size).max(1) * max_packet_size;
        let mut buffer = vec![0u8; read_size];
        let mut summary = SendSummary::default();

        while summary.bytes_sent < file_size {
            let want = read_size.min((file_size - summary.bytes_sent) as usize);
            let read = read_full(source, &mut buffer[..want])?;
            if read == 0 {
                warn!(
                    "File ended before declared size: {} / {}",
                    summary.bytes_sent, file_size
                );
                return Err(TransferError::unexpected_eof(summary.bytes_sent, file_size));
            }

            for packet in buffer[..read].chunks(max_packet_size) {
                self.check_cancelled()?;
                self.send_with_retry(packet)?;

                summary.bytes_sent += packet.len() as u64;
                summary.chunks_sent += 1;
                observer.on_chunk_sent(packet.len())?;

                if !self.config.packet_delay().is_zero() {
                    thread::sleep(self.config.packet_delay());
                }
            }
        }

        Ok(summary)
    }

    /// Send one data packet, retrying transient failures
    fn send_with_retry(&self, packet: &[u8]) -> Result<()> {
        let attempts = self.config.send_attempts.max(1);
        let mut attempt = 0u8;

        loop {
            attempt += 1;
            match self.transport.send(packet) {
                Ok(()) => return Ok(()),
                Err(e) if e.is_transient() && attempt < attempts => {
                    warn!("Chunk send failed, attempt {}/{}: {}", attempt, attempts, e);
                    if !self.config.retry_delay().is_zero() {
                        thread::sleep(self.config.retry_delay());
                    }
                    self.check_cancelled()?;
                }
                Err(e) if e.is_transient() => {
                    error!("Failed to send chunk after {} attempts: {}", attempt, e);
                    return Err(TransferError::SendFailed {
                        attempts: attempt,
                        source: e,
                    });
                }
                Err(e) => {
                    error!("Chunk send aborted: {}", e);
                    return Err(e.into());
                }
            }
        }
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            debug!("Transfer stopped by cancellation request");
            return Err(TransferError::Cancelled);
        }
        Ok(())
    }
}
