//! Transfer controller
//!
//! Owns the transfer session and coordinates the three contexts that touch
//! it: the UI thread (start/stop), one worker thread per transfer running the
//! chunked sender, and the connection-status callback of the radio stack. A
//! single-shot timer fails the session when the overall window expires.
//!
//! Lock order is `control` before `session`. The worker only ever takes the
//! session lock, and nobody joins a thread while holding either lock except
//! `start`, which reaps a worker that has already released its session.

use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, warn};

use crate::config::TransferConfig;
use crate::errors::{Result, TransferError};
use crate::file::FileStore;
use crate::protocol::{ControlFrame, TransferEvent, TransferStatus};
use crate::reporter::StatusReporter;
use crate::sender::{CancelFlag, ChunkedSender, SendObserver, SendSummary};
use crate::session::TransferSession;
use crate::timer::{TimeoutTimer, TimerHandle};
use crate::transport::{ConnectionStatus, ConnectionStatusSource, StatusSubscription, Transport};
use crate::types::TransferSnapshot;

// ----------------------------------------------------------------------------
// Controller
// ----------------------------------------------------------------------------

/// Drives transfers of one file at a time over a radio transport
pub struct TransferController {
    inner: Arc<Inner>,
    subscription: Mutex<Option<StatusSubscription>>,
}

struct Inner {
    transport: Arc<dyn Transport>,
    files: Arc<dyn FileStore>,
    reporter: Arc<dyn StatusReporter>,
    config: TransferConfig,
    session: Mutex<TransferSession>,
    /// Signalled on every status change and on release
    changed: Condvar,
    control: Mutex<WorkerControl>,
}

/// Handles owned by the current transfer
#[derive(Default)]
struct WorkerControl {
    generation: u64,
    cancel: Option<CancelFlag>,
    worker: Option<JoinHandle<()>>,
    /// Kept after the handle is taken so a teardown can tell it runs on the worker
    worker_thread: Option<ThreadId>,
    timer: Option<TimeoutTimer>,
}

impl TransferController {
    /// Create a controller and subscribe it to connection status changes
    pub fn new(
        transport: Arc<dyn Transport>,
        status_source: &dyn ConnectionStatusSource,
        files: Arc<dyn FileStore>,
        reporter: Arc<dyn StatusReporter>,
        config: TransferConfig,
    ) -> Result<Self> {
        config.validate()?;

        let inner = Arc::new(Inner {
            transport,
            files,
            reporter,
            config,
            session: Mutex::new(TransferSession::new()),
            changed: Condvar::new(),
            control: Mutex::new(WorkerControl::default()),
        });

        let weak: Weak<Inner> = Arc::downgrade(&inner);
        let subscription = status_source.subscribe(Arc::new(move |status: ConnectionStatus| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_link_status(status);
            }
        }));

        Ok(Self {
            inner,
            subscription: Mutex::new(Some(subscription)),
        })
    }

    /// Begin sending the file at `path`
    ///
    /// Returns once the session is initialized and the worker is running; the
    /// transfer itself proceeds in the background.
    pub fn start(&self, path: &str) -> Result<()> {
        if path.is_empty() {
            warn!("Cannot start transfer: no file selected");
            return Err(TransferError::NoFileSelected);
        }

        let inner = &self.inner;
        let mut control = inner.control.lock();

        if inner.session.lock().active {
            warn!("Transfer already active");
            return Err(TransferError::AlreadyActive);
        }

        if let Some(previous) = control.worker.take() {
            debug!("Reaping previous transfer worker");
            if previous.join().is_err() {
                error!("Previous transfer worker panicked");
            }
        }
        control.timer = None;
        control.cancel = None;

        let file_size = inner.files.file_size(path).map_err(|e| {
            error!("Failed to get file size for {}: {}", path, e);
            TransferError::FileRead(e)
        })?;
        if file_size > u64::from(u32::MAX) {
            error!("File too large for transfer: {} bytes", file_size);
            return Err(TransferError::FileTooLarge { size: file_size });
        }

        let mut session = inner.session.lock();
        session.begin(path, file_size, inner.max_packet_size());
        let generation = session.generation;
        control.generation = generation;

        info!(
            "Starting transfer: {}, size: {} bytes",
            session.file_name, session.file_size
        );

        if !inner.transport.is_link_active() {
            warn!("Cannot start transfer: radio link is not active");
            let err = TransferError::LinkInactive;
            inner.fail_locked(&mut session, TransferEvent::LinkInitFailed, &err);
            return Err(err);
        }

        inner.apply_locked(&mut session, TransferEvent::StartRequested);
        session.active = true;
        if session.peer_connected {
            inner.apply_locked(&mut session, TransferEvent::PeerConnected);
        }
        drop(session);

        let weak = Arc::downgrade(inner);
        let timer = TimeoutTimer::start(inner.config.transfer_timeout(), move || {
            if let Some(inner) = weak.upgrade() {
                inner.on_timeout(generation);
            }
        })
        .map_err(|e| TransferError::resource("timeout timer", e));
        let timer = match timer {
            Ok(timer) => timer,
            Err(e) => {
                inner.fail_start(generation, &e);
                return Err(e);
            }
        };

        let cancel = CancelFlag::new();
        let context = WorkerContext {
            generation,
            cancel: cancel.clone(),
            timer: timer.handle(),
        };
        let worker_inner = inner.clone();
        let spawned = thread::Builder::new()
            .name("docview-transfer".to_string())
            .stack_size(inner.config.worker_stack_size)
            .spawn(move || worker_inner.run_worker(context))
            .map_err(|e| TransferError::resource("transfer worker", e));

        match spawned {
            Ok(worker) => {
                control.worker_thread = Some(worker.thread().id());
                control.worker = Some(worker);
                control.timer = Some(timer);
                control.cancel = Some(cancel);
                Ok(())
            }
            Err(e) => {
                timer.cancel();
                inner.fail_start(generation, &e);
                Err(e)
            }
        }
    }

    /// Cancel the active transfer, if any, and return the session to Idle
    ///
    /// Blocks until the worker has observed the cancellation and exited, also
    /// when a disconnect or timeout is already tearing the session down.
    pub fn stop(&self) {
        let generation = {
            let mut session = self.inner.session.lock();
            if !session.active {
                debug!("Stop requested with no active transfer");
                return;
            }
            info!("Stopping transfer...");
            self.inner
                .apply_locked(&mut session, TransferEvent::UserCancelled);
            session.generation
        };

        self.inner.teardown(generation);
        info!("Transfer stopped");
    }

    /// Stop any transfer, reap the worker and unsubscribe from status events
    pub fn shutdown(&self) {
        self.stop();

        let worker = self.inner.control.lock().worker.take();
        if let Some(worker) = worker {
            if worker.join().is_err() {
                error!("Transfer worker panicked");
            }
        }

        if let Some(subscription) = self.subscription.lock().take() {
            subscription.release();
        }
    }

    /// Current lifecycle state
    pub fn status(&self) -> TransferStatus {
        self.inner.session.lock().status
    }

    /// Whether a transfer is running or still tearing down
    pub fn is_active(&self) -> bool {
        self.inner.session.lock().active
    }

    /// Copy of the session as reporters see it
    pub fn snapshot(&self) -> TransferSnapshot {
        self.inner.session.lock().snapshot()
    }

    pub fn config(&self) -> &TransferConfig {
        &self.inner.config
    }

    /// Block until the current session is no longer active
    ///
    /// Returns `None` if `timeout` passes first.
    pub fn wait_for_terminal(&self, timeout: Duration) -> Option<TransferSnapshot> {
        let deadline = Instant::now() + timeout;
        let mut session = self.inner.session.lock();
        while session.active {
            if self
                .inner
                .changed
                .wait_until(&mut session, deadline)
                .timed_out()
            {
                return None;
            }
        }
        Some(session.snapshot())
    }
}

impl Drop for TransferController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ----------------------------------------------------------------------------
// Shared Session Handling
// ----------------------------------------------------------------------------

impl Inner {
    fn max_packet_size(&self) -> usize {
        self.transport.max_packet_size() as usize
    }

    /// Apply `event` and notify reporters; false if the state machine refused it
    fn apply_locked(&self, session: &mut TransferSession, event: TransferEvent) -> bool {
        let from = session.status;
        match session.apply(event) {
            Ok(to) => {
                info!("Transfer status: {} -> {} ({:?})", from, to, event);
                self.reporter.report(&session.snapshot());
                self.changed.notify_all();
                true
            }
            Err(e) => {
                debug!("Ignoring status event: {}", e);
                false
            }
        }
    }

    /// Apply a failure event, recording `err` as the cause when accepted
    fn fail_locked(
        &self,
        session: &mut TransferSession,
        event: TransferEvent,
        err: &TransferError,
    ) -> bool {
        let previous = session.failure.replace(err.to_string());
        let applied = self.apply_locked(session, event);
        if !applied {
            session.failure = previous;
        }
        applied
    }

    /// Connection-status callback
    fn handle_link_status(&self, status: ConnectionStatus) {
        let mut session = self.session.lock();
        debug!("Link status changed: {:?}", status);

        match status {
            ConnectionStatus::Connected => {
                session.peer_connected = true;
                if session.active && session.status == TransferStatus::Advertising {
                    self.apply_locked(&mut session, TransferEvent::PeerConnected);
                }
            }
            ConnectionStatus::Advertising => {
                session.peer_connected = false;
                if session.active && session.status != TransferStatus::Advertising {
                    warn!("Link reverted to advertising during transfer");
                }
            }
            lost if lost.is_link_lost() => {
                session.peer_connected = false;
                if !session.active || !session.status.is_in_progress() {
                    return;
                }
                warn!("Link lost during transfer (status: {})", session.status);
                let generation = session.generation;
                if self.fail_locked(
                    &mut session,
                    TransferEvent::Disconnected,
                    &TransferError::Disconnected,
                ) {
                    drop(session);
                    self.teardown(generation);
                }
            }
            _ => {}
        }
    }

    /// Timer callback
    fn on_timeout(&self, generation: u64) {
        let mut session = self.session.lock();
        if session.generation != generation
            || !session.active
            || !session.status.is_in_progress()
        {
            return;
        }

        warn!(
            "Transfer timed out after {}ms (status: {})",
            self.config.transfer_timeout_ms, session.status
        );
        let err = TransferError::Timeout {
            duration_ms: self.config.transfer_timeout_ms,
        };
        if self.fail_locked(&mut session, TransferEvent::TimedOut, &err) {
            drop(session);
            self.teardown(generation);
        }
    }

    /// Failure before the worker ever ran
    fn fail_start(&self, generation: u64, err: &TransferError) {
        error!("Failed to start transfer: {}", err);
        {
            let mut session = self.session.lock();
            self.fail_locked(&mut session, TransferEvent::WorkerFailed, err);
        }
        self.release(generation);
    }

    /// Stop the worker and timer of `generation`, then release the session
    fn teardown(&self, generation: u64) {
        let (cancel, worker, timer) = {
            let mut control = self.control.lock();
            if control.generation != generation {
                return;
            }
            if control.cancel.is_none() {
                // A competing stop, timeout or disconnect owns the handles
                let on_worker = control.worker_thread == Some(thread::current().id());
                drop(control);
                if !on_worker {
                    self.wait_released(generation);
                }
                return;
            }
            (
                control.cancel.take(),
                control.worker.take(),
                control.timer.take(),
            )
        };

        if let Some(cancel) = cancel {
            cancel.cancel();
        }
        // Wake a worker still waiting for a connection
        self.changed.notify_all();

        if let Some(timer) = timer {
            timer.cancel();
        }

        if let Some(worker) = worker {
            if worker.thread().id() == thread::current().id() {
                // Status callback delivered on the worker itself; reaped by the next start
                self.control.lock().worker.get_or_insert(worker);
            } else if worker.join().is_err() {
                error!("Transfer worker panicked");
            }
        }

        self.release(generation);
    }

    /// Block until `generation` is no longer the active session
    fn wait_released(&self, generation: u64) {
        let mut session = self.session.lock();
        while session.generation == generation && session.active {
            self.changed.wait(&mut session);
        }
    }

    /// Mark the session inactive, telling the peer to drop partial data
    fn release(&self, generation: u64) {
        let send_error = {
            let session = self.session.lock();
            if session.generation != generation || !session.active {
                return;
            }
            session.status != TransferStatus::Complete
        };

        if send_error && self.transport.is_link_active() {
            match ControlFrame::Error.encode(self.max_packet_size()) {
                Ok(packet) => match self.transport.send(&packet) {
                    Ok(()) => info!("Sent ERROR frame during teardown"),
                    Err(e) => debug!("ERROR frame not sent: {}", e),
                },
                Err(e) => debug!("ERROR frame not encoded: {}", e),
            }
        }

        let mut session = self.session.lock();
        if session.generation == generation {
            session.active = false;
            self.changed.notify_all();
        }
    }

    // ------------------------------------------------------------------------
    // Worker
    // ------------------------------------------------------------------------

    fn run_worker(self: Arc<Self>, context: WorkerContext) {
        let result = self.transfer(&context);

        let applied = {
            let mut session = self.session.lock();
            if session.generation != context.generation {
                return;
            }
            match &result {
                Ok(summary) => {
                    info!(
                        "Transfer complete: {} bytes in {} packets",
                        summary.bytes_sent, summary.chunks_sent
                    );
                    self.apply_locked(&mut session, TransferEvent::WorkerSucceeded)
                }
                Err(TransferError::Cancelled) => {
                    debug!("Transfer worker exiting after cancellation");
                    return;
                }
                Err(e) => {
                    error!("Transfer failed: {}", e);
                    self.fail_locked(&mut session, TransferEvent::WorkerFailed, e)
                }
            }
        };

        if applied {
            context.timer.cancel();
            self.release(context.generation);
        }
    }

    fn transfer(&self, context: &WorkerContext) -> Result<SendSummary> {
        let (path, file_size, file_name) = {
            let mut session = self.session.lock();
            loop {
                if session.generation != context.generation || context.cancel.is_cancelled() {
                    return Err(TransferError::Cancelled);
                }
                match session.status {
                    TransferStatus::Connected => break,
                    TransferStatus::Advertising => {
                        self.changed
                            .wait_for(&mut session, self.config.connect_poll());
                    }
                    _ => return Err(TransferError::Cancelled),
                }
            }
            (
                session.file_path.clone(),
                session.file_size,
                session.file_name.clone(),
            )
        };

        let file_size =
            u32::try_from(file_size).map_err(|_| TransferError::FileTooLarge { size: file_size })?;
        let mut source = self.files.open(&path).map_err(|e| {
            error!("Failed to open file {}: {}", path, e);
            TransferError::FileRead(e)
        })?;

        let mut observer = SessionObserver {
            inner: self,
            generation: context.generation,
            unreported: 0,
        };
        let sender = ChunkedSender::new(self.transport.as_ref(), &self.config, &context.cancel);
        sender.send_file(source.as_mut(), file_size, file_name.as_str(), &mut observer)
    }
}

/// What a worker thread needs to know about its session
struct WorkerContext {
    generation: u64,
    cancel: CancelFlag,
    timer: TimerHandle,
}

/// Publishes sender progress into the shared session
struct SessionObserver<'a> {
    inner: &'a Inner,
    generation: u64,
    unreported: u32,
}

impl SendObserver for SessionObserver<'_> {
    fn on_start_sent(&mut self) -> Result<()> {
        let mut session = self.inner.session.lock();
        if session.generation == self.generation
            && self
                .inner
                .apply_locked(&mut session, TransferEvent::StartFrameSent)
        {
            Ok(())
        } else {
            Err(TransferError::Cancelled)
        }
    }

    fn on_chunk_sent(&mut self, len: usize) -> Result<()> {
        let mut session = self.inner.session.lock();
        if session.generation != self.generation || session.status != TransferStatus::Transferring
        {
            return Err(TransferError::Cancelled);
        }

        session.record_chunk(len);
        self.unreported += 1;
        if self.unreported >= self.inner.config.progress_interval
            || session.bytes_sent == session.file_size
        {
            self.unreported = 0;
            self.inner.reporter.report(&session.snapshot());
        }
        Ok(())
    }
}
