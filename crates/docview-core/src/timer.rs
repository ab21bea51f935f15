//! Single-shot timeout timer
//!
//! Runs the callback on its own thread once the deadline passes, unless the
//! timer was cancelled first. Dropping the timer cancels it.

use std::io;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct TimerState {
    cancelled: Mutex<bool>,
    wakeup: Condvar,
}

/// Handle to an armed single-shot timer
#[derive(Debug)]
pub struct TimeoutTimer {
    state: Arc<TimerState>,
}

impl TimeoutTimer {
    /// Arm a timer that calls `on_fire` after `timeout`
    pub fn start<F>(timeout: Duration, on_fire: F) -> io::Result<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let state = Arc::new(TimerState::default());
        let thread_state = state.clone();
        let deadline = Instant::now() + timeout;

        thread::Builder::new()
            .name("docview-timeout".to_string())
            .spawn(move || {
                let mut cancelled = thread_state.cancelled.lock();
                while !*cancelled {
                    if thread_state
                        .wakeup
                        .wait_until(&mut cancelled, deadline)
                        .timed_out()
                    {
                        break;
                    }
                }
                if *cancelled {
                    return;
                }
                drop(cancelled);
                on_fire();
            })?;

        Ok(Self { state })
    }

    /// Disarm the timer; a no-op if it already fired
    pub fn cancel(&self) {
        self.handle().cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.state.cancelled.lock()
    }

    /// Cloneable handle that can disarm the timer from another thread
    pub fn handle(&self) -> TimerHandle {
        TimerHandle {
            state: self.state.clone(),
        }
    }
}

/// Disarms a `TimeoutTimer` without owning it
#[derive(Debug, Clone)]
pub struct TimerHandle {
    state: Arc<TimerState>,
}

impl TimerHandle {
    pub fn cancel(&self) {
        *self.state.cancelled.lock() = true;
        self.state.wakeup.notify_all();
    }
}

impl Drop for TimeoutTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
