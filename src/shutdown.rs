//! Shared stop/abort signal for the concurrent tasks of a run.
//!
//! `stop` ends monitoring after a normal completion. `abort` records the
//! first fatal error raised by any task and also stops everything; later
//! aborts are logged and dropped.

use crate::error::ZklockError;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

#[derive(Default)]
struct State {
    stopped: bool,
    aborted: bool,
    fatal: Option<ZklockError>,
}

#[derive(Default)]
pub struct Shutdown {
    state: Mutex<State>,
    changed: Condvar,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    /// Ask every loop to finish.
    pub fn stop(&self) {
        self.lock().stopped = true;
        self.changed.notify_all();
    }

    /// Record a fatal error and stop. Only the first error is kept.
    pub fn abort(&self, err: ZklockError) {
        let mut state = self.lock();
        state.stopped = true;
        if state.aborted {
            debug!(error = %err, "Ignoring secondary abort");
        } else {
            state.aborted = true;
            state.fatal = Some(err);
        }
        drop(state);
        self.changed.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    pub fn is_aborted(&self) -> bool {
        self.lock().aborted
    }

    /// Sleep for up to `timeout`. Returns true if stopped (early or already).
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let state = self.lock();
        let (state, _) = self
            .changed
            .wait_timeout_while(state, timeout, |s| !s.stopped)
            .unwrap_or_else(|poison| poison.into_inner());
        state.stopped
    }

    /// Sleep for up to `timeout`, waking only for an abort. Returns true if aborted.
    pub fn wait_for_abort(&self, timeout: Duration) -> bool {
        let state = self.lock();
        let (state, _) = self
            .changed
            .wait_timeout_while(state, timeout, |s| !s.aborted)
            .unwrap_or_else(|poison| poison.into_inner());
        state.aborted
    }

    /// Take the recorded fatal error, if any.
    pub fn take_abort(&self) -> Option<ZklockError> {
        self.lock().fatal.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn wait_times_out_when_running() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.wait_timeout(Duration::from_millis(20)));
        assert!(!shutdown.is_stopped());
    }

    #[test]
    fn stop_wakes_waiters() {
        let shutdown = Arc::new(Shutdown::new());
        let waiter = {
            let shutdown = Arc::clone(&shutdown);
            thread::spawn(move || {
                let start = Instant::now();
                let stopped = shutdown.wait_timeout(Duration::from_secs(10));
                (stopped, start.elapsed())
            })
        };

        thread::sleep(Duration::from_millis(50));
        shutdown.stop();

        let (stopped, elapsed) = waiter.join().unwrap();
        assert!(stopped);
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn first_abort_wins() {
        let shutdown = Shutdown::new();
        shutdown.abort(ZklockError::Terminated("SIGTERM".to_string()));
        shutdown.abort(ZklockError::Process("late".to_string()));

        assert!(shutdown.is_stopped());
        assert!(shutdown.is_aborted());
        assert!(matches!(
            shutdown.take_abort(),
            Some(ZklockError::Terminated(_))
        ));
        assert!(shutdown.take_abort().is_none());
    }

    #[test]
    fn stop_does_not_count_as_abort() {
        let shutdown = Shutdown::new();
        shutdown.stop();

        assert!(shutdown.wait_timeout(Duration::from_millis(1)));
        assert!(!shutdown.wait_for_abort(Duration::from_millis(20)));
        assert!(shutdown.take_abort().is_none());
    }
}
