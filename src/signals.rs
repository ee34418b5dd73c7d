//! OS signal handling during a run.
//!
//! Two urgencies:
//! - SIGINT is graceful: the child is terminated and the run continues down
//!   its normal completion path once the child has exited.
//! - SIGTERM is immediate: the child is terminated and the run is aborted
//!   with exit status 1, skipping the wait for the child and any post-delay.

use crate::error::{Result, ZklockError};
use crate::shutdown::Shutdown;
use crate::supervisor::{Terminate, Termination};
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Graceful,
    Immediate,
}

/// Map a signal number to its urgency. Unhandled signals give `None`.
pub fn classify(signal: i32) -> Option<Urgency> {
    match signal {
        SIGINT => Some(Urgency::Graceful),
        SIGTERM => Some(Urgency::Immediate),
        _ => None,
    }
}

fn signal_name(signal: i32) -> &'static str {
    match signal {
        SIGINT => "SIGINT",
        SIGTERM => "SIGTERM",
        _ => "signal",
    }
}

/// Apply the contract for one delivered signal.
pub fn handle(urgency: Urgency, name: &str, terminator: &dyn Terminate, shutdown: &Shutdown) {
    match urgency {
        Urgency::Graceful => {
            info!(signal = name, "Received interrupt, stopping child");
            terminator.terminate();
        }
        Urgency::Immediate => {
            warn!(signal = name, "Received termination, aborting");
            terminator.terminate();
            shutdown.abort(ZklockError::Terminated(name.to_string()));
        }
    }
}

/// Where delivered signals go.
///
/// It exists before the child does. A request that arrives before a
/// terminator is attached is held and applied on [`SignalRouter::attach`].
pub struct SignalRouter {
    shutdown: Arc<Shutdown>,
    target: Mutex<Target>,
}

#[derive(Default)]
struct Target {
    terminator: Option<Arc<dyn Terminate>>,
    pending: bool,
}

impl SignalRouter {
    pub fn new(shutdown: Arc<Shutdown>) -> Self {
        Self {
            shutdown,
            target: Mutex::new(Target::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Target> {
        self.target.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    /// Apply one signal to the current run.
    pub fn deliver(&self, urgency: Urgency, name: &str) {
        handle(urgency, name, self, &self.shutdown);
    }

    /// Hand over the child. A held request terminates it right away.
    pub fn attach(&self, terminator: Arc<dyn Terminate>) {
        let mut target = self.lock();
        if target.pending {
            debug!("Applying termination requested before the child started");
            terminator.terminate();
        }
        target.terminator = Some(terminator);
    }
}

impl Terminate for SignalRouter {
    fn terminate(&self) -> Termination {
        let mut target = self.lock();
        match &target.terminator {
            Some(terminator) => terminator.terminate(),
            None => {
                target.pending = true;
                Termination::Deferred
            }
        }
    }
}

/// Background listener for SIGINT and SIGTERM.
///
/// Dropping it stops the listener thread.
pub struct SignalCoordinator {
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl SignalCoordinator {
    pub fn install(router: Arc<SignalRouter>) -> Result<Self> {
        let mut signals = Signals::new([SIGINT, SIGTERM]).map_err(|e| {
            ZklockError::Process(format!("failed to install signal handlers: {}", e))
        })?;
        let signals_handle = signals.handle();

        let thread = thread::Builder::new()
            .name("zklock-signals".to_string())
            .spawn(move || {
                for signal in signals.forever() {
                    if let Some(urgency) = classify(signal) {
                        router.deliver(urgency, signal_name(signal));
                    }
                }
                debug!("Signal listener stopped");
            })
            .map_err(|e| ZklockError::Process(format!("failed to start signal listener: {}", e)))?;

        Ok(Self {
            handle: signals_handle,
            thread: Some(thread),
        })
    }

    /// Stop listening and wait for the listener thread to finish.
    pub fn close(mut self) {
        self.stop_listener();
    }

    fn stop_listener(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Signal listener panicked");
            }
        }
    }
}

impl Drop for SignalCoordinator {
    fn drop(&mut self) {
        self.stop_listener();
    }
}
