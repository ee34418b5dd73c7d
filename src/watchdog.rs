//! Lock ownership watchdog.
//!
//! Polls the lock node while the child runs. Each tick reads the node and
//! compares its content with our identity:
//! - missing, emptied, or session gone: the lock is lost; recreate it once
//! - read error of any other kind: transient, log and keep polling
//! - another identity: usurped
//!
//! Loss that cannot be repaired and usurpation are fatal: the child is
//! terminated and the run is aborted through [`Shutdown`].

use crate::coordination::{CoordError, Coordinator};
use crate::error::{Result, ZklockError};
use crate::lock::{Identity, LockManager, LockPath, LockState};
use crate::shutdown::Shutdown;
use crate::supervisor::Terminate;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Default time between ownership checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Non-fatal result of one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// Node holds our identity.
    Held,
    /// Node was gone and has been recreated.
    Relocked,
    /// Read failed; state unchanged.
    Transient(String),
}

pub struct Watchdog {
    client: Arc<dyn Coordinator>,
    manager: LockManager,
    path: LockPath,
    identity: Identity,
    interval: Duration,
    state: LockState,
}

impl Watchdog {
    pub fn new(
        client: Arc<dyn Coordinator>,
        path: LockPath,
        identity: Identity,
        interval: Duration,
    ) -> Self {
        Self {
            manager: LockManager::new(Arc::clone(&client)),
            client,
            path,
            identity,
            interval,
            state: LockState::Held,
        }
    }

    pub fn state(&self) -> LockState {
        self.state
    }

    /// Check ownership once.
    pub fn tick(&mut self) -> Result<Observation> {
        match self.client.get(self.path.as_str()) {
            Ok(data) if data.is_empty() => self.relock("emptied"),
            Ok(data) if data == self.identity.as_bytes() => {
                self.state = LockState::Held;
                Ok(Observation::Held)
            }
            Ok(data) => {
                self.state = LockState::Usurped;
                Err(ZklockError::LockUsurped {
                    path: self.path.to_string(),
                    owner: String::from_utf8_lossy(&data).to_string(),
                })
            }
            Err(CoordError::NoNode) => self.relock("disappeared"),
            Err(CoordError::SessionExpired) => self.relock("session expired"),
            Err(e) => {
                warn!(path = %self.path, error = %e, "Failed to read lock node");
                Ok(Observation::Transient(e.to_string()))
            }
        }
    }

    fn relock(&mut self, why: &str) -> Result<Observation> {
        self.state = LockState::Lost;
        warn!(path = %self.path, reason = why, "Lock lost, trying to re-acquire");

        match self.manager.reacquire(&self.path, &self.identity) {
            Ok(()) => {
                self.state = LockState::Held;
                info!(path = %self.path, "Lock re-acquired");
                Ok(Observation::Relocked)
            }
            Err(err) => Err(self.intruder().unwrap_or(err)),
        }
    }

    /// After a failed re-create, name whoever got there first.
    fn intruder(&mut self) -> Option<ZklockError> {
        let data = self.client.get(self.path.as_str()).ok()?;
        if data.is_empty() || data == self.identity.as_bytes() {
            return None;
        }
        self.state = LockState::Usurped;
        Some(ZklockError::LockUsurped {
            path: self.path.to_string(),
            owner: String::from_utf8_lossy(&data).to_string(),
        })
    }

    /// Poll until `shutdown` stops. Returns the last observed state.
    pub fn run(mut self, terminator: &dyn Terminate, shutdown: &Shutdown) -> LockState {
        debug!(path = %self.path, interval_ms = self.interval.as_millis() as u64, "Watchdog started");

        while !shutdown.wait_timeout(self.interval) {
            if let Err(err) = self.tick() {
                error!(path = %self.path, error = %err, "Lock ownership lost");
                let termination = terminator.terminate();
                debug!(?termination, "Termination requested");
                shutdown.abort(err);
                break;
            }
        }

        debug!(last = %self.state, "Watchdog stopped");
        self.state
    }

    /// Run the loop on its own thread.
    pub fn spawn(
        self,
        terminator: Arc<dyn Terminate>,
        shutdown: Arc<Shutdown>,
    ) -> Result<JoinHandle<LockState>> {
        thread::Builder::new()
            .name("zklock-watchdog".to_string())
            .spawn(move || self.run(terminator.as_ref(), &shutdown))
            .map_err(|e| ZklockError::Process(format!("failed to start watchdog: {}", e)))
    }
}
