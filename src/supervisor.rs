//! Child process supervision.
//!
//! Spawns the locked command with the caller's standard streams and offers a
//! single, idempotent termination point shared by the watchdog and the signal
//! listener.

use crate::error::{Result, ZklockError};
use crate::shutdown::Shutdown;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

/// What a termination request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The child was sent a kill.
    Killed,
    /// An earlier request already handled it.
    AlreadyRequested,
    /// The child had exited before the request.
    AlreadyExited,
    /// Killing is disabled; the child keeps running.
    Detached,
    /// No child yet; applied as soon as one is attached.
    Deferred,
}

/// The only capability other tasks get over the child.
pub trait Terminate: Send + Sync {
    /// Request termination. Safe to call any number of times from any thread.
    fn terminate(&self) -> Termination;
}

/// How a wait for the child ended.
#[derive(Debug)]
pub enum WaitOutcome {
    Exited(ExitStatus),
    /// A concurrent task aborted the run first.
    Aborted,
}

/// Owner of the spawned child process.
pub struct Supervisor {
    child: Mutex<Child>,
    pid: u32,
    program: String,
    kill_on_fatal: bool,
    terminate_requested: AtomicBool,
}

impl Supervisor {
    /// Spawn `command[0]` with the remaining elements as arguments.
    ///
    /// With `kill_on_fatal` false, [`Terminate::terminate`] leaves the child
    /// running.
    pub fn spawn(command: &[String], kill_on_fatal: bool) -> Result<Self> {
        let Some((program, args)) = command.split_first() else {
            return Err(ZklockError::UserError("no command given".to_string()));
        };

        debug!(program = %program, args = ?args, "Run");
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                ZklockError::Process(format!(
                    "failed to execute '{}': {}\nFix: ensure the command is installed and in PATH.",
                    program, e
                ))
            })?;

        let pid = child.id();
        info!(pid, program = %program, "Child started");

        Ok(Self {
            child: Mutex::new(child),
            pid,
            program: program.clone(),
            kill_on_fatal,
            terminate_requested: AtomicBool::new(false),
        })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    fn lock(&self) -> MutexGuard<'_, Child> {
        self.child.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    /// Non-blocking exit check.
    pub fn try_wait(&self) -> Result<Option<ExitStatus>> {
        self.lock()
            .try_wait()
            .map_err(|e| ZklockError::Process(format!("failed to check process status: {}", e)))
    }

    /// Block until the child exits or `shutdown` records an abort.
    ///
    /// The child is polled every `poll` so the mutex is never held across a
    /// blocking wait and `terminate` can always get in.
    pub fn wait(&self, shutdown: &Shutdown, poll: Duration) -> Result<WaitOutcome> {
        loop {
            if shutdown.is_aborted() {
                return Ok(WaitOutcome::Aborted);
            }
            if let Some(status) = self.try_wait()? {
                debug!(pid = self.pid, status = %status, "Child exited");
                return Ok(WaitOutcome::Exited(status));
            }
            shutdown.wait_for_abort(poll);
        }
    }
}

impl Terminate for Supervisor {
    fn terminate(&self) -> Termination {
        if self.terminate_requested.swap(true, Ordering::SeqCst) {
            return Termination::AlreadyRequested;
        }

        if !self.kill_on_fatal {
            warn!(pid = self.pid, program = %self.program, "Kill disabled, leaving child running");
            return Termination::Detached;
        }

        let mut child = self.lock();
        if let Ok(Some(_)) = child.try_wait() {
            return Termination::AlreadyExited;
        }

        // On Unix this is SIGKILL; on Windows it is TerminateProcess.
        match child.kill() {
            Ok(()) => {
                info!(pid = self.pid, program = %self.program, "Child killed");
                Termination::Killed
            }
            Err(e) => {
                warn!(pid = self.pid, error = %e, "Failed to kill child");
                Termination::AlreadyExited
            }
        }
    }
}
