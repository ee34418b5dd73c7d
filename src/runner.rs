//! One locked run, end to end.
//!
//! ensure root → acquire → signal listener → spawn → watchdog → wait for
//! the child or an abort → post-delay → stop watchdog → done.
//!
//! The watchdog and the signal listener never exit the process themselves.
//! They terminate the child through the supervisor and record a fatal error
//! in the shared [`Shutdown`], which this flow returns.

use crate::config::Config;
use crate::coordination::Coordinator;
use crate::error::{Result, ZklockError};
use crate::lock::{Identity, LockManager, LockPath, LockState};
use crate::shutdown::Shutdown;
use crate::signals::{SignalCoordinator, SignalRouter};
use crate::supervisor::{Supervisor, Terminate, WaitOutcome};
use crate::watchdog::Watchdog;
use std::process::ExitStatus;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// How often the main flow checks whether the child has exited.
const CHILD_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Everything a run needs besides the coordination client.
pub struct RunPlan {
    pub config: Config,
    pub lock_name: String,
    pub command: Vec<String>,
    pub identity: Identity,
    /// Listen for SIGINT/SIGTERM while the child runs.
    pub handle_signals: bool,
}

/// Result of a run that completed normally.
#[derive(Debug)]
pub struct RunReport {
    pub path: LockPath,
    pub status: ExitStatus,
    /// Last ownership state the watchdog observed.
    pub lock_state: LockState,
}

/// Honour the configured pre-lock delay.
pub fn delay_start(config: &Config) {
    let delay = config.sleep_before();
    if !delay.is_zero() {
        info!(secs = config.sleep_before_secs, "Sleeping before lock");
        thread::sleep(delay);
    }
}

pub fn run(client: Arc<dyn Coordinator>, plan: &RunPlan) -> Result<RunReport> {
    let shutdown = Arc::new(Shutdown::new());
    let router = Arc::new(SignalRouter::new(Arc::clone(&shutdown)));
    run_with(client, plan, shutdown, router)
}

/// [`run`] with the stop signal and signal routing supplied by the caller.
fn run_with(
    client: Arc<dyn Coordinator>,
    plan: &RunPlan,
    shutdown: Arc<Shutdown>,
    router: Arc<SignalRouter>,
) -> Result<RunReport> {
    let config = &plan.config;
    let manager = LockManager::new(Arc::clone(&client));

    manager.ensure_root(&config.root)?;

    debug!(root = %config.root, name = %plan.lock_name, wait = config.wait, "Acquiring lock");
    let path = if config.wait {
        manager.acquire_waiting(&config.root, &plan.lock_name, &plan.identity)?
    } else {
        manager.acquire(&config.root, &plan.lock_name, &plan.identity)?
    };

    // Listen before the child exists so no signal gets the default action.
    let listener = if plan.handle_signals {
        Some(SignalCoordinator::install(Arc::clone(&router))?)
    } else {
        None
    };

    let result = supervise(client, plan, path, &shutdown, &router);

    if let Some(listener) = listener {
        listener.close();
    }
    result
}

fn supervise(
    client: Arc<dyn Coordinator>,
    plan: &RunPlan,
    path: LockPath,
    shutdown: &Arc<Shutdown>,
    router: &SignalRouter,
) -> Result<RunReport> {
    let config = &plan.config;

    if let Some(err) = shutdown.take_abort() {
        return Err(err);
    }

    let supervisor = Arc::new(Supervisor::spawn(&plan.command, config.kill_on_fatal)?);
    let terminator = Arc::clone(&supervisor) as Arc<dyn Terminate>;
    router.attach(Arc::clone(&terminator));

    let watchdog = Watchdog::new(
        client,
        path.clone(),
        plan.identity.clone(),
        config.poll_interval(),
    )
    .spawn(terminator, Arc::clone(shutdown))
    .inspect_err(|_| {
        supervisor.terminate();
    })?;

    let status = match supervisor.wait(shutdown, CHILD_POLL_INTERVAL) {
        Ok(WaitOutcome::Exited(status)) => status,
        Ok(WaitOutcome::Aborted) => {
            let _ = watchdog.join();
            return Err(aborted(shutdown));
        }
        Err(err) => {
            supervisor.terminate();
            shutdown.stop();
            let _ = watchdog.join();
            return Err(err);
        }
    };
    info!(pid = supervisor.pid(), status = %status, "Command finished");

    // The lock is still held and watched until the post-delay is over.
    let delay = config.sleep_after();
    if !delay.is_zero() {
        info!(secs = config.sleep_after_secs, "Sleeping after command");
        if shutdown.wait_for_abort(delay) {
            let _ = watchdog.join();
            return Err(aborted(shutdown));
        }
    }

    shutdown.stop();
    let lock_state = watchdog_result(watchdog)?;

    // The watchdog can still have fired just before the stop.
    if let Some(err) = shutdown.take_abort() {
        return Err(err);
    }

    info!(path = %path, "done");

    Ok(RunReport {
        path,
        status,
        lock_state,
    })
}

fn aborted(shutdown: &Shutdown) -> ZklockError {
    shutdown
        .take_abort()
        .unwrap_or_else(|| ZklockError::Process("run aborted".to_string()))
}

fn watchdog_result(handle: JoinHandle<LockState>) -> Result<LockState> {
    handle.join().map_err(|_| {
        warn!("Watchdog thread panicked");
        ZklockError::Process("watchdog thread panicked".to_string())
    })
}
