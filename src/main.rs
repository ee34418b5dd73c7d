//! zklock: run a command under a cluster-wide ZooKeeper lock.
//!
//! This is the main entry point for the `zklock` CLI. It parses arguments,
//! builds the effective config, connects to the ensemble, performs one locked
//! run, and maps errors to exit codes.

mod cli;
pub mod config;
pub mod coordination;
pub mod error;
pub mod exit_codes;
pub mod lock;
mod logging;
mod runner;
pub mod shutdown;
pub mod signals;
pub mod supervisor;
pub mod watchdog;

#[cfg(test)]
mod test_support;

use cli::Cli;
use config::Config;
use coordination::{Coordinator, ZkCoordinator};
use error::Result;
use runner::RunPlan;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    match run(cli) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print operator-actionable error message to stderr
            eprintln!("Error: {}", err);

            // Return appropriate exit code
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::from_cli(&cli)?;
    logging::init(config.debug);
    debug!(lock = %cli.lock_name, command = ?cli.command, "Args");

    let identity = config.resolve_identity()?;
    runner::delay_start(&config);

    let client: Arc<dyn Coordinator> = Arc::new(ZkCoordinator::connect(
        &config.endpoints,
        config.session_timeout(),
    )?);

    let plan = RunPlan {
        config,
        lock_name: cli.lock_name,
        command: cli.command,
        identity,
        handle_signals: true,
    };

    let result = runner::run(Arc::clone(&client), &plan);

    // Ends the session, which releases the ephemeral lock node.
    client.close();

    result.map(|report| {
        debug!(path = %report.path, status = %report.status, state = %report.lock_state, "Run finished");
    })
}
