//! Error types for the zklock CLI.
//!
//! Uses thiserror for derive macros and provides operator-facing messages.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for zklock operations.
///
/// Each variant maps to a process exit code. Every lock and runtime failure
/// exits with 1; only malformed input exits with the usage status.
#[derive(Error, Debug)]
pub enum ZklockError {
    /// User provided invalid arguments or settings.
    #[error("{0}")]
    UserError(String),

    /// The coordination service rejected or failed an operation we cannot continue without.
    #[error("Coordination service error: {0}")]
    Coordination(String),

    /// Another identity holds the lock.
    #[error("Lock {path} is held by another process{}", owner_suffix(.owner))]
    LockHeld { path: String, owner: Option<String> },

    /// The lock node disappeared and could not be recreated.
    #[error("Lock {path} was lost and could not be re-acquired: {reason}")]
    LockLost { path: String, reason: String },

    /// The lock node now names a different owner.
    #[error("Lock {path} re-acquired by another host {owner}")]
    LockUsurped { path: String, owner: String },

    /// Spawning or waiting on the child command failed.
    #[error("Process error: {0}")]
    Process(String),

    /// A termination signal forced an immediate exit.
    #[error("Terminated by {0}")]
    Terminated(String),
}

fn owner_suffix(owner: &Option<String>) -> String {
    match owner {
        Some(owner) => format!(" (owner: {})", owner),
        None => String::new(),
    }
}

impl ZklockError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ZklockError::UserError(_) => exit_codes::USAGE,
            ZklockError::Coordination(_)
            | ZklockError::LockHeld { .. }
            | ZklockError::LockLost { .. }
            | ZklockError::LockUsurped { .. }
            | ZklockError::Process(_)
            | ZklockError::Terminated(_) => exit_codes::FAILURE,
        }
    }
}

/// Result type alias for zklock operations.
pub type Result<T> = std::result::Result<T, ZklockError>;
