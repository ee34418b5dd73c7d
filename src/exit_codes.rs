//! Exit code constants for the zklock CLI.
//!
//! - 0: The command ran to completion while the lock was held
//! - 1: Lock held elsewhere, lock lost or usurped, hard signal, coordination failure
//! - 2: Usage error (bad arguments or settings)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// Any lock or runtime failure.
pub const FAILURE: i32 = 1;

/// Bad arguments or an invalid settings file. Matches clap's own usage status.
pub const USAGE: i32 = 2;
