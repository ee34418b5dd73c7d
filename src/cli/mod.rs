//! CLI argument parsing for zklock.
//!
//! Uses clap derive macros for declarative argument definitions. Every
//! optional value is an `Option` so an unset flag falls back to the config
//! file instead of overriding it.

use clap::Parser;
use std::path::PathBuf;

/// Run a command while holding a cluster-wide ZooKeeper lock.
///
/// The lock is an ephemeral node `<prefix>/<LOCK_NAME>` holding this host's
/// identity. If the node is already present, zklock exits 1 without running
/// anything. While the command runs, the node is checked every poll
/// interval; if it disappears it is recreated, and if another identity has
/// taken it the command is killed and zklock exits 1.
#[derive(Parser, Debug)]
#[command(name = "zklock")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Name of the lock node created under the prefix.
    #[arg(value_name = "LOCK_NAME")]
    pub lock_name: String,

    /// Command to run while the lock is held, followed by its arguments.
    #[arg(
        value_name = "COMMAND",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,

    /// ZooKeeper endpoints joined by ','.
    #[arg(short = 'z', long = "zk", value_delimiter = ',', value_name = "ENDPOINTS")]
    pub zk: Option<Vec<String>>,

    /// Prefix node under which locks are created.
    #[arg(short = 'p', long = "prefix", value_name = "PATH")]
    pub prefix: Option<String>,

    /// Fail rather than wait when the lock is held (default).
    #[arg(short = 'n', long = "no-wait", conflicts_with = "wait")]
    pub no_wait: bool,

    /// Wait for a held lock to be released instead of failing.
    #[arg(short = 'w', long = "wait")]
    pub wait: bool,

    /// Session timeout in milliseconds.
    #[arg(short = 't', long = "session-timeout", value_name = "MS")]
    pub session_timeout_ms: Option<u64>,

    /// Sleep after the command was executed, in seconds.
    #[arg(short = 'a', long = "sleep-after", value_name = "SECS")]
    pub sleep_after: Option<u64>,

    /// Sleep before locking, in seconds.
    #[arg(short = 'b', long = "sleep-before", value_name = "SECS")]
    pub sleep_before: Option<u64>,

    /// Don't kill the command if something goes wrong.
    #[arg(short = 'k', long = "dont-kill")]
    pub dont_kill: bool,

    /// Enable diagnostic logging.
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Identity written into the lock node (default: host name).
    #[arg(short = 'i', long = "identity", value_name = "NAME")]
    pub identity: Option<String>,

    /// Milliseconds between lock ownership checks.
    #[arg(long = "poll-interval", value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// YAML settings file; flags override its values.
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
