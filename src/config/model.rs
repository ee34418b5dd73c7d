//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};

/// Settings for one zklock run.
///
/// Loaded from an optional YAML file and then overridden by command-line
/// flags. Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Coordination service
    // =========================================================================
    /// Ensemble endpoints (`host` or `host:port`).
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<String>,

    /// Session timeout in milliseconds. Bounds how long a crashed holder's
    /// lock survives.
    #[serde(default = "default_session_timeout_ms")]
    pub session_timeout_ms: u64,

    // =========================================================================
    // Lock settings
    // =========================================================================
    /// Namespace node under which lock nodes live.
    #[serde(default = "default_root")]
    pub root: String,

    /// Block until a contested lock is released instead of failing.
    #[serde(default)]
    pub wait: bool,

    /// Identity written into the lock node (default: host name).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,

    /// Milliseconds between watchdog ownership checks.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    // =========================================================================
    // Run settings
    // =========================================================================
    /// Seconds to sleep before locking.
    #[serde(default)]
    pub sleep_before_secs: u64,

    /// Seconds to sleep after the command finished, still holding the lock.
    #[serde(default)]
    pub sleep_after_secs: u64,

    /// Kill the command when the lock is lost or a signal arrives.
    #[serde(default = "default_true")]
    pub kill_on_fatal: bool,

    /// Emit diagnostic logging.
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoints: default_endpoints(),
            session_timeout_ms: default_session_timeout_ms(),
            root: default_root(),
            wait: false,
            identity: None,
            poll_interval_ms: default_poll_interval_ms(),
            sleep_before_secs: 0,
            sleep_after_secs: 0,
            kill_on_fatal: default_true(),
            debug: false,
        }
    }
}
