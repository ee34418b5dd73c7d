//! Default values for config fields.

use crate::watchdog::DEFAULT_POLL_INTERVAL;

pub const DEFAULT_ROOT: &str = "/zklock";

pub(crate) fn default_endpoints() -> Vec<String> {
    vec!["localhost".to_string()]
}
pub(crate) fn default_session_timeout_ms() -> u64 {
    4000
}
pub(crate) fn default_root() -> String {
    DEFAULT_ROOT.to_string()
}
pub(crate) fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}
pub(crate) fn default_true() -> bool {
    true
}
