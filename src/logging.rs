//! Diagnostic logging setup.
//!
//! Output goes to stderr so the child's stdout stays clean. `RUST_LOG`
//! overrides the level chosen from `--debug`.

use tracing_subscriber::EnvFilter;

/// Default filter directive for the given debug setting.
pub fn default_directive(debug: bool) -> &'static str {
    if debug { "zklock=debug" } else { "warn" }
}

/// Install the global subscriber. Safe to call once per process.
pub fn init(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));

    // A second init (tests, embedding) is ignored rather than panicking.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_flag_selects_crate_debug_level() {
        assert_eq!(default_directive(true), "zklock=debug");
        assert_eq!(default_directive(false), "warn");
    }

    #[test]
    fn init_twice_does_not_panic() {
        init(false);
        init(true);
    }
}
