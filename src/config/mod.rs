//! Configuration model for zklock.
//!
//! A run is configured from defaults, an optional YAML file (`--config`) and
//! command-line flags, in increasing order of precedence. Parsing is
//! forward-compatible: unknown YAML fields are ignored.

mod model;
mod operations;
pub mod types;


// Re-export public API
pub use model::Config;
