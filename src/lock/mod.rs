//! Locking subsystem for zklock.
//!
//! A lock is a single ephemeral node `<root>/<name>` whose content is the
//! holder's identity. Exclusion comes from the coordination service's atomic
//! create; release comes from session end, so a crashed holder's lock heals
//! itself once its session times out.
//!
//! # Nodes
//!
//! - The root namespace node is persistent and empty. It is created lazily and
//!   never removed.
//! - The lock node is ephemeral. This process may recreate it after it
//!   vanishes (see the watchdog), but never deletes it explicitly.
//!
//! Contention fails fast by default. Waiting for release is a separate,
//! explicitly requested mode.

mod manager;
mod types;


pub use manager::LockManager;
pub use types::{Identity, LockPath, LockState, validate_root};
