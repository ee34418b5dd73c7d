//! Coordination service access.
//!
//! Lock logic talks to the service only through the [`Coordinator`] trait, so
//! the manager and watchdog receive an explicit client at construction. The
//! production implementation is [`ZkCoordinator`], backed by a ZooKeeper
//! ensemble.

mod types;
mod zk;

#[cfg(test)]
mod tests;

pub use types::{CoordError, CoordResult, Coordinator, NodeMode};
pub use zk::{ZkCoordinator, connect_string};
