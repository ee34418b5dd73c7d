//! Coordination client contract and result classification.

use std::sync::mpsc::Receiver;
use thiserror::Error;

/// Lifetime of a created node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeMode {
    /// Survives the creating session.
    Persistent,
    /// Removed by the service when the creating session ends.
    Ephemeral,
}

/// Classified failure of a coordination operation.
///
/// Lock logic only ever branches on the first three variants; everything
/// else is carried as an opaque message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordError {
    #[error("node already exists")]
    NodeExists,

    #[error("node does not exist")]
    NoNode,

    #[error("session expired")]
    SessionExpired,

    #[error("{0}")]
    Service(String),
}

/// Result of a single coordination operation.
pub type CoordResult<T> = std::result::Result<T, CoordError>;

/// Hierarchical coordination service with atomic create, ephemeral nodes and point reads.
///
/// Implementations hold one client session. Ephemeral nodes created through
/// a client are bound to that session.
pub trait Coordinator: Send + Sync {
    /// Whether a node exists at `path`.
    fn exists(&self, path: &str) -> CoordResult<bool>;

    /// Atomically create `path` holding `value`. Returns the created path.
    ///
    /// Fails with [`CoordError::NodeExists`] if the node is already present and
    /// with [`CoordError::NoNode`] if its parent is missing.
    fn create(&self, path: &str, value: &[u8], mode: NodeMode) -> CoordResult<String>;

    /// Read the content of `path`.
    fn get(&self, path: &str) -> CoordResult<Vec<u8>>;

    /// Arm a one-shot watch that fires when `path` is deleted or changed.
    ///
    /// Returns `None` when the node is already gone, so the caller can retry
    /// immediately instead of waiting on an event that will never come.
    fn watch_deletion(&self, path: &str) -> CoordResult<Option<Receiver<()>>>;

    /// End the session. Ephemeral nodes owned by it are released.
    fn close(&self);
}
