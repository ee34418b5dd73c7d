//! Lock acquisition over the coordination service.

use super::types::{Identity, LockPath, validate_root};
use crate::coordination::{CoordError, CoordResult, Coordinator, NodeMode};
use crate::error::{Result, ZklockError};
use std::sync::Arc;
use tracing::{debug, info};

/// Creates the namespace root and the ephemeral lock nodes under it.
#[derive(Clone)]
pub struct LockManager {
    client: Arc<dyn Coordinator>,
}

impl LockManager {
    pub fn new(client: Arc<dyn Coordinator>) -> Self {
        Self { client }
    }

    /// Make sure `root` and each of its ancestors exist as persistent nodes.
    ///
    /// A racing creation by another process is not an error.
    pub fn ensure_root(&self, root: &str) -> Result<()> {
        validate_root(root)?;

        for node in ancestors(root) {
            let exists = self.client.exists(&node).map_err(|e| {
                ZklockError::Coordination(format!("failed to check '{}': {}", node, e))
            })?;
            if exists {
                continue;
            }

            match self.client.create(&node, &[], NodeMode::Persistent) {
                Ok(_) => debug!(path = %node, "Created namespace node"),
                Err(CoordError::NodeExists) => {
                    debug!(path = %node, "Namespace node created concurrently")
                }
                Err(e) => {
                    return Err(ZklockError::Coordination(format!(
                        "failed to create '{}': {}",
                        node, e
                    )));
                }
            }
        }

        Ok(())
    }

    /// One atomic attempt to create `root/name` holding `identity`.
    ///
    /// # Returns
    ///
    /// * `Ok(LockPath)` - The lock is held by this session
    /// * `Err(ZklockError::LockHeld)` - Another session holds it
    /// * `Err(ZklockError::Coordination)` - Any other failure
    pub fn acquire(&self, root: &str, name: &str, identity: &Identity) -> Result<LockPath> {
        let path = LockPath::new(root, name)?;

        match self.create_lock_node(&path, identity) {
            Ok(()) => {
                info!(path = %path, identity = %identity, "Lock acquired");
                Ok(path)
            }
            Err(CoordError::NodeExists) => Err(ZklockError::LockHeld {
                owner: self.current_owner(&path),
                path: path.to_string(),
            }),
            Err(e) => Err(ZklockError::Coordination(format!(
                "failed to create lock '{}': {}",
                path, e
            ))),
        }
    }

    /// Recreate a lock node that has disappeared. Single attempt.
    pub fn reacquire(&self, path: &LockPath, identity: &Identity) -> Result<()> {
        self.create_lock_node(path, identity)
            .map_err(|e| ZklockError::LockLost {
                path: path.to_string(),
                reason: e.to_string(),
            })
    }

    /// Block until the lock can be taken.
    ///
    /// Opt-in alternative to [`LockManager::acquire`]: on contention a deletion
    /// watch is armed on the node and the attempt is repeated when it fires.
    pub fn acquire_waiting(&self, root: &str, name: &str, identity: &Identity) -> Result<LockPath> {
        loop {
            let path = match self.acquire(root, name, identity) {
                Err(ZklockError::LockHeld { path, owner }) => {
                    info!(path = %path, owner = ?owner, "Lock is held, waiting for release");
                    path
                }
                other => return other,
            };

            let watch = self.client.watch_deletion(&path).map_err(|e| {
                ZklockError::Coordination(format!("failed to watch '{}': {}", path, e))
            })?;

            // None: released between our create and the watch; retry right away.
            if let Some(released) = watch {
                released.recv().map_err(|_| {
                    ZklockError::Coordination(format!(
                        "watch on '{}' ended without an event",
                        path
                    ))
                })?;
            }
        }
    }

    fn create_lock_node(&self, path: &LockPath, identity: &Identity) -> CoordResult<()> {
        self.client
            .create(path.as_str(), identity.as_bytes(), NodeMode::Ephemeral)
            .map(|_| ())
    }

    /// Best-effort read of the current holder for error messages.
    fn current_owner(&self, path: &LockPath) -> Option<String> {
        self.client
            .get(path.as_str())
            .ok()
            .map(|data| String::from_utf8_lossy(&data).to_string())
            .filter(|owner| !owner.is_empty())
    }
}

/// Every prefix of `root`, shortest first. `/a/b` yields `/a`, `/a/b`.
fn ancestors(root: &str) -> Vec<String> {
    let mut nodes = Vec::new();
    let mut current = String::new();
    for segment in root.split('/').filter(|s| !s.is_empty()) {
        current.push('/');
        current.push_str(segment);
        nodes.push(current.clone());
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::ancestors;

    #[test]
    fn ancestors_of_nested_root() {
        assert_eq!(ancestors("/a/b/c"), vec!["/a", "/a/b", "/a/b/c"]);
    }

    #[test]
    fn slash_root_has_no_ancestors() {
        assert!(ancestors("/").is_empty());
    }
}
