//! ZooKeeper-backed coordinator.

use super::types::{CoordError, CoordResult, Coordinator, NodeMode};
use crate::error::{Result, ZklockError};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;
use tracing::{debug, warn};
use zookeeper::{
    Acl, CreateMode, KeeperState, WatchedEvent, WatchedEventType, Watcher, ZkError, ZooKeeper,
};

/// Client port assumed for endpoints given without one.
pub const DEFAULT_PORT: u16 = 2181;

/// Join endpoints into a ZooKeeper connect string, filling in the default port.
pub fn connect_string(endpoints: &[String]) -> String {
    endpoints
        .iter()
        .map(|e| e.trim())
        .filter(|e| !e.is_empty())
        .map(|e| {
            if e.contains(':') {
                e.to_string()
            } else {
                format!("{}:{}", e, DEFAULT_PORT)
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Logs session state transitions. Node watches are armed per call.
struct SessionWatcher;

impl Watcher for SessionWatcher {
    fn handle(&self, event: WatchedEvent) {
        match event.keeper_state {
            KeeperState::Expired => warn!("Coordination session expired"),
            KeeperState::Disconnected => warn!("Disconnected from coordination service"),
            state => debug!(?state, path = ?event.path, "Session event"),
        }
    }
}

/// A single ZooKeeper session.
pub struct ZkCoordinator {
    zk: ZooKeeper,
}

impl ZkCoordinator {
    /// Open a session against the given endpoints.
    pub fn connect(endpoints: &[String], session_timeout: Duration) -> Result<Self> {
        let connect = connect_string(endpoints);
        if connect.is_empty() {
            return Err(ZklockError::UserError(
                "no coordination service endpoints configured".to_string(),
            ));
        }

        debug!(endpoints = %connect, timeout_ms = session_timeout.as_millis() as u64, "Connecting");
        let zk = ZooKeeper::connect(&connect, session_timeout, SessionWatcher).map_err(|e| {
            ZklockError::Coordination(format!("failed to connect to '{}': {:?}", connect, e))
        })?;

        Ok(Self { zk })
    }
}

fn classify(err: ZkError) -> CoordError {
    match err {
        ZkError::NodeExists => CoordError::NodeExists,
        ZkError::NoNode => CoordError::NoNode,
        ZkError::SessionExpired => CoordError::SessionExpired,
        other => CoordError::Service(format!("{:?}", other)),
    }
}

impl Coordinator for ZkCoordinator {
    fn exists(&self, path: &str) -> CoordResult<bool> {
        self.zk
            .exists(path, false)
            .map(|stat| stat.is_some())
            .map_err(classify)
    }

    fn create(&self, path: &str, value: &[u8], mode: NodeMode) -> CoordResult<String> {
        let mode = match mode {
            NodeMode::Persistent => CreateMode::Persistent,
            NodeMode::Ephemeral => CreateMode::Ephemeral,
        };
        self.zk
            .create(path, value.to_vec(), Acl::open_unsafe().clone(), mode)
            .map_err(classify)
    }

    fn get(&self, path: &str) -> CoordResult<Vec<u8>> {
        self.zk
            .get_data(path, false)
            .map(|(data, _stat)| data)
            .map_err(classify)
    }

    fn watch_deletion(&self, path: &str) -> CoordResult<Option<Receiver<()>>> {
        let (tx, rx) = mpsc::channel();
        let watched = path.to_string();
        let stat = self
            .zk
            .exists_w(path, move |event: WatchedEvent| {
                if matches!(event.event_type, WatchedEventType::NodeDeleted) {
                    debug!(path = %watched, "Lock node deleted");
                }
                let _ = tx.send(());
            })
            .map_err(classify)?;

        Ok(stat.map(|_| rx))
    }

    fn close(&self) {
        if let Err(e) = self.zk.close() {
            warn!(error = ?e, "Failed to close coordination session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deliver<W: Watcher>(watcher: &W, keeper_state: KeeperState) {
        watcher.handle(WatchedEvent {
            event_type: WatchedEventType::None,
            keeper_state,
            path: None,
        });
    }

    #[test]
    fn session_watcher_accepts_state_changes() {
        deliver(&SessionWatcher, KeeperState::SyncConnected);
        deliver(&SessionWatcher, KeeperState::Disconnected);
        deliver(&SessionWatcher, KeeperState::Expired);
    }
}
