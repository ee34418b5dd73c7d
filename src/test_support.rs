use crate::coordination::{CoordError, CoordResult, Coordinator, NodeMode};
use crate::supervisor::{Terminate, Termination};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

/// In-process stand-in for a coordination ensemble shared by several sessions.
pub(crate) struct MemoryEnsemble {
    state: Mutex<EnsembleState>,
    next_session: AtomicU64,
}

#[derive(Default)]
struct EnsembleState {
    nodes: BTreeMap<String, MemoryNode>,
    watches: HashMap<String, Vec<Sender<()>>>,
    expired: HashSet<u64>,
}

struct MemoryNode {
    value: Vec<u8>,
    owner: Option<u64>,
}

impl EnsembleState {
    fn fire(&mut self, path: &str) {
        if let Some(watchers) = self.watches.remove(path) {
            for tx in watchers {
                let _ = tx.send(());
            }
        }
    }
}

fn parent_of(path: &str) -> Option<&str> {
    match path.rfind('/') {
        Some(0) if path.len() > 1 => Some("/"),
        Some(0) | None => None,
        Some(idx) => Some(&path[..idx]),
    }
}

impl MemoryEnsemble {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(EnsembleState::default()),
            next_session: AtomicU64::new(1),
        })
    }

    fn lock(&self) -> MutexGuard<'_, EnsembleState> {
        self.state.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    /// Open a new client session.
    pub(crate) fn session(self: &Arc<Self>) -> Arc<MemorySession> {
        Arc::new(MemorySession {
            ensemble: Arc::clone(self),
            id: self.next_session.fetch_add(1, Ordering::SeqCst),
            failing_reads: AtomicUsize::new(0),
            reads: AtomicUsize::new(0),
        })
    }

    pub(crate) fn contains(&self, path: &str) -> bool {
        self.lock().nodes.contains_key(path)
    }

    pub(crate) fn value(&self, path: &str) -> Option<String> {
        self.lock()
            .nodes
            .get(path)
            .map(|n| String::from_utf8_lossy(&n.value).to_string())
    }

    pub(crate) fn is_ephemeral(&self, path: &str) -> bool {
        self.lock()
            .nodes
            .get(path)
            .is_some_and(|n| n.owner.is_some())
    }

    /// Overwrite a node's content from outside any session.
    pub(crate) fn set_value(&self, path: &str, value: &str) {
        let mut state = self.lock();
        if let Some(node) = state.nodes.get_mut(path) {
            node.value = value.as_bytes().to_vec();
            state.fire(path);
        }
    }

    /// Delete a node from outside any session.
    pub(crate) fn delete(&self, path: &str) {
        let mut state = self.lock();
        if state.nodes.remove(path).is_some() {
            state.fire(path);
        }
    }

    /// End a session the way the service would after its timeout.
    pub(crate) fn expire(&self, session: u64) {
        let mut state = self.lock();
        state.expired.insert(session);
        let owned: Vec<String> = state
            .nodes
            .iter()
            .filter(|(_, n)| n.owner == Some(session))
            .map(|(p, _)| p.clone())
            .collect();
        for path in owned {
            state.nodes.remove(&path);
            state.fire(&path);
        }
    }
}

/// One client session against a [`MemoryEnsemble`].
pub(crate) struct MemorySession {
    ensemble: Arc<MemoryEnsemble>,
    id: u64,
    failing_reads: AtomicUsize,
    reads: AtomicUsize,
}

impl MemorySession {
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Make the next `n` reads fail with a transient service error.
    pub(crate) fn fail_next_reads(&self, n: usize) {
        self.failing_reads.store(n, Ordering::SeqCst);
    }

    /// Number of `get` calls issued through this session.
    pub(crate) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn check_live(&self, state: &EnsembleState) -> CoordResult<()> {
        if state.expired.contains(&self.id) {
            Err(CoordError::SessionExpired)
        } else {
            Ok(())
        }
    }
}

impl Coordinator for MemorySession {
    fn exists(&self, path: &str) -> CoordResult<bool> {
        let state = self.ensemble.lock();
        self.check_live(&state)?;
        Ok(path == "/" || state.nodes.contains_key(path))
    }

    fn create(&self, path: &str, value: &[u8], mode: NodeMode) -> CoordResult<String> {
        let mut state = self.ensemble.lock();
        self.check_live(&state)?;
        if path == "/" || state.nodes.contains_key(path) {
            return Err(CoordError::NodeExists);
        }
        match parent_of(path) {
            Some("/") => {}
            Some(parent) => match state.nodes.get(parent) {
                Some(node) if node.owner.is_none() => {}
                Some(_) => {
                    return Err(CoordError::Service(
                        "ephemeral nodes may not have children".to_string(),
                    ));
                }
                None => return Err(CoordError::NoNode),
            },
            None => return Err(CoordError::Service(format!("invalid path '{}'", path))),
        }
        let owner = match mode {
            NodeMode::Persistent => None,
            NodeMode::Ephemeral => Some(self.id),
        };
        state.nodes.insert(
            path.to_string(),
            MemoryNode {
                value: value.to_vec(),
                owner,
            },
        );
        Ok(path.to_string())
    }

    fn get(&self, path: &str) -> CoordResult<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let state = self.ensemble.lock();
        self.check_live(&state)?;
        let failing = self.failing_reads.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_reads.store(failing - 1, Ordering::SeqCst);
            return Err(CoordError::Service("connection loss".to_string()));
        }
        state
            .nodes
            .get(path)
            .map(|n| n.value.clone())
            .ok_or(CoordError::NoNode)
    }

    fn watch_deletion(&self, path: &str) -> CoordResult<Option<Receiver<()>>> {
        let mut state = self.ensemble.lock();
        self.check_live(&state)?;
        if !state.nodes.contains_key(path) {
            return Ok(None);
        }
        let (tx, rx) = mpsc::channel();
        state.watches.entry(path.to_string()).or_default().push(tx);
        Ok(Some(rx))
    }

    fn close(&self) {
        self.ensemble.expire(self.id);
    }
}

/// Terminator that only counts requests.
#[derive(Default)]
pub(crate) struct CountingTerminator {
    calls: AtomicUsize,
}

impl CountingTerminator {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Terminate for CountingTerminator {
    fn terminate(&self) -> Termination {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Termination::Killed
        } else {
            Termination::AlreadyRequested
        }
    }
}
