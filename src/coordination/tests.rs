//! Tests for the coordination contract.

use super::*;
use crate::test_support::MemoryEnsemble;

#[test]
fn connect_string_appends_default_port() {
    let endpoints = vec!["zk1".to_string(), "zk2:2182".to_string()];
    assert_eq!(connect_string(&endpoints), "zk1:2181,zk2:2182");
}

#[test]
fn connect_string_skips_blank_entries() {
    let endpoints = vec![" localhost ".to_string(), "".to_string()];
    assert_eq!(connect_string(&endpoints), "localhost:2181");
    assert_eq!(connect_string(&[]), "");
}

#[test]
fn create_is_exclusive() {
    let ensemble = MemoryEnsemble::new();
    let a = ensemble.session();
    let b = ensemble.session();

    a.create("/job", b"a", NodeMode::Ephemeral).unwrap();
    assert_eq!(
        b.create("/job", b"b", NodeMode::Ephemeral),
        Err(CoordError::NodeExists)
    );
    assert_eq!(b.get("/job").unwrap(), b"a".to_vec());
}

#[test]
fn create_requires_parent() {
    let ensemble = MemoryEnsemble::new();
    let session = ensemble.session();

    assert_eq!(
        session.create("/missing/job", b"", NodeMode::Ephemeral),
        Err(CoordError::NoNode)
    );
}

#[test]
fn ephemeral_nodes_vanish_with_their_session() {
    let ensemble = MemoryEnsemble::new();
    let session = ensemble.session();
    session.create("/root", b"", NodeMode::Persistent).unwrap();
    session
        .create("/root/job", b"host", NodeMode::Ephemeral)
        .unwrap();

    session.close();

    assert!(ensemble.contains("/root"));
    assert!(!ensemble.contains("/root/job"));
    assert_eq!(session.get("/root"), Err(CoordError::SessionExpired));
}

#[test]
fn deletion_watch_fires_on_delete() {
    let ensemble = MemoryEnsemble::new();
    let owner = ensemble.session();
    let waiter = ensemble.session();
    owner.create("/job", b"owner", NodeMode::Ephemeral).unwrap();

    let rx = waiter.watch_deletion("/job").unwrap().unwrap();
    ensemble.expire(owner.id());

    assert!(rx.recv().is_ok());
    assert!(waiter.watch_deletion("/job").unwrap().is_none());
}
