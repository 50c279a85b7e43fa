//! Scripted factory: per-cell connection queues

use std::sync::Arc;
use topokit::common::TopoConfig;
use topokit::topo::{Conn, Factory, ScriptedConn, ScriptedFactory, Version, GLOBAL_CELL};
use topokit::ErrorKind;

#[tokio::test]
async fn test_connections_handed_out_in_order() {
    let factory = ScriptedFactory::new();
    let first = factory.add_cell("zone1");
    let second = Arc::new(ScriptedConn::new());
    factory.add_connection("zone1", Arc::clone(&second));
    first.create("marker", b"first").await.unwrap();
    second.create("marker", b"second").await.unwrap();
    assert_eq!(factory.pending("zone1"), 2);

    let a = factory.create("zone1", "addr-a", "/root").unwrap();
    let b = factory.create("zone1", "addr-b", "/root").unwrap();
    assert_eq!(a.get("marker").await.unwrap().0, b"first");
    assert_eq!(b.get("marker").await.unwrap().0, b"second");

    let err = factory.create("zone1", "addr-c", "/root").err().unwrap();
    assert_eq!(err.kind(), ErrorKind::NoNode);
    assert_eq!(factory.pending("zone1"), 0);
}

#[test]
fn test_handed_out_connection_records_endpoint() {
    let factory = ScriptedFactory::new();
    let conn = factory.add_cell("zone1");
    factory.create("zone1", "10.0.0.1:2379", "/vt").unwrap();
    assert_eq!(conn.cell(), "zone1");
    assert_eq!(conn.server_addr(), "10.0.0.1:2379");
}

#[test]
fn test_unknown_cell() {
    let factory = ScriptedFactory::new();
    let err = factory.create("nowhere", "", "").err().unwrap();
    assert_eq!(err.kind(), ErrorKind::NoNode);
}

#[test]
fn test_global_cell_seeded() {
    let factory = ScriptedFactory::new();
    assert_eq!(factory.cell_names(), vec![GLOBAL_CELL.to_string()]);
    assert!(!factory.has_global_read_only_cell("", ""));
    assert!(factory.create(GLOBAL_CELL, "", "").is_ok());
}

#[test]
fn test_set_cell_replaces_queue() {
    let factory = ScriptedFactory::new();
    factory.add_cell("zone1");
    factory.add_connection("zone1", Arc::new(ScriptedConn::new()));
    factory.set_cell("zone1", Arc::new(ScriptedConn::new()));
    assert_eq!(factory.pending("zone1"), 1);
}

#[tokio::test]
async fn test_from_config_seeds_cells() {
    let config = TopoConfig {
        cells: vec!["zone2".to_string(), "zone1".to_string()],
        watch_channel_capacity: 4,
        ..TopoConfig::default()
    };
    let factory = ScriptedFactory::from_config(&config);
    assert_eq!(
        factory.cell_names(),
        vec!["global".to_string(), "zone1".to_string(), "zone2".to_string()]
    );

    let conn = factory.create("zone1", "", "").unwrap();
    assert_eq!(conn.create("p", b"x").await.unwrap(), Version(1));
}
