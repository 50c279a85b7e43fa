//! Topology server bootstrap, cell metadata and operation logging

use std::sync::Arc;
use std::time::Duration;
use topokit::common::QueryLogConfig;
use topokit::querylog::{drain, render_querylogz, QueryLogger};
use topokit::topo::{
    new_scripted_topo_server, CellInfo, Conn, ScriptedFactory, TopoServer, Version,
};
use topokit::ErrorKind;

#[tokio::test]
async fn test_scripted_server_registers_cells() {
    let factory = Arc::new(ScriptedFactory::new());
    factory.add_cell("zone2");
    factory.add_cell("zone1");

    let ts = new_scripted_topo_server(Arc::clone(&factory)).await;
    assert_eq!(ts.get_known_cells().await.unwrap(), vec!["global", "zone1", "zone2"]);
    assert_eq!(ts.get_cell_info("zone1").await.unwrap(), CellInfo::default());
}

#[tokio::test]
async fn test_conn_for_cell_is_cached() {
    let factory = Arc::new(ScriptedFactory::new());
    let zone1 = factory.add_cell("zone1");
    zone1.create("keyspaces/ks1", b"shards").await.unwrap();

    let ts = new_scripted_topo_server(Arc::clone(&factory)).await;
    let first = ts.conn_for_cell("zone1").await.unwrap();
    assert_eq!(factory.pending("zone1"), 0);

    // The queue is empty now, so a second open would fail.
    let second = ts.conn_for_cell("zone1").await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(
        second.get("keyspaces/ks1").await.unwrap(),
        (b"shards".to_vec(), Version(1))
    );
}

#[tokio::test]
async fn test_conn_for_unknown_cell() {
    let factory = Arc::new(ScriptedFactory::new());
    let ts = new_scripted_topo_server(factory).await;
    let err = ts.conn_for_cell("zone9").await.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::NoNode);
}

#[tokio::test]
async fn test_retry_after_half_failed_write_through_server() {
    let factory = Arc::new(ScriptedFactory::new());
    let zone1 = factory.add_cell("zone1");
    zone1.create("shard/0", b"serving=false").await.unwrap();
    zone1.add_update_error(true, true).await;

    let ts = new_scripted_topo_server(factory).await;
    let conn = ts.conn_for_cell("zone1").await.unwrap();

    let err = conn
        .update("shard/0", b"serving=true", Some(Version(1)))
        .await
        .unwrap_err();
    assert!(err.is_retryable());

    // A retry that rereads sees the write landed.
    let (contents, version) = conn.get("shard/0").await.unwrap();
    assert_eq!(contents, b"serving=true");
    assert_eq!(version, Version(2));
}

#[tokio::test]
async fn test_known_cells_empty_without_registrations() {
    let factory = Arc::new(ScriptedFactory::new());
    let ts = TopoServer::new_with_factory(factory, "", "").unwrap();
    assert!(ts.get_known_cells().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_operations_are_logged() {
    let factory = Arc::new(ScriptedFactory::new());
    let logger = QueryLogger::new(16);
    let mut rx = logger.subscribe();
    let ts = TopoServer::new_with_factory(factory, "", "")
        .unwrap()
        .with_query_log(logger);

    ts.create_cell_info("zone1", &CellInfo::default()).await.unwrap();
    assert!(ts.get_cell_info("zone2").await.is_err());

    let records = drain(&mut rx, 2, Duration::from_secs(1)).await;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].method, "CreateCellInfo");
    assert_eq!(records[0].text, "cells/zone1/CellInfo");
    assert!(records[0].error.is_none());
    assert_eq!(records[1].method, "GetCellInfo");
    assert!(records[1].error.is_some());

    let page = render_querylogz(&records, &QueryLogConfig::default());
    assert!(page.contains("CreateCellInfo"));
    assert!(page.contains("cells/zone2/CellInfo"));
}

#[tokio::test]
async fn test_metadata_reads_are_logged() {
    let factory = Arc::new(ScriptedFactory::new());
    factory.add_cell("zone1");
    let logger = QueryLogger::new(16);
    let ts = new_scripted_topo_server(factory)
        .await
        .with_query_log(logger.clone());
    let mut rx = logger.subscribe();

    let cells = ts.get_known_cells().await.unwrap();
    for cell in &cells {
        ts.get_cell_info(cell).await.unwrap();
    }

    let records = drain(&mut rx, 3, Duration::from_secs(1)).await;
    let methods: Vec<_> = records.iter().map(|r| r.method.as_str()).collect();
    assert_eq!(methods, vec!["GetKnownCells", "GetCellInfo", "GetCellInfo"]);
    assert_eq!(records[0].text, "cells");
    assert!(records.iter().all(|r| r.error.is_none()));
}
