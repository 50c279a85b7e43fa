//! # topokit
//!
//! Pluggable topology coordination for a sharded database cluster:
//! - Hierarchical, versioned key-value records per cell
//! - Path-scoped watches delivered in commit order
//! - Advisory locks and leader participation (contract only)
//! - A scripted in-memory backend with fault injection, so retry and
//!   recovery logic above it can be tested deterministically
//! - An operation log side channel rendered as an HTML report
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │               TopoServer                 │
//! │  global cell: cells/<name>/CellInfo      │
//! └───────────┬──────────────────────────────┘
//!             │ Factory::create(cell, addr, root)
//!   ┌─────────┴──────────┬───────────────┐
//!   │                    │               │
//! ┌─▼──────────┐   ┌─────▼──────┐   ┌────▼───────┐
//! │ Conn       │   │ Conn       │   │ Conn       │
//! │ (global)   │   │ (zone1)    │   │ (zone2)    │
//! │ records    │   │ records    │   │ records    │
//! │ watches    │   │ watches    │   │ watches    │
//! │ faults     │   │ faults     │   │ faults     │
//! └────────────┘   └────────────┘   └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use topokit::topo::{new_scripted_topo_server, Conn, ScriptedFactory, Version};
//!
//! # async fn demo() -> topokit::Result<()> {
//! let factory = Arc::new(ScriptedFactory::new());
//! let zone1 = factory.add_cell("zone1");
//! zone1.create("keyspaces/ks1/Keyspace", b"{}").await?;
//! // Second update times out but still lands.
//! zone1.add_update_error(true, true).await;
//!
//! let ts = new_scripted_topo_server(Arc::clone(&factory)).await;
//! let conn = ts.conn_for_cell("zone1").await?;
//! assert!(conn.update("keyspaces/ks1/Keyspace", b"{\"a\":1}", Some(Version(1))).await.is_err());
//! assert_eq!(conn.get("keyspaces/ks1/Keyspace").await?.1, Version(2));
//! # Ok(())
//! # }
//! ```

pub mod common;
pub mod querylog;
pub mod topo;

// Re-export commonly used types
pub use common::{Config, Error, ErrorKind, Result};
pub use topo::{Conn, Factory, ScriptedConn, ScriptedFactory, TopoServer};

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build info
pub const BUILD_INFO: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("CARGO_PKG_NAME"), ")");
