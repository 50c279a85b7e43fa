//! Topology coordination contract and its scripted backend
//!
//! - [`conn`]: the [`Conn`] contract every backend implements
//! - [`scripted`]: in-memory backend with fault injection, built from
//!   [`store`], [`watch`] and [`faults`]
//! - [`factory`]: opening connections per cell, including scripted hand-out
//! - [`server`]: composition root tracking cell metadata in the global cell

pub mod conn;
pub mod factory;
pub mod faults;
pub mod scripted;
pub mod server;
pub mod store;
pub mod watch;

pub use conn::{
    Conn, DirEntry, DirEntryType, KvInfo, LeaderParticipation, LockDescriptor, Version, WatchData,
    WatchDataRecursive, WatchStream,
};
pub use factory::{Factory, ScriptedFactory};
pub use scripted::ScriptedConn;
pub use server::{new_scripted_topo_server, CellInfo, TopoServer};

/// Cell holding cross-cell metadata
pub const GLOBAL_CELL: &str = "global";

/// Read-only replica of the global cell, when a factory provides one
pub const GLOBAL_READ_ONLY_CELL: &str = "global-read-only";
