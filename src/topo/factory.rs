//! Connection factories
//!
//! A [`Factory`] opens the [`Conn`] for a cell. [`ScriptedFactory`] hands out
//! pre-registered [`ScriptedConn`]s instead, one per `create` call, in
//! registration order. A script like "first attempt fails, second succeeds"
//! is just a queue with one entry, so reconnect logic can be tested
//! deterministically.

use crate::common::{Error, Result, TopoConfig};
use crate::topo::conn::Conn;
use crate::topo::scripted::ScriptedConn;
use crate::topo::GLOBAL_CELL;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

/// Opens connections to the topology server of a cell.
pub trait Factory: Send + Sync {
    /// Whether a read-only replica of the global cell is configured.
    fn has_global_read_only_cell(&self, server_addr: &str, root: &str) -> bool;

    fn create(&self, cell: &str, server_addr: &str, root: &str) -> Result<Arc<dyn Conn>>;
}

pub struct ScriptedFactory {
    // Independent of every connection's own lock.
    cells: Mutex<HashMap<String, VecDeque<Arc<ScriptedConn>>>>,
    watch_capacity: usize,
}

impl ScriptedFactory {
    /// Factory with a single connection registered for the global cell.
    pub fn new() -> Self {
        Self::with_watch_capacity(crate::topo::scripted::DEFAULT_WATCH_CAPACITY)
    }

    fn with_watch_capacity(watch_capacity: usize) -> Self {
        let mut cells = HashMap::new();
        cells.insert(
            GLOBAL_CELL.to_string(),
            VecDeque::from([Arc::new(ScriptedConn::with_watch_capacity(watch_capacity))]),
        );
        Self {
            cells: Mutex::new(cells),
            watch_capacity,
        }
    }

    /// Factory with the global cell plus every configured cell.
    pub fn from_config(config: &TopoConfig) -> Self {
        let factory = Self::with_watch_capacity(config.watch_channel_capacity);
        for cell in &config.cells {
            factory.add_cell(cell);
        }
        factory
    }

    fn lock_cells(&self) -> std::sync::MutexGuard<'_, HashMap<String, VecDeque<Arc<ScriptedConn>>>> {
        self.cells.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a fresh connection as the only one for `cell` and return it
    /// so records and faults can be seeded before it is handed out.
    pub fn add_cell(&self, cell: &str) -> Arc<ScriptedConn> {
        let conn = Arc::new(ScriptedConn::with_watch_capacity(self.watch_capacity));
        self.lock_cells()
            .insert(cell.to_string(), VecDeque::from([Arc::clone(&conn)]));
        conn
    }

    /// Replace the queue of `cell` with `conn` alone.
    pub fn set_cell(&self, cell: &str, conn: Arc<ScriptedConn>) {
        self.lock_cells().insert(cell.to_string(), VecDeque::from([conn]));
    }

    /// Append `conn` to the queue of `cell`, registering the cell if needed.
    pub fn add_connection(&self, cell: &str, conn: Arc<ScriptedConn>) {
        self.lock_cells().entry(cell.to_string()).or_default().push_back(conn);
    }

    /// Registered cell names, sorted. Cells whose queue ran dry are included.
    pub fn cell_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock_cells().keys().cloned().collect();
        names.sort();
        names
    }

    /// Connections still queued for `cell`.
    pub fn pending(&self, cell: &str) -> usize {
        self.lock_cells().get(cell).map_or(0, VecDeque::len)
    }

    /// Pop the next connection for `cell`, stamped with the requested address.
    pub fn create_scripted(&self, cell: &str, server_addr: &str) -> Result<Arc<ScriptedConn>> {
        let conn = self
            .lock_cells()
            .get_mut(cell)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| Error::NoNode(cell.to_string()))?;

        conn.set_endpoint(cell, server_addr);
        tracing::debug!(
            cell,
            server_addr,
            remaining = self.pending(cell),
            "handing out scripted connection"
        );
        Ok(conn)
    }
}

impl Default for ScriptedFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl Factory for ScriptedFactory {
    fn has_global_read_only_cell(&self, _server_addr: &str, _root: &str) -> bool {
        false
    }

    fn create(&self, cell: &str, server_addr: &str, _root: &str) -> Result<Arc<dyn Conn>> {
        let conn: Arc<dyn Conn> = self.create_scripted(cell, server_addr)?;
        Ok(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_global_cell_seeded() {
        let factory = ScriptedFactory::new();
        assert_eq!(factory.cell_names(), vec![GLOBAL_CELL.to_string()]);
        assert_eq!(factory.pending(GLOBAL_CELL), 1);
        assert!(!factory.has_global_read_only_cell("", ""));
    }

    #[test]
    fn test_create_stamps_endpoint() {
        let factory = ScriptedFactory::new();
        let conn = factory.add_cell("zone1");
        assert_eq!(conn.cell(), "");

        let handed = factory.create_scripted("zone1", "zone1-topo:2379").unwrap();
        assert!(Arc::ptr_eq(&conn, &handed));
        assert_eq!(conn.cell(), "zone1");
        assert_eq!(conn.server_addr(), "zone1-topo:2379");
    }

    #[test]
    fn test_unknown_and_exhausted_cells() {
        let factory = ScriptedFactory::new();
        let err = factory.create("nowhere", "", "").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NoNode);

        factory.add_cell("zone1");
        assert!(factory.create("zone1", "", "").is_ok());
        let err = factory.create("zone1", "", "").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NoNode);
        assert!(factory.cell_names().contains(&"zone1".to_string()));
    }

    #[test]
    fn test_set_cell_replaces_queue() {
        let factory = ScriptedFactory::new();
        factory.add_connection("zone1", Arc::new(ScriptedConn::new()));
        factory.add_connection("zone1", Arc::new(ScriptedConn::new()));
        assert_eq!(factory.pending("zone1"), 2);

        let replacement = Arc::new(ScriptedConn::new());
        factory.set_cell("zone1", Arc::clone(&replacement));
        assert_eq!(factory.pending("zone1"), 1);
        let handed = factory.create_scripted("zone1", "").unwrap();
        assert!(Arc::ptr_eq(&replacement, &handed));
    }

    #[test]
    fn test_from_config() {
        let config = TopoConfig {
            cells: vec!["zone1".into(), "zone2".into()],
            ..Default::default()
        };
        let factory = ScriptedFactory::from_config(&config);
        assert_eq!(factory.cell_names(), vec![GLOBAL_CELL, "zone1", "zone2"]);
    }
}
