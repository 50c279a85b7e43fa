//! Topology server
//!
//! Owns a [`Factory`] and the connection to the global cell. Cell metadata
//! lives in the global cell under `cells/<name>/CellInfo`; per-cell
//! connections are opened lazily from that metadata and cached.

use crate::common::{join_path, Error, Result, TopoConfig};
use crate::querylog::{LogStats, QueryLogger};
use crate::topo::conn::Conn;
use crate::topo::factory::{Factory, ScriptedFactory};
use crate::topo::{GLOBAL_CELL, GLOBAL_READ_ONLY_CELL};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Directory of cell metadata in the global cell
pub const CELLS_PATH: &str = "cells";
/// File holding a cell's [`CellInfo`]
pub const CELL_INFO_FILE: &str = "CellInfo";

/// Where to reach the topology server of one cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellInfo {
    pub server_address: String,
    pub root: String,
}

pub struct TopoServer {
    factory: Arc<dyn Factory>,
    global: Arc<dyn Conn>,
    global_read_only: Arc<dyn Conn>,
    cell_conns: Mutex<HashMap<String, Arc<dyn Conn>>>,
    query_log: Option<QueryLogger>,
}

fn cell_info_path(cell: &str) -> String {
    join_path(&[CELLS_PATH, cell, CELL_INFO_FILE])
}

fn validate_cell_name(cell: &str) -> Result<()> {
    if cell.is_empty() || cell.contains('/') || cell.chars().any(|c| c.is_control()) {
        return Err(Error::InvalidConfig(format!("invalid cell name: {:?}", cell)));
    }
    Ok(())
}

impl TopoServer {
    /// Open the global cell through `factory`.
    pub fn new_with_factory(factory: Arc<dyn Factory>, server_addr: &str, root: &str) -> Result<Self> {
        let global = factory.create(GLOBAL_CELL, server_addr, root)?;
        let global_read_only = if factory.has_global_read_only_cell(server_addr, root) {
            factory.create(GLOBAL_READ_ONLY_CELL, server_addr, root)?
        } else {
            Arc::clone(&global)
        };

        tracing::info!(server_addr, root, "topology server opened global cell");
        Ok(Self {
            factory,
            global,
            global_read_only,
            cell_conns: Mutex::new(HashMap::new()),
            query_log: None,
        })
    }

    pub fn from_config(factory: Arc<dyn Factory>, config: &TopoConfig) -> Result<Self> {
        Self::new_with_factory(factory, &config.server_address, &config.root)
    }

    /// Publish a record for every operation to `logger`.
    pub fn with_query_log(mut self, logger: QueryLogger) -> Self {
        self.query_log = Some(logger);
        self
    }

    pub fn global_conn(&self) -> Arc<dyn Conn> {
        Arc::clone(&self.global)
    }

    async fn observe<T, F>(&self, method: &str, stmt_type: &str, path: &str, op: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let Some(logger) = &self.query_log else {
            return op.await;
        };
        let mut stats = LogStats::new(method, path).with_stmt_type(stmt_type);
        let res = op.await;
        stats.finish(&res);
        logger.send(stats);
        res
    }

    /// Register `cell` in the global cell.
    pub async fn create_cell_info(&self, cell: &str, info: &CellInfo) -> Result<()> {
        validate_cell_name(cell)?;
        let path = cell_info_path(cell);
        self.observe("CreateCellInfo", "create", &path, async {
            let contents = serde_json::to_vec(info)?;
            let version = self.global.create(&path, &contents).await?;
            tracing::debug!(cell, %version, "registered cell");
            Ok::<(), Error>(())
        })
        .await
    }

    pub async fn get_cell_info(&self, cell: &str) -> Result<CellInfo> {
        validate_cell_name(cell)?;
        let path = cell_info_path(cell);
        self.observe("GetCellInfo", "get", &path, async {
            let (contents, _version) = self.global_read_only.get(&path).await?;
            Ok::<CellInfo, Error>(serde_json::from_slice(&contents)?)
        })
        .await
    }

    /// Names of every registered cell, sorted.
    pub async fn get_known_cells(&self) -> Result<Vec<String>> {
        self.observe("GetKnownCells", "list_dir", CELLS_PATH, async {
            match self.global_read_only.list_dir(CELLS_PATH).await {
                Ok(entries) => {
                    let mut names: Vec<String> = entries.into_iter().map(|e| e.name).collect();
                    names.sort();
                    Ok(names)
                }
                Err(Error::NoNode(_)) => Ok(Vec::new()),
                Err(e) => Err(e),
            }
        })
        .await
    }

    /// Connection to `cell`, opened from its [`CellInfo`] on first use.
    pub async fn conn_for_cell(&self, cell: &str) -> Result<Arc<dyn Conn>> {
        if cell == GLOBAL_CELL {
            return Ok(self.global_conn());
        }

        let mut conns = self.cell_conns.lock().await;
        if let Some(conn) = conns.get(cell) {
            return Ok(Arc::clone(conn));
        }

        let info = self.get_cell_info(cell).await?;
        let conn = self.factory.create(cell, &info.server_address, &info.root)?;
        tracing::info!(cell, server_address = %info.server_address, "opened cell connection");
        conns.insert(cell.to_string(), Arc::clone(&conn));
        Ok(conn)
    }
}

fn fatal(message: String) -> ! {
    tracing::error!("{}", message);
    std::process::exit(1)
}

/// Topology server over `factory` with an empty [`CellInfo`] registered for
/// every cell the factory knows.
///
/// Any failure here is a broken test setup, so it terminates the process.
pub async fn new_scripted_topo_server(factory: Arc<ScriptedFactory>) -> TopoServer {
    let cells = factory.cell_names();
    let ts = match TopoServer::new_with_factory(factory, "", "") {
        Ok(ts) => ts,
        Err(e) => fatal(format!("TopoServer::new_with_factory() failed: {}", e)),
    };

    for cell in &cells {
        if let Err(e) = ts.create_cell_info(cell, &CellInfo::default()).await {
            fatal(format!("create_cell_info({}) failed: {}", cell, e));
        }
    }
    ts
}
