//! Scripted in-memory connection
//!
//! [`ScriptedConn`] implements [`Conn`] entirely in memory so that callers'
//! retry and recovery paths can be driven deterministically:
//!
//! - records live in a [`VersionedRecordStore`]
//! - `get`, `list` and `update` first pop a scripted outcome from
//!   [`FaultQueues`]; a failing conditional `update` may still commit
//!   (`write_persists`), modelling a write whose acknowledgement was lost.
//!   Unconditional updates pop an outcome too but always commit
//! - `list` answers only from results registered with
//!   [`ScriptedConn::add_list_result`], while `list_dir` is derived from the
//!   stored records
//! - locks never block and never conflict; they only exercise the caller's
//!   control flow
//!
//! One mutex guards all state for the full duration of each operation, so
//! operations on a connection never interleave and watchers see changes in
//! commit order. Delete, recursive watches, leader election and close are
//! not modelled; calling them is a harness bug and panics.

use crate::common::{CancelSignal, Error, Result};
use crate::topo::conn::{
    Conn, DirEntry, KvInfo, LeaderParticipation, LockDescriptor, RecursiveWatchStream, Version,
    WatchData, WatchDataRecursive, WatchStream,
};
use crate::topo::faults::{FaultQueues, UpdateFault};
use crate::topo::store::VersionedRecordStore;
use crate::topo::watch::WatchRegistry;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::Mutex;

/// Default capacity of a watch subscription channel
pub const DEFAULT_WATCH_CAPACITY: usize = 100;

#[derive(Debug, Default, Clone)]
struct Endpoint {
    cell: String,
    server_addr: String,
}

#[derive(Debug)]
struct ConnState {
    records: VersionedRecordStore,
    list_results: HashMap<String, Vec<KvInfo>>,
    faults: FaultQueues,
    watches: WatchRegistry,
}

pub struct ScriptedConn {
    endpoint: RwLock<Endpoint>,
    state: Arc<Mutex<ConnState>>,
    exclusive_create: bool,
}

impl ScriptedConn {
    pub fn new() -> Self {
        Self::with_watch_capacity(DEFAULT_WATCH_CAPACITY)
    }

    pub fn with_watch_capacity(capacity: usize) -> Self {
        Self {
            endpoint: RwLock::new(Endpoint::default()),
            state: Arc::new(Mutex::new(ConnState {
                records: VersionedRecordStore::new(),
                list_results: HashMap::new(),
                faults: FaultQueues::new(),
                watches: WatchRegistry::new(capacity),
            })),
            exclusive_create: false,
        }
    }

    /// Make `create` fail `NodeExists` on an existing path instead of
    /// overwriting it.
    pub fn with_exclusive_create(mut self) -> Self {
        self.exclusive_create = true;
        self
    }

    // === Scripting ===

    /// Queue the outcome of a future `get`.
    pub async fn add_get_error(&self, should_error: bool) {
        self.state.lock().await.faults.push_get(should_error);
    }

    /// Queue the outcome of a future `list`.
    pub async fn add_list_error(&self, should_error: bool) {
        self.state.lock().await.faults.push_list(should_error);
    }

    /// Queue the outcome of a future `update`.
    pub async fn add_update_error(&self, should_error: bool, write_persists: bool) {
        self.state.lock().await.faults.push_update(UpdateFault {
            should_error,
            write_persists,
        });
    }

    /// Register the answer `list` gives for exactly `file_path_prefix`.
    pub async fn add_list_result(&self, file_path_prefix: &str, result: Vec<KvInfo>) {
        self.state
            .lock()
            .await
            .list_results
            .insert(file_path_prefix.to_string(), result);
    }

    // === Introspection ===

    /// Cell this connection was handed out for ("" until a factory hands it out).
    pub fn cell(&self) -> String {
        self.endpoint
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .cell
            .clone()
    }

    pub fn server_addr(&self) -> String {
        self.endpoint
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .server_addr
            .clone()
    }

    pub(crate) fn set_endpoint(&self, cell: &str, server_addr: &str) {
        let mut endpoint = self.endpoint.write().unwrap_or_else(PoisonError::into_inner);
        endpoint.cell = cell.to_string();
        endpoint.server_addr = server_addr.to_string();
    }

    /// Live watch subscriptions on `path`.
    pub async fn watch_count(&self, path: &str) -> usize {
        self.state.lock().await.watches.count(path)
    }

    /// Scripted outcomes not yet consumed, as (get, list, update).
    pub async fn pending_faults(&self) -> (usize, usize, usize) {
        self.state.lock().await.faults.pending()
    }
}

impl Default for ScriptedConn {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScriptedConn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedConn")
            .field("cell", &self.cell())
            .field("server_addr", &self.server_addr())
            .field("exclusive_create", &self.exclusive_create)
            .finish_non_exhaustive()
    }
}

/// Lock that never conflicts with any other holder.
#[derive(Debug)]
struct ScriptedLock {
    dir_path: String,
}

#[async_trait]
impl LockDescriptor for ScriptedLock {
    async fn check(&self) -> Result<()> {
        Ok(())
    }

    async fn unlock(&self) -> Result<()> {
        tracing::debug!(dir_path = %self.dir_path, "scripted lock released");
        Ok(())
    }
}

impl ScriptedConn {
    async fn acquire(&self, dir_path: &str, contents: &str) -> Result<Box<dyn LockDescriptor>> {
        let _state = self.state.lock().await;
        tracing::debug!(cell = %self.cell(), dir_path, contents, "scripted lock acquired");
        Ok(Box::new(ScriptedLock {
            dir_path: dir_path.to_string(),
        }))
    }
}

#[async_trait]
impl Conn for ScriptedConn {
    async fn list_dir(&self, dir_path: &str) -> Result<Vec<DirEntry>> {
        let state = self.state.lock().await;
        let entries = state.records.children(dir_path);
        if entries.is_empty() {
            return Err(Error::NoNode(dir_path.to_string()));
        }
        Ok(entries)
    }

    async fn create(&self, file_path: &str, contents: &[u8]) -> Result<Version> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        if self.exclusive_create && state.records.contains(file_path) {
            return Err(Error::NodeExists(file_path.to_string()));
        }

        let data = state.records.put(file_path, contents).to_watch_data();
        state.watches.notify(file_path, &data).await;
        Ok(data.version)
    }

    async fn update(
        &self,
        file_path: &str,
        contents: &[u8],
        version: Option<Version>,
    ) -> Result<Version> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let fault = state.faults.next_update();

        if version.is_none() {
            // Unconditional writes consume a scripted outcome but never obey it.
            tracing::trace!(path = file_path, ?fault, "scripted update outcome ignored");
            let data = state.records.put(file_path, contents).to_watch_data();
            state.watches.notify(file_path, &data).await;
            return Ok(data.version);
        }

        // Only existence is checked: the expected version is not compared
        // against the stored one.
        if !state.records.contains(file_path) {
            return Err(Error::NoNode(file_path.to_string()));
        }

        let current = if fault.write_persists {
            let data = state.records.put(file_path, contents).to_watch_data();
            state.watches.notify(file_path, &data).await;
            Some(data.version)
        } else {
            state.records.get(file_path).map(|r| r.version)
        };

        if fault.should_error {
            tracing::debug!(
                cell = %self.cell(),
                path = file_path,
                committed = fault.write_persists,
                "scripted update timeout"
            );
            return Err(Error::Timeout(file_path.to_string()));
        }

        current.ok_or_else(|| Error::NoNode(file_path.to_string()))
    }

    async fn get(&self, file_path: &str) -> Result<(Vec<u8>, Version)> {
        let mut state = self.state.lock().await;
        if state.faults.next_get() {
            tracing::debug!(cell = %self.cell(), path = file_path, "scripted get timeout");
            return Err(Error::Timeout(file_path.to_string()));
        }
        state
            .records
            .get(file_path)
            .map(|r| (r.contents.clone(), r.version))
            .ok_or_else(|| Error::NoNode(file_path.to_string()))
    }

    async fn get_version(&self, _file_path: &str, _version: i64) -> Result<Vec<u8>> {
        Err(Error::NoImplementation(
            "get_version is not supported by the scripted connection".into(),
        ))
    }

    async fn list(&self, file_path_prefix: &str) -> Result<Vec<KvInfo>> {
        let mut state = self.state.lock().await;
        if state.faults.next_list() {
            tracing::debug!(cell = %self.cell(), prefix = file_path_prefix, "scripted list timeout");
            return Err(Error::Timeout(file_path_prefix.to_string()));
        }
        state
            .list_results
            .get(file_path_prefix)
            .cloned()
            .ok_or_else(|| Error::NoNode(file_path_prefix.to_string()))
    }

    async fn delete(&self, file_path: &str, _version: Option<Version>) -> Result<()> {
        unimplemented!("delete({}) is not supported by the scripted connection", file_path)
    }

    async fn lock(&self, dir_path: &str, contents: &str) -> Result<Box<dyn LockDescriptor>> {
        self.acquire(dir_path, contents).await
    }

    async fn lock_with_ttl(
        &self,
        dir_path: &str,
        contents: &str,
        _ttl: Duration,
    ) -> Result<Box<dyn LockDescriptor>> {
        self.acquire(dir_path, contents).await
    }

    async fn lock_name(&self, dir_path: &str, contents: &str) -> Result<Box<dyn LockDescriptor>> {
        self.acquire(dir_path, contents).await
    }

    async fn try_lock(&self, dir_path: &str, contents: &str) -> Result<Box<dyn LockDescriptor>> {
        self.lock(dir_path, contents).await
    }

    async fn watch(&self, file_path: &str, cancel: CancelSignal) -> Result<(WatchData, WatchStream)> {
        if cancel.is_cancelled() {
            return Err(Error::Interrupted(format!("watch on {}", file_path)));
        }

        let (current, id, notifications) = {
            let mut state = self.state.lock().await;
            let current = state
                .records
                .get(file_path)
                .map(|r| r.to_watch_data())
                .ok_or_else(|| Error::NoNode(file_path.to_string()))?;
            let (id, rx) = state.watches.subscribe(file_path, cancel.clone());
            (current, id, rx)
        };

        let state = Arc::clone(&self.state);
        let path = file_path.to_string();
        let mut cancel = cancel;
        tokio::spawn(async move {
            cancel.cancelled().await;
            if state.lock().await.watches.unsubscribe(&path, id) {
                tracing::debug!(path = %path, subscription = id, "watch cancelled");
            }
        });

        Ok((current, notifications))
    }

    async fn watch_recursive(
        &self,
        path: &str,
        _cancel: CancelSignal,
    ) -> Result<(Vec<WatchDataRecursive>, RecursiveWatchStream)> {
        unimplemented!("watch_recursive({}) is not supported by the scripted connection", path)
    }

    fn new_leader_participation(&self, name: &str, id: &str) -> Result<Box<dyn LeaderParticipation>> {
        unimplemented!(
            "new_leader_participation({}, {}) is not supported by the scripted connection",
            name,
            id
        )
    }

    fn close(&self) {
        unimplemented!("close is not supported by the scripted connection")
    }
}
