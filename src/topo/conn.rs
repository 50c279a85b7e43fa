//! Coordination-service contract
//!
//! A [`Conn`] talks to the topology server of exactly one cell. Paths are
//! relative to the cell root. Every backend translates its own failures into
//! the closed kind set of [`crate::ErrorKind`]:
//!
//! - `NoNode` when the path (or, for `list_dir`, any descendant) is absent
//! - `NodeExists` when an exclusive create hits an existing path
//! - `Timeout` when the backend did not answer in time; for writes this means
//!   the write *may* have been committed
//! - `NoImplementation` when the backend flavor lacks the operation
//! - `Interrupted` when the caller's cancellation fired first
//!
//! Backends never retry on their own; retry and backoff belong to the caller.

use crate::common::{CancelSignal, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;

/// Per-path version, strictly increasing across committed writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version(pub u64);

impl Version {
    /// Version of a freshly created record.
    pub const INITIAL: Version = Version(1);

    pub fn next(self) -> Version {
        Version(self.0 + 1)
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirEntryType {
    File,
    Directory,
}

/// One child of a directory, derived from the stored paths below it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    pub entry_type: DirEntryType,
}

impl DirEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entry_type: DirEntryType::File,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entry_type: DirEntryType::Directory,
        }
    }
}

/// Result row of a prefix listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvInfo {
    pub key: String,
    pub value: Vec<u8>,
    pub version: Version,
}

/// Snapshot of one path, also the payload of every watch event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchData {
    pub contents: Vec<u8>,
    pub version: Version,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchDataRecursive {
    pub path: String,
    pub data: WatchData,
}

/// Receiving end of a watch. Closes when the subscription is cancelled.
pub type WatchStream = mpsc::Receiver<WatchData>;

pub type RecursiveWatchStream = mpsc::Receiver<WatchDataRecursive>;

/// An acquired lock.
#[async_trait]
pub trait LockDescriptor: Send + Sync {
    /// Err when the lock was lost (session expired, connection dropped).
    async fn check(&self) -> Result<()>;

    async fn unlock(&self) -> Result<()>;
}

/// Candidate in a leader election.
#[async_trait]
pub trait LeaderParticipation: Send + Sync {
    /// Blocks until this candidate leads. The returned signal fires when
    /// leadership is lost.
    async fn wait_for_leadership(&self) -> Result<CancelSignal>;

    /// Withdraw the candidacy, releasing leadership if held.
    fn stop(&self);

    async fn get_current_leader_id(&self) -> Result<String>;
}

/// Connection to the topology server of one cell.
#[async_trait]
pub trait Conn: Send + Sync {
    /// Children of `dir_path`. Fails `NoNode` when nothing lives below it.
    async fn list_dir(&self, dir_path: &str) -> Result<Vec<DirEntry>>;

    /// Create `file_path` with `contents`. Exclusive backends fail `NodeExists`
    /// when the path is present.
    async fn create(&self, file_path: &str, contents: &[u8]) -> Result<Version>;

    /// Write `contents` to `file_path`.
    ///
    /// With `version == None` the write is unconditional and creates the path
    /// if needed, bypassing optimistic concurrency entirely. With
    /// `Some(version)` the path must exist.
    async fn update(
        &self,
        file_path: &str,
        contents: &[u8],
        version: Option<Version>,
    ) -> Result<Version>;

    async fn get(&self, file_path: &str) -> Result<(Vec<u8>, Version)>;

    /// Contents of `file_path` as of a past version.
    async fn get_version(&self, file_path: &str, version: i64) -> Result<Vec<u8>>;

    /// Every key starting with `file_path_prefix`.
    async fn list(&self, file_path_prefix: &str) -> Result<Vec<KvInfo>>;

    async fn delete(&self, file_path: &str, version: Option<Version>) -> Result<()>;

    /// Take the lock on `dir_path`, waiting as long as needed.
    async fn lock(&self, dir_path: &str, contents: &str) -> Result<Box<dyn LockDescriptor>>;

    /// Like [`Conn::lock`], releasing the lock if the holder stops refreshing it for `ttl`.
    async fn lock_with_ttl(
        &self,
        dir_path: &str,
        contents: &str,
        ttl: Duration,
    ) -> Result<Box<dyn LockDescriptor>>;

    /// Lock on a name rather than an existing directory.
    async fn lock_name(&self, dir_path: &str, contents: &str) -> Result<Box<dyn LockDescriptor>>;

    /// Like [`Conn::lock`] but fails instead of waiting when the lock is held.
    async fn try_lock(&self, dir_path: &str, contents: &str) -> Result<Box<dyn LockDescriptor>>;

    /// Current snapshot of `file_path` plus a stream of every later change,
    /// in commit order. The stream closes once `cancel` fires.
    async fn watch(&self, file_path: &str, cancel: CancelSignal) -> Result<(WatchData, WatchStream)>;

    async fn watch_recursive(
        &self,
        path: &str,
        cancel: CancelSignal,
    ) -> Result<(Vec<WatchDataRecursive>, RecursiveWatchStream)>;

    fn new_leader_participation(&self, name: &str, id: &str) -> Result<Box<dyn LeaderParticipation>>;

    fn close(&self);
}
