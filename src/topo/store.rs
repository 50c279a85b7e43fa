//! Versioned record store
//!
//! Maps a path to its contents and version. A committed write always moves
//! the version forward: a fresh path starts at 1, any later write (including
//! an overwrite) bumps it by one, so a version is never handed out twice for
//! the same path.

use crate::common::child_prefix;
use crate::topo::conn::{DirEntry, Version, WatchData};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub contents: Vec<u8>,
    pub version: Version,
}

impl Record {
    pub fn to_watch_data(&self) -> WatchData {
        WatchData {
            contents: self.contents.clone(),
            version: self.version,
        }
    }
}

#[derive(Debug, Default)]
pub struct VersionedRecordStore {
    records: BTreeMap<String, Record>,
}

impl VersionedRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<&Record> {
        self.records.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.records.contains_key(path)
    }

    /// Commit `contents` at `path` and return the resulting record.
    pub fn put(&mut self, path: &str, contents: &[u8]) -> &Record {
        let version = match self.records.get(path) {
            Some(existing) => existing.version.next(),
            None => Version::INITIAL,
        };
        let record = self
            .records
            .entry(path.to_string())
            .or_insert_with(|| Record {
                contents: Vec::new(),
                version,
            });
        record.contents = contents.to_vec();
        record.version = version;
        record
    }

    /// Immediate children of `dir_path`, synthesized from the stored paths.
    ///
    /// A child with nothing below it is a file; anything else is a
    /// directory. Each name appears once, in path order.
    pub fn children(&self, dir_path: &str) -> Vec<DirEntry> {
        let prefix = child_prefix(dir_path);
        let mut entries: Vec<DirEntry> = Vec::new();

        for path in self.records.keys() {
            let Some(remaining) = path.strip_prefix(prefix.as_str()) else {
                continue;
            };
            if remaining.is_empty() {
                continue;
            }
            let entry = match remaining.split_once('/') {
                None => DirEntry::file(remaining),
                Some((dir, _)) => DirEntry::directory(dir),
            };
            if !entries.iter().any(|e| e.name == entry.name) {
                entries.push(entry);
            }
        }

        entries
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
