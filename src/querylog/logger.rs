//! Producer side of the operation log

use crate::querylog::stats::LogStats;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;

/// Bounded broadcast of finished operations. Cheap to clone.
#[derive(Debug, Clone)]
pub struct QueryLogger {
    tx: broadcast::Sender<Arc<LogStats>>,
}

impl QueryLogger {
    pub fn new(buffer_size: usize) -> Self {
        let (tx, _rx) = broadcast::channel(buffer_size.max(1));
        Self { tx }
    }

    /// Publish a record. Never blocks; with no subscriber the record is dropped.
    pub fn send(&self, stats: LogStats) {
        if self.tx.send(Arc::new(stats)).is_err() {
            tracing::trace!("no operation log subscribers, record dropped");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<LogStats>> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Collect up to `limit` records, giving up once `timeout` has elapsed.
///
/// A receiver that fell behind skips what it missed and keeps going.
pub async fn drain(
    rx: &mut broadcast::Receiver<Arc<LogStats>>,
    limit: usize,
    timeout: Duration,
) -> Vec<Arc<LogStats>> {
    let deadline = Instant::now() + timeout;
    let mut records = Vec::new();

    while records.len() < limit {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Ok(stats)) => records.push(stats),
            Ok(Err(broadcast::error::RecvError::Lagged(missed))) => {
                tracing::warn!(missed, "operation log reader lagged");
            }
            Ok(Err(broadcast::error::RecvError::Closed)) | Err(_) => break,
        }
    }

    records
}
