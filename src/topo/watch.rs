//! Watch registry
//!
//! Subscribers are grouped by the exact path they watch. Each one carries an
//! id so it can be removed alone; removing it drops the sender, which closes
//! the subscriber's stream once buffered events are drained. A subscriber
//! whose cancel signal fires is dropped even while fan-out waits on its full
//! channel.

use crate::common::CancelSignal;
use crate::topo::conn::{WatchData, WatchStream};
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Identifies one subscription within a registry.
pub type SubscriptionId = u64;

#[derive(Debug)]
struct Subscriber {
    id: SubscriptionId,
    tx: mpsc::Sender<WatchData>,
    cancel: CancelSignal,
}

#[derive(Debug)]
pub struct WatchRegistry {
    watches: HashMap<String, Vec<Subscriber>>,
    next_id: SubscriptionId,
    capacity: usize,
}

impl WatchRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            watches: HashMap::new(),
            next_id: 1,
            capacity: capacity.max(1),
        }
    }

    /// Register a new subscriber on `path`.
    pub fn subscribe(&mut self, path: &str, cancel: CancelSignal) -> (SubscriptionId, WatchStream) {
        let (tx, rx) = mpsc::channel(self.capacity);
        let id = self.next_id;
        self.next_id += 1;
        self.watches
            .entry(path.to_string())
            .or_default()
            .push(Subscriber { id, tx, cancel });
        (id, rx)
    }

    /// Remove one subscriber, leaving every other one untouched.
    pub fn unsubscribe(&mut self, path: &str, id: SubscriptionId) -> bool {
        let Some(subscribers) = self.watches.get_mut(path) else {
            return false;
        };
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        let removed = subscribers.len() != before;
        if subscribers.is_empty() {
            self.watches.remove(path);
        }
        removed
    }

    /// Deliver `data` to every subscriber of `path`, in registration order.
    ///
    /// Waits for channel space rather than dropping an event, unless the
    /// subscriber is cancelled meanwhile. Subscribers whose receiver is gone
    /// or whose signal fired are removed. Returns the number of deliveries.
    pub async fn notify(&mut self, path: &str, data: &WatchData) -> usize {
        let Some(subscribers) = self.watches.get_mut(path) else {
            return 0;
        };

        let mut delivered = 0;
        let mut gone = Vec::new();
        for sub in subscribers.iter_mut() {
            let sent = tokio::select! {
                biased;
                _ = sub.cancel.cancelled() => false,
                res = sub.tx.send(data.clone()) => res.is_ok(),
            };
            if sent {
                delivered += 1;
            } else {
                gone.push(sub.id);
            }
        }

        if !gone.is_empty() {
            tracing::debug!(path, dropped = gone.len(), "pruning closed or cancelled watch subscribers");
            subscribers.retain(|s| !gone.contains(&s.id));
            if subscribers.is_empty() {
                self.watches.remove(path);
            }
        }
        delivered
    }

    /// Live subscribers on `path`.
    pub fn count(&self, path: &str) -> usize {
        self.watches.get(path).map_or(0, Vec::len)
    }
}
