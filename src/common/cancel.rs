//! Cancellation signals for long-lived subscriptions
//!
//! A [`CancelHandle`] fires its paired [`CancelSignal`]s. Dropping the handle
//! counts as firing it, so a subscription can never outlive every owner of
//! its handle.

use std::sync::Arc;
use tokio::sync::watch;

/// Fires the signals created alongside it.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

/// Cloneable receiving side of a cancellation.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
    // Keeps a never-firing signal alive without a handle.
    _keepalive: Option<Arc<watch::Sender<bool>>>,
}

/// Create a connected handle/signal pair.
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (
        CancelHandle { tx },
        CancelSignal {
            rx,
            _keepalive: None,
        },
    )
}

impl CancelHandle {
    /// Fire every signal derived from this handle.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            rx: self.tx.subscribe(),
            _keepalive: None,
        }
    }
}

impl CancelSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            rx,
            _keepalive: Some(Arc::new(tx)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolves once the handle fires or is dropped.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_cancel_fires_all_clones() {
        let (handle, signal) = cancel_pair();
        let mut a = signal.clone();
        let mut b = signal;
        assert!(!a.is_cancelled());

        handle.cancel();
        a.cancelled().await;
        b.cancelled().await;
        assert!(a.is_cancelled());
    }

    #[tokio::test]
    async fn test_drop_counts_as_cancel() {
        let (handle, mut signal) = cancel_pair();
        drop(handle);
        tokio::time::timeout(Duration::from_secs(1), signal.cancelled())
            .await
            .unwrap();
        assert!(signal.is_cancelled());
    }

    #[tokio::test]
    async fn test_never_does_not_fire() {
        let mut signal = CancelSignal::never();
        assert!(!signal.is_cancelled());
        let res = tokio::time::timeout(Duration::from_millis(20), signal.cancelled()).await;
        assert!(res.is_err());
    }
}
