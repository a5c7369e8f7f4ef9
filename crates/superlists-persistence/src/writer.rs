use crate::traits::{KeyValueStore, StoreMap};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// A write queued for the background writer.
#[derive(Debug)]
pub enum StoreOp {
    Set(StoreMap),
    Remove(String),
    Clear,
    /// Replies once every earlier operation has completed.
    Flush(oneshot::Sender<()>),
}

/// Fire-and-forget access to the store.
///
/// Writes never block the caller and their failures are never returned:
/// they are logged and kept as the last error.
#[derive(Debug, Clone)]
pub struct PersistHandle {
    tx: mpsc::UnboundedSender<StoreOp>,
    last_error: Arc<Mutex<Option<String>>>,
}

impl PersistHandle {
    pub fn set(&self, entries: StoreMap) {
        self.send(StoreOp::Set(entries));
    }

    pub fn remove(&self, key: impl Into<String>) {
        self.send(StoreOp::Remove(key.into()));
    }

    pub fn clear(&self) {
        self.send(StoreOp::Clear);
    }

    /// Waits until queued writes have reached the store.
    pub async fn flush(&self) {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(StoreOp::Flush(reply_tx));
        if reply_rx.await.is_err() {
            tracing::warn!("Store writer stopped before flushing");
        }
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    fn send(&self, op: StoreOp) {
        tracing::debug!(?op, "Queueing store write");
        if let Err(e) = self.tx.send(op) {
            tracing::error!("Failed to queue store write: channel closed: {:?}", e.0);
            *self.last_error.lock() = Some("store writer is not running".to_string());
        }
    }
}

/// Starts the background writer. It runs until every handle is dropped.
pub fn spawn_writer(store: Arc<dyn KeyValueStore>) -> (PersistHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<StoreOp>();
    let last_error = Arc::new(Mutex::new(None));
    let worker_error = Arc::clone(&last_error);

    let task = tokio::spawn(async move {
        while let Some(op) = rx.recv().await {
            let (what, result) = match op {
                StoreOp::Set(entries) => ("set", store.set(entries).await),
                StoreOp::Remove(key) => ("remove", store.remove(&key).await),
                StoreOp::Clear => ("clear", store.clear().await),
                StoreOp::Flush(reply) => {
                    let _ = reply.send(());
                    continue;
                }
            };
            if let Err(e) = result {
                tracing::warn!("Store {} failed: {}", what, e);
                *worker_error.lock() = Some(e.to_string());
            }
        }
        tracing::debug!("Store writer finished");
    });

    (PersistHandle { tx, last_error }, task)
}
