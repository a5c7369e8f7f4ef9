use crate::events::{BoardEvent, EventKind};
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use superlists_core::SuperListsResult;

/// A subscriber callback. `C` is the context handed to every listener, which
/// lets the session pass the document and reconciler without shared ownership.
pub type Listener<C> = Box<dyn FnMut(&BoardEvent, &mut C) -> SuperListsResult<()>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Synchronous publish/subscribe keyed by [`EventKind`].
///
/// Listeners run in subscription order. A listener that returns an error or
/// panics is logged and skipped; the remaining listeners still run.
pub struct EventBus<C> {
    listeners: BTreeMap<EventKind, Vec<(SubscriptionId, Listener<C>)>>,
    next_id: u64,
}

impl<C> Default for EventBus<C> {
    fn default() -> Self {
        Self {
            listeners: BTreeMap::new(),
            next_id: 0,
        }
    }
}

impl<C> EventBus<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, kind: EventKind, listener: F) -> SubscriptionId
    where
        F: FnMut(&BoardEvent, &mut C) -> SuperListsResult<()> + 'static,
    {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.listeners
            .entry(kind)
            .or_default()
            .push((id, Box::new(listener)));
        id
    }

    /// Returns whether the subscription existed.
    pub fn unsubscribe(&mut self, kind: EventKind, id: SubscriptionId) -> bool {
        let Some(listeners) = self.listeners.get_mut(&kind) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.get(&kind).map_or(0, Vec::len)
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn publish(&mut self, event: &BoardEvent, context: &mut C) -> PublishReport {
        let kind = event.kind();
        let mut report = PublishReport::default();
        let Some(listeners) = self.listeners.get_mut(&kind) else {
            tracing::trace!(%kind, "No listeners");
            return report;
        };

        tracing::debug!(%kind, ?event, listeners = listeners.len(), "Dispatching");
        for (id, listener) in listeners.iter_mut() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener(event, context)));
            match outcome {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    report.failed += 1;
                    tracing::error!(%kind, subscription = ?id, "Listener failed: {}", e);
                }
                Err(payload) => {
                    report.failed += 1;
                    let message = payload
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "non-string panic payload".to_string());
                    tracing::error!(%kind, subscription = ?id, "Listener panicked: {}", message);
                }
            }
        }
        report
    }
}
