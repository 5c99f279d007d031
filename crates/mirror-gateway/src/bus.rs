//! Event bus
//!
//! Per-kind ordered listener lists owned by the session, replacing any
//! notion of a global registry. Registration is append-only and takes
//! effect for subsequent dispatches only; a dispatch snapshots the list
//! before invoking, so listeners registered mid-dispatch never see the
//! triggering event.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::future::BoxFuture;
use parking_lot::RwLock;

use crate::events::{Event, EventKind};

/// Boxed asynchronous listener callback
pub type Listener = Arc<dyn Fn(Event) -> BoxFuture<'static, ()> + Send + Sync>;

/// Handle identifying one registration; pass to [`EventBus::unsubscribe`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    kind: EventKind,
    id: u64,
}

impl Subscription {
    /// Event kind this subscription listens to
    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

/// Ordered fan-out of reconciled events to registered listeners
#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<HashMap<EventKind, Vec<(u64, Listener)>>>,
    next_id: AtomicU64,
}

impl EventBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for an event kind
    ///
    /// Listeners fire in registration order. No deduplication: the same
    /// closure registered twice fires twice.
    pub fn subscribe<F, Fut>(&self, kind: EventKind, listener: F) -> Subscription
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let listener: Listener =
            Arc::new(move |event| Box::pin(listener(event)) as BoxFuture<'static, ()>);
        self.listeners
            .write()
            .entry(kind)
            .or_default()
            .push((id, listener));
        tracing::trace!(kind = %kind, id, "Listener registered");
        Subscription { kind, id }
    }

    /// Remove a registration; returns false if it was already gone
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        let mut listeners = self.listeners.write();
        let Some(list) = listeners.get_mut(&subscription.kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(id, _)| *id != subscription.id);
        before != list.len()
    }

    /// Number of listeners currently registered for a kind
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.read().get(&kind).map_or(0, Vec::len)
    }

    /// Invoke every listener for the event's kind, in registration order
    ///
    /// Each listener receives its own clone of the event and is awaited
    /// before the next runs. Listener failures are not isolated at this
    /// layer; a panic propagates to the dispatching task.
    pub async fn dispatch(&self, event: Event) -> usize {
        let kind = event.kind();
        let snapshot: Vec<Listener> = self
            .listeners
            .read()
            .get(&kind)
            .map(|list| list.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default();

        tracing::trace!(kind = %kind, listeners = snapshot.len(), "Dispatching event");
        let count = snapshot.len();
        for listener in snapshot {
            listener(event.clone()).await;
        }
        count
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self.listeners.read();
        let total: usize = listeners.values().map(Vec::len).sum();
        f.debug_struct("EventBus")
            .field("kinds", &listeners.len())
            .field("listeners", &total)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_dispatch_in_registration_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            bus.subscribe(EventKind::Authenticated, move |_| {
                let order = Arc::clone(&order);
                async move {
                    order.lock().unwrap().push(tag);
                }
            });
        }

        let invoked = bus.dispatch(Event::Authenticated).await;
        assert_eq!(invoked, 3);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_dispatch_only_matching_kind() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_clone = Arc::clone(&hits);
        bus.subscribe(EventKind::Pong, move |_| {
            let hits = Arc::clone(&hits_clone);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
            }
        });

        bus.dispatch(Event::Authenticated).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        bus.dispatch(Event::Pong { data: 0 }).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unsubscribe() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_clone = Arc::clone(&hits);
        let subscription = bus.subscribe(EventKind::Pong, move |_| {
            let hits = Arc::clone(&hits_clone);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
            }
        });

        assert_eq!(bus.listener_count(EventKind::Pong), 1);
        assert!(bus.unsubscribe(&subscription));
        assert!(!bus.unsubscribe(&subscription));
        assert_eq!(bus.listener_count(EventKind::Pong), 0);

        bus.dispatch(Event::Pong { data: 0 }).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_registration_effective_for_subsequent_dispatches_only() {
        let bus = Arc::new(EventBus::new());
        let hits = Arc::new(AtomicUsize::new(0));

        bus.dispatch(Event::Pong { data: 0 }).await;

        let hits_clone = Arc::clone(&hits);
        bus.subscribe(EventKind::Pong, move |_| {
            let hits = Arc::clone(&hits_clone);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
            }
        });

        bus.dispatch(Event::Pong { data: 1 }).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
