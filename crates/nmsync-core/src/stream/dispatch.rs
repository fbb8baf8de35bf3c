// ── Subscription dispatcher ──
//
// Fans a batch of notifications out to every matching subscriber without
// ever waiting on one. Delivery uses `try_send`; a full queue drops that
// subscriber, a closed queue is cleaned up silently.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use super::{Notification, Subscription, SubscriptionFilter, SubscriptionId};

struct Subscriber {
    filter: SubscriptionFilter,
    tx: mpsc::Sender<Notification>,
    overflowed: Arc<AtomicBool>,
}

pub(crate) struct Dispatcher {
    subscribers: DashMap<SubscriptionId, Subscriber>,
    next_id: AtomicU64,
    capacity: usize,
}

impl Dispatcher {
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: DashMap::new(),
            next_id: AtomicU64::new(1),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn subscribe(&self, filter: SubscriptionFilter) -> Subscription {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.capacity);
        let overflowed = Arc::new(AtomicBool::new(false));

        debug!(%id, ?filter, "subscriber added");
        self.subscribers.insert(
            id,
            Subscriber {
                filter,
                tx,
                overflowed: Arc::clone(&overflowed),
            },
        );

        Subscription {
            id,
            inner: ReceiverStream::new(rx),
            overflowed,
        }
    }

    /// Remove a subscriber. Its stream ends without draining.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.subscribers.remove(&id).is_some();
        if removed {
            debug!(%id, "subscriber removed");
        }
        removed
    }

    /// Deliver `batch` in order. Returns the subscribers dropped for overflow.
    pub fn dispatch(&self, batch: &[Notification]) -> Vec<SubscriptionId> {
        if batch.is_empty() {
            return Vec::new();
        }

        let mut overflowed = Vec::new();
        let mut closed = Vec::new();

        for entry in &self.subscribers {
            let sub = entry.value();
            for note in batch.iter().filter(|n| sub.filter.matches(n)) {
                match sub.tx.try_send(note.clone()) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        sub.overflowed.store(true, Ordering::Release);
                        overflowed.push(*entry.key());
                        break;
                    }
                    Err(TrySendError::Closed(_)) => {
                        closed.push(*entry.key());
                        break;
                    }
                }
            }
        }

        // Removal happens after iteration; DashMap shards are still borrowed above.
        for id in &closed {
            self.subscribers.remove(id);
            debug!(%id, "subscriber went away");
        }
        for id in &overflowed {
            self.subscribers.remove(id);
            warn!(%id, capacity = self.capacity, "subscriber overflowed, dropping");
        }
        overflowed
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Drop every subscriber; their streams end.
    pub fn close_all(&self) {
        self.subscribers.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::stream::Change;
    use nmsync_bus::{ObjectKind, ObjectPath};

    fn note(generation: u64, path: &str) -> Notification {
        Notification {
            generation,
            path: ObjectPath::new(path),
            kind: ObjectKind::Device,
            change: Change::Updated {
                changed: vec!["Mtu".into()],
            },
        }
    }

    #[tokio::test]
    async fn delivers_in_order_to_matching_subscribers() {
        let dispatcher = Dispatcher::new(8);
        let mut all = dispatcher.subscribe(SubscriptionFilter::All);
        let mut one = dispatcher.subscribe(SubscriptionFilter::Path(ObjectPath::new("/dev/1")));

        dispatcher.dispatch(&[note(1, "/dev/0"), note(2, "/dev/1"), note(3, "/dev/1")]);

        assert_eq!(all.recv().await.unwrap().generation, 1);
        assert_eq!(all.recv().await.unwrap().generation, 2);
        assert_eq!(all.recv().await.unwrap().generation, 3);
        assert_eq!(one.recv().await.unwrap().generation, 2);
        assert_eq!(one.recv().await.unwrap().generation, 3);
        assert!(one.try_recv().is_none());
    }

    #[tokio::test]
    async fn full_queue_drops_subscriber() {
        let dispatcher = Dispatcher::new(2);
        let mut slow = dispatcher.subscribe(SubscriptionFilter::All);
        let mut fast = dispatcher.subscribe(SubscriptionFilter::All);

        dispatcher.dispatch(&[note(1, "/a"), note(2, "/a")]);
        fast.recv().await.unwrap();
        fast.recv().await.unwrap();

        let dropped = dispatcher.dispatch(&[note(3, "/a")]);
        assert_eq!(dropped, vec![slow.id()]);
        assert!(slow.was_overflowed());
        assert!(!fast.was_overflowed());
        assert_eq!(dispatcher.len(), 1);

        // Queued items remain readable, then the stream ends.
        assert_eq!(slow.recv().await.unwrap().generation, 1);
        assert_eq!(slow.recv().await.unwrap().generation, 2);
        assert!(slow.recv().await.is_none());
        assert_eq!(fast.recv().await.unwrap().generation, 3);
    }

    #[tokio::test]
    async fn dropped_subscription_is_cleaned_up() {
        let dispatcher = Dispatcher::new(4);
        let sub = dispatcher.subscribe(SubscriptionFilter::All);
        drop(sub);
        assert!(dispatcher.dispatch(&[note(1, "/a")]).is_empty());
        assert_eq!(dispatcher.len(), 0);
    }

    #[tokio::test]
    async fn unsubscribe_ends_stream() {
        let dispatcher = Dispatcher::new(4);
        let mut sub = dispatcher.subscribe(SubscriptionFilter::All);
        dispatcher.dispatch(&[note(1, "/a")]);
        assert!(dispatcher.unsubscribe(sub.id()));
        assert!(!dispatcher.unsubscribe(sub.id()));

        // Undelivered items are still buffered but nothing new arrives.
        assert_eq!(sub.recv().await.unwrap().generation, 1);
        assert!(sub.recv().await.is_none());
        assert!(!sub.was_overflowed());
    }
}
