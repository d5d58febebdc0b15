//! Publish/subscribe fan-out for timer snapshots.

use crate::ticker::lock_unpoisoned;
use crate::TimerSnapshot;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

pub(crate) type Callback = Box<dyn Fn(&TimerSnapshot) + Send + Sync + 'static>;

/// Ordered list of subscriber callbacks
#[derive(Default)]
pub(crate) struct Observers {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<(u64, Arc<Callback>)>>,
}

impl Observers {
    pub(crate) fn subscribe(self: &Arc<Self>, callback: Callback) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock_unpoisoned(&self.subscribers).push((id, Arc::new(callback)));
        tracing::trace!("Observer {} subscribed", id);
        Subscription {
            id,
            observers: Arc::downgrade(self),
        }
    }

    /// Deliver one snapshot to every subscriber, in subscription order.
    ///
    /// Callbacks run outside the subscriber lock, so a callback may
    /// unsubscribe itself or others; removals apply from the next snapshot.
    pub(crate) fn notify(&self, snapshot: &TimerSnapshot) {
        let callbacks: Vec<Arc<Callback>> = lock_unpoisoned(&self.subscribers)
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in callbacks {
            callback(snapshot);
        }
    }

    fn remove(&self, id: u64) -> bool {
        let mut subscribers = lock_unpoisoned(&self.subscribers);
        let before = subscribers.len();
        subscribers.retain(|(sub_id, _)| *sub_id != id);
        before != subscribers.len()
    }

    pub(crate) fn len(&self) -> usize {
        lock_unpoisoned(&self.subscribers).len()
    }
}

/// Handle returned by `subscribe`.
///
/// Dropping it leaves the subscription in place; call
/// [`Subscription::unsubscribe`] to stop receiving snapshots.
#[must_use = "keep the Subscription to be able to unsubscribe later"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    observers: Weak<Observers>,
}

impl Subscription {
    /// Stop delivering snapshots to this subscriber.
    ///
    /// Returns false if the engine is gone or the subscriber was already removed.
    pub fn unsubscribe(self) -> bool {
        match self.observers.upgrade() {
            Some(observers) => {
                let removed = observers.remove(self.id);
                tracing::trace!("Observer {} unsubscribed", self.id);
                removed
            }
            None => false,
        }
    }
}
