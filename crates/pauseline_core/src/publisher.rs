//! Synchronous observer list
//!
//! A [`Publisher<E>`] owns an ordered set of subscriber callbacks and pushes
//! every published event to all of them, in subscription order, on the
//! caller's stack. There is no batching and no deferred dispatch: when
//! `publish` returns, every subscriber has seen the event.
//!
//! ```
//! use pauseline_core::Publisher;
//! use std::sync::{Arc, Mutex};
//!
//! let mut publisher = Publisher::new();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let seen_clone = seen.clone();
//! let id = publisher.subscribe(move |value: &i32| seen_clone.lock().unwrap().push(*value));
//!
//! publisher.publish(&1);
//! publisher.unsubscribe(id);
//! publisher.publish(&2);
//!
//! assert_eq!(*seen.lock().unwrap(), vec![1]);
//! ```

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

new_key_type! {
    /// Handle to a registered subscriber
    pub struct SubscriptionId;
}

/// Boxed subscriber callback
pub type Subscriber<E> = Box<dyn FnMut(&E) + Send>;

/// An explicit observer list for events of type `E`
pub struct Publisher<E> {
    subscribers: SlotMap<SubscriptionId, Subscriber<E>>,
    /// Subscription order (slotmap iteration order follows slot reuse)
    order: SmallVec<[SubscriptionId; 4]>,
    /// Number of events published so far
    published: u64,
}

impl<E> Publisher<E> {
    pub fn new() -> Self {
        Self {
            subscribers: SlotMap::with_key(),
            order: SmallVec::new(),
            published: 0,
        }
    }

    /// Register a subscriber; it receives every event published from now on
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&E) + Send + 'static,
    {
        let id = self.subscribers.insert(Box::new(callback));
        self.order.push(id);
        id
    }

    /// Remove a subscriber
    ///
    /// Returns `false` if the subscription was already removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        if self.subscribers.remove(id).is_some() {
            self.order.retain(|sub| *sub != id);
            true
        } else {
            false
        }
    }

    /// Deliver an event to a single subscriber
    ///
    /// Used to hand the current state to a subscriber that just joined.
    pub fn publish_to(&mut self, id: SubscriptionId, event: &E) -> bool {
        match self.subscribers.get_mut(id) {
            Some(callback) => {
                callback(event);
                true
            }
            None => false,
        }
    }

    /// Deliver an event to every subscriber, in subscription order
    pub fn publish(&mut self, event: &E) {
        self.published += 1;
        for id in &self.order {
            if let Some(callback) = self.subscribers.get_mut(*id) {
                callback(event);
            }
        }
    }

    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.subscribers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Total number of `publish` calls
    pub fn published_count(&self) -> u64 {
        self.published
    }
}

impl<E> Default for Publisher<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for Publisher<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("subscribers", &self.subscribers.len())
            .field("published", &self.published)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_publish_reaches_all_subscribers_in_order() {
        let mut publisher = Publisher::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for name in ["a", "b", "c"] {
            let log = log.clone();
            publisher.subscribe(move |value: &u32| log.lock().unwrap().push((name, *value)));
        }

        publisher.publish(&7);
        assert_eq!(
            *log.lock().unwrap(),
            vec![("a", 7), ("b", 7), ("c", 7)]
        );
        assert_eq!(publisher.published_count(), 1);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let mut publisher: Publisher<u32> = Publisher::new();
        let id = publisher.subscribe(|_| {});

        assert_eq!(publisher.len(), 1);
        assert!(publisher.unsubscribe(id));
        assert!(!publisher.unsubscribe(id));
        assert!(publisher.is_empty());
    }

    #[test]
    fn test_order_survives_slot_reuse() {
        let mut publisher = Publisher::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let log_a = log.clone();
        let a = publisher.subscribe(move |_: &()| log_a.lock().unwrap().push("a"));
        let log_b = log.clone();
        publisher.subscribe(move |_: &()| log_b.lock().unwrap().push("b"));

        publisher.unsubscribe(a);
        let log_c = log.clone();
        publisher.subscribe(move |_: &()| log_c.lock().unwrap().push("c"));

        publisher.publish(&());
        assert_eq!(*log.lock().unwrap(), vec!["b", "c"]);
    }

    #[test]
    fn test_publish_to_single_subscriber() {
        let mut publisher = Publisher::new();
        let hits = Arc::new(Mutex::new(0));

        let hits_a = hits.clone();
        let a = publisher.subscribe(move |_: &()| *hits_a.lock().unwrap() += 1);
        publisher.subscribe(|_: &()| panic!("only the targeted subscriber runs"));

        assert!(publisher.publish_to(a, &()));
        assert_eq!(*hits.lock().unwrap(), 1);
        assert_eq!(publisher.published_count(), 0);
    }
}
