//! Synchronous publish/subscribe bus.
//!
//! Design:
//! - Delivery is synchronous, in subscription order, on the publisher's thread.
//! - The subscriber list is snapshotted before delivery and the lock released,
//!   so callbacks may publish, subscribe or unsubscribe without deadlocking.
//! - Each subscription carries an `active` flag checked right before its
//!   callback runs: unsubscribing mid-pass silences that callback at once and
//!   never shifts or skips the others.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::{BusEvent, Topic};

pub type Callback = Arc<dyn Fn(&BusEvent) + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

#[derive(Clone)]
struct Subscriber {
    id: SubscriptionId,
    active: Arc<AtomicBool>,
    callback: Callback,
}

#[derive(Default)]
struct BusState {
    next_id: u64,
    topics: HashMap<Topic, Vec<Subscriber>>,
}

#[derive(Default)]
pub struct EventBus {
    state: Mutex<BusState>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe<F>(&self, topic: Topic, callback: F) -> SubscriptionId
    where
        F: Fn(&BusEvent) + Send + Sync + 'static,
    {
        let mut state = self.state();
        state.next_id += 1;
        let id = SubscriptionId(state.next_id);
        state.topics.entry(topic).or_default().push(Subscriber {
            id,
            active: Arc::new(AtomicBool::new(true)),
            callback: Arc::new(callback),
        });
        id
    }

    /// Returns false when `id` was not subscribed to `topic`.
    pub fn unsubscribe(&self, topic: Topic, id: SubscriptionId) -> bool {
        let mut state = self.state();
        let Some(subscribers) = state.topics.get_mut(&topic) else {
            return false;
        };
        let Some(pos) = subscribers.iter().position(|s| s.id == id) else {
            return false;
        };
        let removed = subscribers.remove(pos);
        removed.active.store(false, Ordering::SeqCst);
        true
    }

    /// Deliver `event` to every current subscriber of its topic.
    pub fn publish(&self, event: &BusEvent) {
        let topic = event.topic();
        let snapshot: Vec<Subscriber> = match self.state().topics.get(&topic) {
            Some(subscribers) => subscribers.clone(),
            None => return,
        };

        tracing::trace!(%topic, subscribers = snapshot.len(), "publishing");
        for subscriber in snapshot {
            if subscriber.active.load(Ordering::SeqCst) {
                (subscriber.callback)(event);
            }
        }
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.state().topics.get(&topic).map_or(0, Vec::len)
    }

    /// Drop every subscription. Callbacks in an in-flight publish pass are
    /// silenced as well.
    pub fn clear(&self) {
        let mut state = self.state();
        for subscriber in state.topics.values().flatten() {
            subscriber.active.store(false, Ordering::SeqCst);
        }
        state.topics.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DataLoaded, FamilySummary};
    use std::sync::OnceLock;

    fn loaded() -> BusEvent {
        BusEvent::DataLoaded(DataLoaded {
            members: vec![],
            summary: FamilySummary::default(),
        })
    }

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> Callback) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let make = {
            let log = Arc::clone(&log);
            move |name: &'static str| -> Callback {
                let log = Arc::clone(&log);
                Arc::new(move |_: &BusEvent| log.lock().unwrap().push(name))
            }
        };
        (log, make)
    }

    #[test]
    fn delivers_in_subscription_order() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        for name in ["a", "b", "c"] {
            let cb = make(name);
            bus.subscribe(Topic::BudgetDataLoaded, move |e| cb(e));
        }

        bus.publish(&loaded());
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn only_matching_topic_is_delivered() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        let cb = make("alert");
        bus.subscribe(Topic::BudgetAlert, move |e| cb(e));

        bus.publish(&loaded());
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn unsubscribe_during_publish_skips_only_the_removed_callback() {
        let bus = Arc::new(EventBus::new());
        let (log, make) = recorder();
        let victim: Arc<OnceLock<SubscriptionId>> = Arc::new(OnceLock::new());

        let first = make("first");
        let remover = {
            let bus = Arc::clone(&bus);
            let victim = Arc::clone(&victim);
            move |e: &BusEvent| {
                first(e);
                if let Some(id) = victim.get() {
                    bus.unsubscribe(Topic::BudgetDataLoaded, *id);
                }
            }
        };
        bus.subscribe(Topic::BudgetDataLoaded, remover);

        let second = make("second");
        let id = bus.subscribe(Topic::BudgetDataLoaded, move |e| second(e));
        victim.set(id).unwrap();

        let third = make("third");
        bus.subscribe(Topic::BudgetDataLoaded, move |e| third(e));

        bus.publish(&loaded());
        assert_eq!(*log.lock().unwrap(), vec!["first", "third"]);
        assert_eq!(bus.subscriber_count(Topic::BudgetDataLoaded), 2);
    }

    #[test]
    fn self_unsubscribe_is_allowed() {
        let bus = Arc::new(EventBus::new());
        let (log, make) = recorder();
        let own_id: Arc<OnceLock<SubscriptionId>> = Arc::new(OnceLock::new());

        let once = make("once");
        let cb = {
            let bus = Arc::clone(&bus);
            let own_id = Arc::clone(&own_id);
            move |e: &BusEvent| {
                once(e);
                if let Some(id) = own_id.get() {
                    assert!(bus.unsubscribe(Topic::BudgetDataLoaded, *id));
                }
            }
        };
        let id = bus.subscribe(Topic::BudgetDataLoaded, cb);
        own_id.set(id).unwrap();

        bus.publish(&loaded());
        bus.publish(&loaded());
        assert_eq!(*log.lock().unwrap(), vec!["once"]);
    }

    #[test]
    fn callbacks_may_publish_reentrantly() {
        let bus = Arc::new(EventBus::new());
        let (log, make) = recorder();

        let alert_cb = make("status");
        bus.subscribe(Topic::BudgetAlert, move |e| alert_cb(e));

        let relay = {
            let bus = Arc::clone(&bus);
            let loaded_cb = make("loaded");
            move |e: &BusEvent| {
                loaded_cb(e);
                bus.subscribe(Topic::BudgetAlert, |_| {});
            }
        };
        bus.subscribe(Topic::BudgetDataLoaded, relay);

        bus.publish(&loaded());
        assert_eq!(*log.lock().unwrap(), vec!["loaded"]);
        assert_eq!(bus.subscriber_count(Topic::BudgetAlert), 2);
    }

    #[test]
    fn unknown_subscription_is_reported() {
        let bus = EventBus::new();
        let id = bus.subscribe(Topic::BudgetAlert, |_| {});
        assert!(!bus.unsubscribe(Topic::BudgetDataLoaded, id));
        assert!(bus.unsubscribe(Topic::BudgetAlert, id));
        assert!(!bus.unsubscribe(Topic::BudgetAlert, id));
    }

    #[test]
    fn clear_removes_everything() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        for topic in Topic::ALL {
            let cb = make("any");
            bus.subscribe(topic, move |e| cb(e));
        }

        bus.clear();
        bus.publish(&loaded());
        assert!(log.lock().unwrap().is_empty());
        for topic in Topic::ALL {
            assert_eq!(bus.subscriber_count(topic), 0);
        }
    }
}
