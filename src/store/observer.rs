use std::cell::RefCell;
use std::path::Path;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::tree::TrackedNode;

/// Receives lifecycle notifications from a tracking store.
///
/// `will_move` and `will_remove` fire exactly once per operation, *after*
/// the physical operation has already happened: observers see a fait
/// accompli, not a veto point. All methods default to no-ops so observers
/// implement only what they care about.
pub trait TrackingObserver {
    fn started_tracking(&self, node: &TrackedNode) {
        let _ = node;
    }

    fn will_move(&self, node: &TrackedNode, from: &Path, to: &Path) {
        let _ = (node, from, to);
    }

    fn will_remove(&self, node: &TrackedNode) {
        let _ = node;
    }
}

/// Non-owning observer list.
///
/// The registry never keeps an observer alive: entries are weak, delivered
/// in registration order, and dead entries are pruned on registration and on
/// every delivery pass.
#[derive(Default)]
pub(crate) struct ObserverRegistry {
    observers: RefCell<Vec<Weak<dyn TrackingObserver>>>,
}

impl ObserverRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers an observer; already-registered observers are left alone.
    pub(crate) fn add(&self, observer: &Rc<dyn TrackingObserver>) {
        let mut observers = self.observers.borrow_mut();
        observers.retain(|candidate| candidate.strong_count() > 0);

        let already_registered = observers
            .iter()
            .filter_map(Weak::upgrade)
            .any(|registered| same_observer(&registered, observer));
        if already_registered {
            debug!("Observer already registered, ignoring");
            return;
        }

        observers.push(Rc::downgrade(observer));
    }

    pub(crate) fn remove(&self, observer: &Rc<dyn TrackingObserver>) {
        self.observers.borrow_mut().retain(|candidate| {
            candidate
                .upgrade()
                .is_some_and(|registered| !same_observer(&registered, observer))
        });
    }

    pub(crate) fn notify_started_tracking(&self, node: &TrackedNode) {
        for observer in self.live_observers() {
            observer.started_tracking(node);
        }
    }

    pub(crate) fn notify_will_move(&self, node: &TrackedNode, from: &Path, to: &Path) {
        for observer in self.live_observers() {
            observer.will_move(node, from, to);
        }
    }

    pub(crate) fn notify_will_remove(&self, node: &TrackedNode) {
        for observer in self.live_observers() {
            observer.will_remove(node);
        }
    }

    /// Snapshots the live observers and prunes dead ones, so an observer may
    /// register or deregister observers from inside a notification.
    fn live_observers(&self) -> Vec<Rc<dyn TrackingObserver>> {
        let mut observers = self.observers.borrow_mut();
        observers.retain(|candidate| candidate.strong_count() > 0);
        observers.iter().filter_map(Weak::upgrade).collect()
    }
}

/// Identity comparison on the data pointer; `Weak::ptr_eq` on trait objects
/// can disagree across vtable copies.
fn same_observer(a: &Rc<dyn TrackingObserver>, b: &Rc<dyn TrackingObserver>) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingObserver {
        tracked: RefCell<usize>,
    }

    impl TrackingObserver for CountingObserver {
        fn started_tracking(&self, _node: &TrackedNode) {
            *self.tracked.borrow_mut() += 1;
        }
    }

    fn registered(registry: &ObserverRegistry) -> Rc<CountingObserver> {
        let observer = Rc::new(CountingObserver::default());
        registry.add(&(observer.clone() as Rc<dyn TrackingObserver>));
        observer
    }

    #[test]
    fn test_notifications_reach_every_observer() {
        let registry = ObserverRegistry::new();
        let first = registered(&registry);
        let second = registered(&registry);
        let node = TrackedNode::new_root("/base");

        registry.notify_started_tracking(&node);

        assert_eq!(*first.tracked.borrow(), 1);
        assert_eq!(*second.tracked.borrow(), 1);
    }

    #[test]
    fn test_registration_is_idempotent() {
        let registry = ObserverRegistry::new();
        let observer = registered(&registry);
        registry.add(&(observer.clone() as Rc<dyn TrackingObserver>));
        let node = TrackedNode::new_root("/base");

        registry.notify_started_tracking(&node);

        assert_eq!(*observer.tracked.borrow(), 1);
    }

    #[test]
    fn test_removed_observer_is_not_notified() {
        let registry = ObserverRegistry::new();
        let observer = registered(&registry);
        registry.remove(&(observer.clone() as Rc<dyn TrackingObserver>));
        let node = TrackedNode::new_root("/base");

        registry.notify_started_tracking(&node);

        assert_eq!(*observer.tracked.borrow(), 0);
    }

    #[test]
    fn test_dropped_observer_is_pruned() {
        let registry = ObserverRegistry::new();
        let observer = registered(&registry);
        let survivor = registered(&registry);
        drop(observer);
        let node = TrackedNode::new_root("/base");

        registry.notify_started_tracking(&node);

        assert_eq!(*survivor.tracked.borrow(), 1);
        assert_eq!(registry.observers.borrow().len(), 1);
    }
}
