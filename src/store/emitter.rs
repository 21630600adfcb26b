use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Observer<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct EmitterInner<E> {
    observers: RwLock<Vec<(ObserverId, Observer<E>)>>,
    next_id: AtomicU64,
}

/// Explicit observer list for one store's change events.
///
/// Cheap to clone; clones share the list, so observers can be attached
/// without holding the store. Delivery is synchronous, in subscription
/// order, to a snapshot of the list taken when `emit` starts.
pub struct ChangeEmitter<E> {
    inner: Arc<EmitterInner<E>>,
}

impl<E> ChangeEmitter<E> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(EmitterInner {
                observers: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn subscribe<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = ObserverId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner.observers.write().push((id, Arc::new(observer)));
        id
    }

    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let mut observers = self.inner.observers.write();
        let before = observers.len();
        observers.retain(|(observer_id, _)| *observer_id != id);
        observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers.read().len()
    }

    pub fn emit(&self, event: &E) {
        let snapshot: Vec<Observer<E>> = self
            .inner
            .observers
            .read()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in snapshot {
            observer(event);
        }
    }
}

impl<E> Clone for ChangeEmitter<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> Default for ChangeEmitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn observers_run_in_subscription_order() {
        let emitter = ChangeEmitter::<u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for tag in ["a", "b"] {
            let seen = Arc::clone(&seen);
            emitter.subscribe(move |value: &u32| seen.lock().push(format!("{}{}", tag, value)));
        }
        emitter.emit(&1);
        assert_eq!(*seen.lock(), vec!["a1", "b1"]);
    }

    #[test]
    fn unsubscribed_observer_is_skipped() {
        let emitter = ChangeEmitter::<u32>::new();
        let seen = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&seen);
        let id = emitter.subscribe(move |_| *counter.lock() += 1);
        assert!(emitter.unsubscribe(id));
        emitter.emit(&1);
        assert_eq!(*seen.lock(), 0);
        assert_eq!(emitter.observer_count(), 0);
    }

    #[test]
    fn observer_may_unsubscribe_itself_during_emit() {
        let emitter = ChangeEmitter::<u32>::new();
        let handle = emitter.clone();
        let slot: Arc<Mutex<Option<ObserverId>>> = Arc::new(Mutex::new(None));
        let slot_in = Arc::clone(&slot);
        let id = emitter.subscribe(move |_| {
            if let Some(id) = *slot_in.lock() {
                handle.unsubscribe(id);
            }
        });
        *slot.lock() = Some(id);
        emitter.emit(&1);
        assert_eq!(emitter.observer_count(), 0);
    }
}
