//! Synchronous fan-out of actions to registered stores.
//!
//! A *pass* delivers one action to every registered store, in registration
//! order, on the calling thread. Passes never interleave: a second thread
//! calling `dispatch` waits for the running pass to finish. Calling
//! `dispatch` again on the thread that is running a pass is a programming
//! error and fails with `ReentrantDispatch`; follow-up actions go through
//! `defer` and are delivered right after the current pass, in FIFO order.

mod error;

pub use error::{DispatchError, FailureCause, StoreFailure};

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, warn};

use crate::action::Action;
use crate::store::Store;

/// Identifies a registration; returned by `register`, consumed by `unregister`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreId(u64);

struct Registration {
    id: StoreId,
    name: &'static str,
    store: Arc<Mutex<dyn Store>>,
}

struct DispatcherInner {
    stores: RwLock<Vec<Registration>>,
    /// Held for the whole pass, deferred drain included.
    pass: Mutex<()>,
    /// Thread currently running a pass.
    active: Mutex<Option<ThreadId>>,
    deferred: Mutex<VecDeque<Action>>,
    next_id: AtomicU64,
}

#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                stores: RwLock::new(Vec::new()),
                pass: Mutex::new(()),
                active: Mutex::new(None),
                deferred: Mutex::new(VecDeque::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Weak handle for stores and callbacks, so they don't keep the
    /// dispatcher (and through it, themselves) alive.
    pub fn handle(&self) -> DispatchHandle {
        DispatchHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Append `store` to the delivery order and call its `on_register`.
    ///
    /// A registration made during a pass takes effect from the next pass.
    pub fn register<S: Store + 'static>(&self, store: Arc<Mutex<S>>) -> StoreId {
        let id = StoreId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let name = store.lock().name();
        let shared: Arc<Mutex<dyn Store>> = store;
        self.inner.stores.write().push(Registration {
            id,
            name,
            store: Arc::clone(&shared),
        });
        debug!(store = name, ?id, "store registered");
        shared.lock().on_register();
        id
    }

    /// Returns false if `id` was not registered.
    pub fn unregister(&self, id: StoreId) -> bool {
        let mut stores = self.inner.stores.write();
        let before = stores.len();
        stores.retain(|registration| registration.id != id);
        let removed = stores.len() != before;
        if removed {
            debug!(?id, "store unregistered");
        }
        removed
    }

    pub fn store_count(&self) -> usize {
        self.inner.stores.read().len()
    }

    /// Deliver `action` to every registered store, then drain deferred actions.
    ///
    /// A failing or panicking store does not stop delivery to the others;
    /// all failures of this pass and of the drained deferred passes come
    /// back together as `DispatchError::StoreFailures`.
    pub fn dispatch(&self, action: Action) -> Result<(), DispatchError> {
        let current = thread::current().id();
        if *self.inner.active.lock() == Some(current) {
            warn!(action = action.name(), "re-entrant dispatch rejected");
            return Err(DispatchError::ReentrantDispatch {
                action: action.name(),
            });
        }
        action.validate()?;

        let _pass = self.inner.pass.lock();
        *self.inner.active.lock() = Some(current);
        let _active = scopeguard::guard((), |_| {
            *self.inner.active.lock() = None;
        });

        let mut failures = self.deliver(&action);
        loop {
            let next = self.inner.deferred.lock().pop_front();
            let Some(next) = next else {
                break;
            };
            failures.extend(self.deliver(&next));
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DispatchError::StoreFailures { failures })
        }
    }

    /// Queue `action` for delivery after the current pass.
    pub fn defer(&self, action: Action) -> Result<(), DispatchError> {
        action.validate()?;
        debug!(action = action.name(), "action deferred");
        self.inner.deferred.lock().push_back(action);
        Ok(())
    }

    /// `defer` when called from inside a pass on this thread, `dispatch`
    /// otherwise. Network callbacks use this so a client that completes
    /// synchronously still lands after the current pass.
    pub fn post(&self, action: Action) -> Result<(), DispatchError> {
        if self.is_dispatching_on_current_thread() {
            self.defer(action)
        } else {
            self.dispatch(action)
        }
    }

    pub fn is_dispatching(&self) -> bool {
        self.inner.active.lock().is_some()
    }

    fn is_dispatching_on_current_thread(&self) -> bool {
        *self.inner.active.lock() == Some(thread::current().id())
    }

    fn deliver(&self, action: &Action) -> Vec<StoreFailure> {
        let stores: Vec<(&'static str, Arc<Mutex<dyn Store>>)> = self
            .inner
            .stores
            .read()
            .iter()
            .map(|registration| (registration.name, Arc::clone(&registration.store)))
            .collect();
        debug!(action = action.name(), stores = stores.len(), "dispatching");

        let mut failures = Vec::new();
        for (name, store) in stores {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| store.lock().on_action(action)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    error!(store = name, action = action.name(), "store failed: {}", err);
                    failures.push(StoreFailure::from_error(name, action.name(), &err));
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    error!(store = name, action = action.name(), "store panicked: {}", message);
                    failures.push(StoreFailure {
                        store: name,
                        action: action.name(),
                        cause: FailureCause::Panic(message),
                    });
                }
            }
        }
        failures
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Non-owning dispatcher handle held by stores and async callbacks.
#[derive(Clone)]
pub struct DispatchHandle {
    inner: Weak<DispatcherInner>,
}

impl DispatchHandle {
    fn upgrade(&self, action: &Action) -> Result<Dispatcher, DispatchError> {
        self.inner
            .upgrade()
            .map(|inner| Dispatcher { inner })
            .ok_or(DispatchError::Closed {
                action: action.name(),
            })
    }

    pub fn dispatch(&self, action: Action) -> Result<(), DispatchError> {
        self.upgrade(&action)?.dispatch(action)
    }

    pub fn defer(&self, action: Action) -> Result<(), DispatchError> {
        self.upgrade(&action)?.defer(action)
    }

    pub fn post(&self, action: Action) -> Result<(), DispatchError> {
        self.upgrade(&action)?.post(action)
    }
}
