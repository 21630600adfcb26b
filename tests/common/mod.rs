//! Shared test utilities and mock collaborators.

#![allow(dead_code, unused_imports)]

use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fluxstore::action::Action;
use fluxstore::auth::{AccessToken, TokenRecord};
use fluxstore::dispatcher::Dispatcher;
use fluxstore::model::AccountModel;
use fluxstore::network::{
    ClassifiedError, FailureCallback, NetworkClient, NetworkRequest, NetworkResponse, RequestKind,
    SuccessCallback,
};
use fluxstore::persistence::{Entity, MemoryPersistence, Persistence, PersistenceError};
use fluxstore::scheduler::Scheduler;
use fluxstore::store::{AccountCollaborators, AccountEvent, AccountStore, EmitsChanges};
use parking_lot::Mutex;

struct PendingCall {
    request: NetworkRequest,
    on_success: SuccessCallback,
    on_failure: FailureCallback,
}

/// Network that holds every call until the test answers it.
#[derive(Default)]
pub struct ManualNetwork {
    pending: Mutex<Vec<PendingCall>>,
    calls: Mutex<Vec<NetworkRequest>>,
}

impl ManualNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every request ever issued, answered or not.
    pub fn requests(&self) -> Vec<NetworkRequest> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, kind: RequestKind) -> usize {
        self.calls.lock().iter().filter(|r| r.kind() == kind).count()
    }

    pub fn pending_requests(&self) -> Vec<RequestKind> {
        self.pending.lock().iter().map(|call| call.request.kind()).collect()
    }

    /// Answer the oldest pending call of `kind`. The lock is released before
    /// the callback runs, since the callback dispatches.
    pub fn respond(&self, kind: RequestKind, outcome: Result<NetworkResponse, ClassifiedError>) {
        let call = {
            let mut pending = self.pending.lock();
            let index = pending
                .iter()
                .position(|call| call.request.kind() == kind)
                .unwrap_or_else(|| panic!("no pending {:?} call", kind));
            pending.remove(index)
        };
        match outcome {
            Ok(response) => (call.on_success)(response),
            Err(error) => (call.on_failure)(error),
        }
    }
}

impl NetworkClient for ManualNetwork {
    fn call(&self, request: NetworkRequest, on_success: SuccessCallback, on_failure: FailureCallback) {
        self.calls.lock().push(request.clone());
        self.pending.lock().push(PendingCall {
            request,
            on_success,
            on_failure,
        });
    }
}

/// Scheduler that records instead of sleeping; tests fire entries by hand.
#[derive(Default)]
pub struct ManualScheduler {
    scheduled: Mutex<Vec<(Duration, Action)>>,
}

impl ManualScheduler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn take_scheduled(&self) -> Vec<(Duration, Action)> {
        std::mem::take(&mut *self.scheduled.lock())
    }

    pub fn scheduled_count(&self) -> usize {
        self.scheduled.lock().len()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, action: Action) {
        self.scheduled.lock().push((delay, action));
    }
}

/// Memory-backed persistence whose writes can be switched to fail.
pub struct FailingPersistence<E> {
    inner: MemoryPersistence<E>,
    fail_upserts: AtomicBool,
    fail_deletes: AtomicBool,
}

impl<E: Entity> FailingPersistence<E> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryPersistence::new(),
            fail_upserts: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        })
    }

    pub fn fail_upserts(&self, fail: bool) {
        self.fail_upserts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    fn refused() -> PersistenceError {
        PersistenceError::Io {
            path: PathBuf::from(E::COLLECTION),
            source: io::Error::new(io::ErrorKind::Other, "storage refused"),
        }
    }
}

impl<E: Entity> Persistence<E> for FailingPersistence<E> {
    fn get(&self, id: &str) -> Result<Option<E>, PersistenceError> {
        self.inner.get(id)
    }

    fn upsert(&self, entity: &E) -> Result<(), PersistenceError> {
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(Self::refused());
        }
        self.inner.upsert(entity)
    }

    fn delete(&self, id: &str) -> Result<(), PersistenceError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(Self::refused());
        }
        self.inner.delete(id)
    }
}

pub type EventLog = Arc<Mutex<Vec<AccountEvent>>>;

/// Dispatcher plus one account store wired to manual collaborators.
pub struct Harness {
    pub dispatcher: Dispatcher,
    pub store: Arc<Mutex<AccountStore>>,
    pub network: Arc<ManualNetwork>,
    pub scheduler: Arc<ManualScheduler>,
    pub accounts: Arc<dyn Persistence<AccountModel>>,
    pub tokens: Arc<dyn Persistence<TokenRecord>>,
    pub events: EventLog,
}

impl Harness {
    pub fn new(fetch_timeout: Duration) -> Self {
        Self::with_storage(
            fetch_timeout,
            Arc::new(MemoryPersistence::<AccountModel>::new()),
            Arc::new(MemoryPersistence::<TokenRecord>::new()),
        )
    }

    pub fn with_storage(
        fetch_timeout: Duration,
        accounts: Arc<dyn Persistence<AccountModel>>,
        tokens: Arc<dyn Persistence<TokenRecord>>,
    ) -> Self {
        let network = ManualNetwork::new();
        let scheduler = ManualScheduler::new();
        let dispatcher = Dispatcher::new();
        let access_token = AccessToken::load(Arc::clone(&tokens)).expect("load token");
        let collaborators = AccountCollaborators {
            network: network.clone(),
            scheduler: scheduler.clone(),
            accounts: Arc::clone(&accounts),
            access_token,
        };
        let store = AccountStore::new(dispatcher.handle(), collaborators, fetch_timeout)
            .expect("build account store");
        let store = Arc::new(Mutex::new(store));

        let events: EventLog = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        store
            .lock()
            .changes()
            .subscribe(move |event: &AccountEvent| sink.lock().push(event.clone()));
        dispatcher.register(Arc::clone(&store));

        Self {
            dispatcher,
            store,
            network,
            scheduler,
            accounts,
            tokens,
            events,
        }
    }

    pub fn take_events(&self) -> Vec<AccountEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Fire every recorded scheduler entry, in order.
    pub fn fire_scheduled(&self) {
        for (_, action) in self.scheduler.take_scheduled() {
            self.dispatcher.dispatch(action).expect("scheduled dispatch");
        }
    }
}

pub fn remote_account() -> AccountModel {
    AccountModel {
        user_id: 42,
        user_name: "alex".into(),
        email: "alex@example.com".into(),
        display_name: "Alex".into(),
        primary_site_id: 7,
        site_count: 3,
        visible_site_count: 2,
        ..AccountModel::default()
    }
}

pub fn remote_settings() -> AccountModel {
    AccountModel {
        first_name: "Alex".into(),
        last_name: "Rivera".into(),
        about_me: "Writes things.".into(),
        web_address: "https://alex.example.com".into(),
        ..AccountModel::default()
    }
}
