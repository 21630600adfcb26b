//! Stores: exclusive owners of one slice of state.
//!
//! # Architecture
//!
//! ```text
//! Action ──→ Dispatcher ──→ Store::on_action ──→ state + persistence
//!    ↑                             │
//!    │                             ├──→ ChangeEmitter ──→ observers
//!    └── network callback ←────────┘
//! ```
//!
//! - **Store**: mutates its state only inside `on_action`, on the dispatch thread
//! - **ChangeEmitter**: fan-out of change events to attached observers
//! - **FetchJoin**: joins independent sub-fetches into one completion

mod account;
mod emitter;
mod fetch_join;

pub use account::{
    AccountCollaborators, AccountEvent, AccountFetchPart, AccountStore, OnAccountChanged,
    OnAuthenticationChanged, OnNewUserCreated,
};
pub use emitter::{ChangeEmitter, ObserverId};
pub use fetch_join::{DeadlineCheck, FetchJoin, FetchStatus, JoinProgress};

use thiserror::Error;

use crate::action::Action;
use crate::dispatcher::DispatchError;
use crate::persistence::PersistenceError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("persistence failed: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("follow-up dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),
}

pub trait Store: Send {
    /// Used in logs and in dispatch failure reports.
    fn name(&self) -> &'static str;

    /// Called once, right after registration.
    fn on_register(&mut self) {}

    /// Handle one action. Types the store doesn't own are ignored.
    fn on_action(&mut self, action: &Action) -> Result<(), StoreError>;
}

/// A store that publishes change events.
pub trait EmitsChanges {
    type Event;

    fn changes(&self) -> &ChangeEmitter<Self::Event>;

    fn emit_change(&self, event: Self::Event) {
        self.changes().emit(&event);
    }
}
