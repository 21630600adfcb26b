//! Unidirectional data-flow runtime.
//!
//! Actions go to the [`dispatcher::Dispatcher`], which delivers each one to
//! every registered [`store::Store`] in order. Stores own their state, talk to
//! network and persistence collaborators, and publish change events.

pub mod action;
pub mod auth;
pub mod config;
pub mod dispatcher;
pub mod logging;
pub mod model;
pub mod network;
pub mod persistence;
pub mod scheduler;
pub mod store;
