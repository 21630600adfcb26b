//! Network collaborator boundary.
//!
//! A store hands the client a request and two callbacks. Exactly one of them
//! runs, exactly once, on whatever thread the client chooses. Callbacks must
//! report back through the dispatcher, never by touching store state.

mod error;
mod simulated;

pub use error::{ClassifiedError, ErrorKind};
pub use simulated::{SimulatedBehavior, SimulatedNetwork};

use std::collections::BTreeMap;

use crate::auth::SecureString;
use crate::model::AccountModel;

#[derive(Debug, Clone, PartialEq)]
pub enum NetworkRequest {
    Authenticate {
        username: String,
        password: SecureString,
    },
    FetchAccount,
    FetchSettings,
    PostSettings {
        params: BTreeMap<String, String>,
    },
    NewAccount {
        username: String,
        password: SecureString,
        email: String,
        dry_run: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Authenticate,
    FetchAccount,
    FetchSettings,
    PostSettings,
    NewAccount,
}

impl NetworkRequest {
    pub fn kind(&self) -> RequestKind {
        match self {
            NetworkRequest::Authenticate { .. } => RequestKind::Authenticate,
            NetworkRequest::FetchAccount => RequestKind::FetchAccount,
            NetworkRequest::FetchSettings => RequestKind::FetchSettings,
            NetworkRequest::PostSettings { .. } => RequestKind::PostSettings,
            NetworkRequest::NewAccount { .. } => RequestKind::NewAccount,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NetworkResponse {
    Token(SecureString),
    Account(AccountModel),
    Settings(AccountModel),
    NewAccount { dry_run: bool },
}

pub type SuccessCallback = Box<dyn FnOnce(NetworkResponse) + Send>;
pub type FailureCallback = Box<dyn FnOnce(ClassifiedError) + Send>;

pub trait NetworkClient: Send + Sync {
    fn call(&self, request: NetworkRequest, on_success: SuccessCallback, on_failure: FailureCallback);
}
