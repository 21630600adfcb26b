use thiserror::Error;

use crate::action::PayloadMismatch;
use crate::store::StoreError;

/// Why a store failed to handle an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    Error(String),
    Panic(String),
}

/// One store's failure during one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreFailure {
    pub store: &'static str,
    pub action: &'static str,
    pub cause: FailureCause,
}

impl StoreFailure {
    pub(crate) fn from_error(store: &'static str, action: &'static str, err: &StoreError) -> Self {
        Self {
            store,
            action,
            cause: FailureCause::Error(err.to_string()),
        }
    }
}

impl std::fmt::Display for StoreFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            FailureCause::Error(message) => {
                write!(f, "store '{}' failed on '{}': {}", self.store, self.action, message)
            }
            FailureCause::Panic(message) => {
                write!(f, "store '{}' panicked on '{}': {}", self.store, self.action, message)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// `dispatch` was called from inside a pass on the same thread.
    #[error("re-entrant dispatch of '{action}' while another action is being dispatched")]
    ReentrantDispatch { action: &'static str },

    #[error(transparent)]
    PayloadMismatch(#[from] PayloadMismatch),

    /// Every store saw the action; these ones failed.
    #[error("{}", describe(failures))]
    StoreFailures { failures: Vec<StoreFailure> },

    /// The dispatcher behind a weak handle has been dropped.
    #[error("dispatcher is gone; '{action}' was not delivered")]
    Closed { action: &'static str },
}

impl DispatchError {
    pub fn failures(&self) -> &[StoreFailure] {
        match self {
            DispatchError::StoreFailures { failures } => failures,
            _ => &[],
        }
    }
}

fn describe(failures: &[StoreFailure]) -> String {
    let details: Vec<String> = failures.iter().map(ToString::to_string).collect();
    format!("{} store failure(s): {}", failures.len(), details.join("; "))
}
