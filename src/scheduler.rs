//! Delayed delivery of actions, used for the fetch deadline check.

use std::time::Duration;

use tokio::runtime::Handle;

use crate::action::Action;
use crate::dispatcher::DispatchHandle;

pub trait Scheduler: Send + Sync {
    /// Dispatch `action` once `delay` has elapsed, outside any current pass.
    fn schedule(&self, delay: Duration, action: Action);
}

/// Sleeps on a tokio runtime, then dispatches from a blocking task.
pub struct TokioScheduler {
    handle: Handle,
    dispatcher: DispatchHandle,
}

impl TokioScheduler {
    pub fn new(handle: Handle, dispatcher: DispatchHandle) -> Self {
        Self { handle, dispatcher }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, action: Action) {
        let dispatcher = self.dispatcher.clone();
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            let name = action.name();
            let delivered = tokio::task::spawn_blocking(move || dispatcher.dispatch(action)).await;
            match delivered {
                Ok(Ok(())) => {}
                Ok(Err(err)) => tracing::warn!(action = name, "scheduled dispatch failed: {}", err),
                Err(err) => tracing::error!(action = name, "scheduled dispatch panicked: {}", err),
            }
        });
    }
}
