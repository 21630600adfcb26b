//! Actions: immutable `(type, payload)` pairs routed by the dispatcher.
//!
//! ```text
//! builder ──→ Action ──→ Dispatcher ──→ Store::on_action
//! ```
//!
//! The payload shape is fixed by the action type. Typed builders can only
//! produce matching pairs; `Action::new` and the dispatcher check pairs
//! that arrive any other way (deserialization, hand-built).

mod builder;
mod catalog;
mod payload;

pub use builder::{AccountActionBuilder, AuthenticationActionBuilder};
pub use catalog::{AccountAction, ActionType, AuthenticationAction, PayloadKind};
pub use payload::{
    AuthenticatePayload, AuthenticatedPayload, FetchTimeoutPayload, NewAccountPayload,
    NewAccountResponsePayload, Payload, PostAccountSettingsPayload, UpdateTokenPayload,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An action whose payload does not match the schema of its type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("payload mismatch for '{action}': expected {expected:?}, found {found:?}")]
pub struct PayloadMismatch {
    pub action: &'static str,
    pub expected: PayloadKind,
    pub found: PayloadKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    action_type: ActionType,
    payload: Payload,
}

impl Action {
    /// Build an action, rejecting payloads that don't fit the type.
    pub fn new(action_type: impl Into<ActionType>, payload: Payload) -> Result<Self, PayloadMismatch> {
        let action = Self {
            action_type: action_type.into(),
            payload,
        };
        action.validate()?;
        Ok(action)
    }

    pub fn action_type(&self) -> ActionType {
        self.action_type
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn name(&self) -> &'static str {
        self.action_type.name()
    }

    pub fn validate(&self) -> Result<(), PayloadMismatch> {
        let expected = self.action_type.payload_kind();
        let found = self.payload.kind();
        if expected != found {
            return Err(PayloadMismatch {
                action: self.name(),
                expected,
                found,
            });
        }
        if let Payload::Authenticate(AuthenticatePayload {
            next_action: Some(next),
            ..
        })
        | Payload::Authenticated(AuthenticatedPayload {
            next_action: Some(next),
            ..
        }) = &self.payload
        {
            next.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AccountModel;

    #[test]
    fn new_rejects_mismatched_payload() {
        let err = Action::new(AccountAction::FetchAccount, Payload::Account(AccountModel::default()))
            .unwrap_err();
        assert_eq!(err.expected, PayloadKind::None);
        assert_eq!(err.found, PayloadKind::Account);
        assert_eq!(err.action, "account.fetch_account");
    }

    #[test]
    fn new_accepts_matching_payload() {
        let action = Action::new(AccountAction::SignOut, Payload::None).unwrap();
        assert_eq!(action.action_type(), ActionType::Account(AccountAction::SignOut));
        assert_eq!(action.name(), "account.sign_out");
    }

    #[test]
    fn deserialized_mismatch_fails_validation() {
        let json = r#"{"type":{"account":"fetch_account"},"payload":{"kind":"fetch_timeout","data":{"generation":3}}}"#;
        let action: Action = serde_json::from_str(json).unwrap();
        assert!(action.validate().is_err());
    }

    #[test]
    fn nested_next_action_is_validated() {
        let bad_next = Action {
            action_type: ActionType::Account(AccountAction::UpdateAccount),
            payload: Payload::None,
        };
        let action = Action {
            action_type: ActionType::Authentication(AuthenticationAction::Authenticate),
            payload: Payload::Authenticate(AuthenticatePayload {
                username: "a".into(),
                password: "b".into(),
                next_action: Some(Box::new(bad_next)),
            }),
        };
        let err = action.validate().unwrap_err();
        assert_eq!(err.action, "account.update_account");
    }

    #[test]
    fn action_serializes_round_trip() {
        let action = AccountActionBuilder::new_update_account_action(AccountModel {
            user_name: "someone".into(),
            ..AccountModel::default()
        });
        let json = serde_json::to_string(&action).unwrap();
        let back: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(back, action);
    }
}
