//! Typed constructors: one function per catalog entry, each producing a
//! schema-correct action.

use std::collections::BTreeMap;

use crate::action::catalog::{AccountAction, ActionType, AuthenticationAction};
use crate::action::payload::{
    AuthenticatePayload, AuthenticatedPayload, FetchTimeoutPayload, NewAccountPayload,
    NewAccountResponsePayload, Payload, PostAccountSettingsPayload, UpdateTokenPayload,
};
use crate::action::Action;
use crate::auth::SecureString;
use crate::model::AccountModel;
use crate::network::ClassifiedError;

fn account(action: AccountAction, payload: Payload) -> Action {
    Action {
        action_type: ActionType::Account(action),
        payload,
    }
}

fn authentication(action: AuthenticationAction, payload: Payload) -> Action {
    Action {
        action_type: ActionType::Authentication(action),
        payload,
    }
}

pub struct AccountActionBuilder;

impl AccountActionBuilder {
    pub fn new_fetch_account_action() -> Action {
        account(AccountAction::FetchAccount, Payload::None)
    }

    pub fn new_fetch_settings_action() -> Action {
        account(AccountAction::FetchSettings, Payload::None)
    }

    pub fn new_fetched_account_action(model: AccountModel) -> Action {
        account(AccountAction::FetchedAccount, Payload::Account(model))
    }

    pub fn new_fetch_account_error_action(error: ClassifiedError) -> Action {
        account(AccountAction::FetchAccountError, Payload::Error(error))
    }

    pub fn new_fetched_settings_action(model: AccountModel) -> Action {
        account(AccountAction::FetchedSettings, Payload::Account(model))
    }

    pub fn new_fetch_settings_error_action(error: ClassifiedError) -> Action {
        account(AccountAction::FetchSettingsError, Payload::Error(error))
    }

    pub fn new_fetch_timed_out_action(generation: u64) -> Action {
        account(
            AccountAction::FetchTimedOut,
            Payload::FetchTimeout(FetchTimeoutPayload { generation }),
        )
    }

    pub fn new_post_settings_action(params: BTreeMap<String, String>) -> Action {
        account(
            AccountAction::PostSettings,
            Payload::PostSettings(PostAccountSettingsPayload { params }),
        )
    }

    pub fn new_posted_settings_action(model: AccountModel) -> Action {
        account(AccountAction::PostedSettings, Payload::Account(model))
    }

    pub fn new_post_settings_error_action(error: ClassifiedError) -> Action {
        account(AccountAction::PostSettingsError, Payload::Error(error))
    }

    pub fn new_update_account_action(model: AccountModel) -> Action {
        account(AccountAction::UpdateAccount, Payload::Account(model))
    }

    pub fn new_update_access_token_action(token: impl Into<String>) -> Action {
        account(
            AccountAction::UpdateAccessToken,
            Payload::UpdateToken(UpdateTokenPayload {
                token: SecureString::new(token.into()),
            }),
        )
    }

    pub fn new_sign_out_action() -> Action {
        account(AccountAction::SignOut, Payload::None)
    }

    pub fn new_create_new_account_action(payload: NewAccountPayload) -> Action {
        account(AccountAction::CreateNewAccount, Payload::NewAccount(payload))
    }

    pub fn new_created_new_account_action(payload: NewAccountResponsePayload) -> Action {
        account(
            AccountAction::CreatedNewAccount,
            Payload::NewAccountResponse(payload),
        )
    }
}

pub struct AuthenticationActionBuilder;

impl AuthenticationActionBuilder {
    pub fn new_authenticate_action(
        username: impl Into<String>,
        password: impl Into<String>,
        next_action: Option<Action>,
    ) -> Action {
        authentication(
            AuthenticationAction::Authenticate,
            Payload::Authenticate(AuthenticatePayload {
                username: username.into(),
                password: SecureString::new(password.into()),
                next_action: next_action.map(Box::new),
            }),
        )
    }

    pub fn new_authenticated_action(token: impl Into<String>, next_action: Option<Box<Action>>) -> Action {
        authentication(
            AuthenticationAction::Authenticated,
            Payload::Authenticated(AuthenticatedPayload {
                token: SecureString::new(token.into()),
                next_action,
            }),
        )
    }

    pub fn new_authenticate_error_action(error: ClassifiedError) -> Action {
        authentication(AuthenticationAction::AuthenticateError, Payload::Error(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::ErrorKind;

    #[test]
    fn builders_produce_valid_actions() {
        let error = ClassifiedError::new(ErrorKind::Timeout, "slow");
        let actions = vec![
            AccountActionBuilder::new_fetch_account_action(),
            AccountActionBuilder::new_fetch_settings_action(),
            AccountActionBuilder::new_fetched_account_action(AccountModel::default()),
            AccountActionBuilder::new_fetch_account_error_action(error.clone()),
            AccountActionBuilder::new_fetched_settings_action(AccountModel::default()),
            AccountActionBuilder::new_fetch_settings_error_action(error.clone()),
            AccountActionBuilder::new_fetch_timed_out_action(1),
            AccountActionBuilder::new_post_settings_action(BTreeMap::new()),
            AccountActionBuilder::new_posted_settings_action(AccountModel::default()),
            AccountActionBuilder::new_post_settings_error_action(error.clone()),
            AccountActionBuilder::new_update_account_action(AccountModel::default()),
            AccountActionBuilder::new_update_access_token_action("t"),
            AccountActionBuilder::new_sign_out_action(),
            AccountActionBuilder::new_create_new_account_action(NewAccountPayload {
                username: "u".into(),
                password: "p".into(),
                email: "e@example.com".into(),
                dry_run: true,
            }),
            AccountActionBuilder::new_created_new_account_action(NewAccountResponsePayload {
                dry_run: true,
                error: None,
            }),
            AuthenticationActionBuilder::new_authenticate_action(
                "a",
                "b",
                Some(AccountActionBuilder::new_fetch_account_action()),
            ),
            AuthenticationActionBuilder::new_authenticated_action("t", None),
            AuthenticationActionBuilder::new_authenticate_error_action(error),
        ];
        for action in &actions {
            assert!(action.validate().is_ok(), "{} invalid", action.name());
        }
        assert_eq!(actions.len(), ActionType::catalog().len());
    }
}
