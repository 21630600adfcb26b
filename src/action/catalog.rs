//! The closed catalog of action types and the payload schema each declares.
//!
//! Adding an action type: add a variant to the owning store's enum and one
//! arm in `payload_kind()` / `name()`. Names are stable once published, and
//! existing variants never change their payload kind.

use serde::{Deserialize, Serialize};

/// Actions owned by the account store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountAction {
    /// Request a composite fetch (account info + account settings).
    FetchAccount,
    /// Request the account settings alone.
    FetchSettings,
    /// Account info sub-fetch landed.
    FetchedAccount,
    /// Account info sub-fetch failed.
    FetchAccountError,
    /// Account settings sub-fetch landed.
    FetchedSettings,
    /// Account settings sub-fetch failed.
    FetchSettingsError,
    /// Deadline check for an in-flight composite fetch.
    FetchTimedOut,
    /// Request saving account settings remotely.
    PostSettings,
    /// Settings post succeeded.
    PostedSettings,
    /// Settings post failed.
    PostSettingsError,
    /// Replace the in-memory and persisted account.
    UpdateAccount,
    /// Replace the in-memory and persisted access token.
    UpdateAccessToken,
    /// Delete the persisted account, reset memory, drop the token.
    SignOut,
    /// Create (or dry-run validate) a new account.
    CreateNewAccount,
    /// Response to account creation.
    CreatedNewAccount,
}

impl AccountAction {
    pub fn all() -> &'static [AccountAction] {
        &[
            Self::FetchAccount,
            Self::FetchSettings,
            Self::FetchedAccount,
            Self::FetchAccountError,
            Self::FetchedSettings,
            Self::FetchSettingsError,
            Self::FetchTimedOut,
            Self::PostSettings,
            Self::PostedSettings,
            Self::PostSettingsError,
            Self::UpdateAccount,
            Self::UpdateAccessToken,
            Self::SignOut,
            Self::CreateNewAccount,
            Self::CreatedNewAccount,
        ]
    }
}

/// Actions owned by the authentication slice of the account store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticationAction {
    Authenticate,
    Authenticated,
    AuthenticateError,
}

impl AuthenticationAction {
    pub fn all() -> &'static [AuthenticationAction] {
        &[Self::Authenticate, Self::Authenticated, Self::AuthenticateError]
    }
}

/// Every action type the runtime knows about, partitioned by owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Account(AccountAction),
    Authentication(AuthenticationAction),
}

/// Shape of the payload an action type carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    None,
    Authenticate,
    Authenticated,
    Account,
    Error,
    FetchTimeout,
    PostSettings,
    UpdateToken,
    NewAccount,
    NewAccountResponse,
}

impl ActionType {
    /// Payload schema declared for this action type.
    pub fn payload_kind(&self) -> PayloadKind {
        match self {
            ActionType::Account(action) => match action {
                AccountAction::FetchAccount
                | AccountAction::FetchSettings
                | AccountAction::SignOut => PayloadKind::None,
                AccountAction::FetchedAccount
                | AccountAction::FetchedSettings
                | AccountAction::PostedSettings
                | AccountAction::UpdateAccount => PayloadKind::Account,
                AccountAction::FetchAccountError
                | AccountAction::FetchSettingsError
                | AccountAction::PostSettingsError => PayloadKind::Error,
                AccountAction::FetchTimedOut => PayloadKind::FetchTimeout,
                AccountAction::PostSettings => PayloadKind::PostSettings,
                AccountAction::UpdateAccessToken => PayloadKind::UpdateToken,
                AccountAction::CreateNewAccount => PayloadKind::NewAccount,
                AccountAction::CreatedNewAccount => PayloadKind::NewAccountResponse,
            },
            ActionType::Authentication(action) => match action {
                AuthenticationAction::Authenticate => PayloadKind::Authenticate,
                AuthenticationAction::Authenticated => PayloadKind::Authenticated,
                AuthenticationAction::AuthenticateError => PayloadKind::Error,
            },
        }
    }

    /// Stable dotted name used in logs and error reports.
    pub fn name(&self) -> &'static str {
        match self {
            ActionType::Account(action) => match action {
                AccountAction::FetchAccount => "account.fetch_account",
                AccountAction::FetchSettings => "account.fetch_settings",
                AccountAction::FetchedAccount => "account.fetched_account",
                AccountAction::FetchAccountError => "account.fetch_account_error",
                AccountAction::FetchedSettings => "account.fetched_settings",
                AccountAction::FetchSettingsError => "account.fetch_settings_error",
                AccountAction::FetchTimedOut => "account.fetch_timed_out",
                AccountAction::PostSettings => "account.post_settings",
                AccountAction::PostedSettings => "account.posted_settings",
                AccountAction::PostSettingsError => "account.post_settings_error",
                AccountAction::UpdateAccount => "account.update_account",
                AccountAction::UpdateAccessToken => "account.update_access_token",
                AccountAction::SignOut => "account.sign_out",
                AccountAction::CreateNewAccount => "account.create_new_account",
                AccountAction::CreatedNewAccount => "account.created_new_account",
            },
            ActionType::Authentication(action) => match action {
                AuthenticationAction::Authenticate => "authentication.authenticate",
                AuthenticationAction::Authenticated => "authentication.authenticated",
                AuthenticationAction::AuthenticateError => "authentication.authenticate_error",
            },
        }
    }

    /// Every `(type, payload kind)` pair in declaration order.
    pub fn catalog() -> Vec<(ActionType, PayloadKind)> {
        AccountAction::all()
            .iter()
            .map(|a| ActionType::Account(*a))
            .chain(
                AuthenticationAction::all()
                    .iter()
                    .map(|a| ActionType::Authentication(*a)),
            )
            .map(|t| (t, t.payload_kind()))
            .collect()
    }
}

impl From<AccountAction> for ActionType {
    fn from(action: AccountAction) -> Self {
        ActionType::Account(action)
    }
}

impl From<AuthenticationAction> for ActionType {
    fn from(action: AuthenticationAction) -> Self {
        ActionType::Authentication(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalog_names_are_unique() {
        let catalog = ActionType::catalog();
        let names: HashSet<_> = catalog.iter().map(|(t, _)| t.name()).collect();
        assert_eq!(names.len(), catalog.len());
    }

    #[test]
    fn catalog_covers_both_owners() {
        let catalog = ActionType::catalog();
        assert_eq!(
            catalog.len(),
            AccountAction::all().len() + AuthenticationAction::all().len()
        );
        assert!(catalog
            .iter()
            .any(|(t, _)| matches!(t, ActionType::Authentication(_))));
    }

    #[test]
    fn fetch_results_carry_account_payloads() {
        assert_eq!(
            ActionType::from(AccountAction::FetchedAccount).payload_kind(),
            PayloadKind::Account
        );
        assert_eq!(
            ActionType::from(AccountAction::FetchedSettings).payload_kind(),
            PayloadKind::Account
        );
        assert_eq!(
            ActionType::from(AccountAction::FetchAccount).payload_kind(),
            PayloadKind::None
        );
    }
}
