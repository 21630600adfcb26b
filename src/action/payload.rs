use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::action::catalog::PayloadKind;
use crate::action::Action;
use crate::auth::SecureString;
use crate::model::AccountModel;
use crate::network::ClassifiedError;

/// Tagged union of every payload shape in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Payload {
    None,
    Authenticate(AuthenticatePayload),
    Authenticated(AuthenticatedPayload),
    Account(AccountModel),
    Error(ClassifiedError),
    FetchTimeout(FetchTimeoutPayload),
    PostSettings(PostAccountSettingsPayload),
    UpdateToken(UpdateTokenPayload),
    NewAccount(NewAccountPayload),
    NewAccountResponse(NewAccountResponsePayload),
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::None => PayloadKind::None,
            Payload::Authenticate(_) => PayloadKind::Authenticate,
            Payload::Authenticated(_) => PayloadKind::Authenticated,
            Payload::Account(_) => PayloadKind::Account,
            Payload::Error(_) => PayloadKind::Error,
            Payload::FetchTimeout(_) => PayloadKind::FetchTimeout,
            Payload::PostSettings(_) => PayloadKind::PostSettings,
            Payload::UpdateToken(_) => PayloadKind::UpdateToken,
            Payload::NewAccount(_) => PayloadKind::NewAccount,
            Payload::NewAccountResponse(_) => PayloadKind::NewAccountResponse,
        }
    }
}

/// Credentials plus an optional action to run once a token is obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticatePayload {
    pub username: String,
    pub password: SecureString,
    #[serde(default)]
    pub next_action: Option<Box<Action>>,
}

/// Result of a successful authenticate call, carried back into the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticatedPayload {
    pub token: SecureString,
    #[serde(default)]
    pub next_action: Option<Box<Action>>,
}

/// Identifies which fetch generation a deadline check belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchTimeoutPayload {
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PostAccountSettingsPayload {
    pub params: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateTokenPayload {
    pub token: SecureString,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAccountPayload {
    pub username: String,
    pub password: SecureString,
    pub email: String,
    /// Validate only; do not create.
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAccountResponsePayload {
    pub dry_run: bool,
    #[serde(default)]
    pub error: Option<ClassifiedError>,
}
