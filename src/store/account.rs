//! Account store: the signed-in account and its access token.
//!
//! In-memory, persisted through the injected collaborators. A composite fetch
//! issues the account-info and account-settings calls together and joins them;
//! the last one to land defers an `UpdateAccount` carrying the merged entity.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::action::{
    AccountAction, AccountActionBuilder, Action, ActionType, AuthenticatePayload,
    AuthenticationAction, AuthenticationActionBuilder, NewAccountPayload,
    NewAccountResponsePayload, Payload,
};
use crate::auth::{AccessToken, SecureString};
use crate::dispatcher::DispatchHandle;
use crate::model::{AccountModel, DEFAULT_ACCOUNT_ID};
use crate::network::{ClassifiedError, NetworkClient, NetworkRequest, NetworkResponse};
use crate::persistence::{Persistence, PersistenceError};
use crate::scheduler::Scheduler;
use crate::store::{
    ChangeEmitter, DeadlineCheck, EmitsChanges, FetchJoin, FetchStatus, JoinProgress, Store,
    StoreError,
};

/// The two halves of a composite account fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountFetchPart {
    Account,
    Settings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OnAccountChanged {
    pub account_infos_changed: bool,
    /// Action that produced the change; `None` for the registration snapshot.
    pub cause: Option<AccountAction>,
    pub account: AccountModel,
    pub error: Option<ClassifiedError>,
}

impl OnAccountChanged {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OnAuthenticationChanged {
    pub error: Option<ClassifiedError>,
}

impl OnAuthenticationChanged {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OnNewUserCreated {
    pub dry_run: bool,
    pub error: Option<ClassifiedError>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AccountEvent {
    AccountChanged(OnAccountChanged),
    AuthenticationChanged(OnAuthenticationChanged),
    NewUserCreated(OnNewUserCreated),
}

/// External collaborators the account store is built from.
#[derive(Clone)]
pub struct AccountCollaborators {
    pub network: Arc<dyn NetworkClient>,
    pub scheduler: Arc<dyn Scheduler>,
    pub accounts: Arc<dyn Persistence<AccountModel>>,
    pub access_token: AccessToken,
}

pub struct AccountStore {
    dispatcher: DispatchHandle,
    network: Arc<dyn NetworkClient>,
    scheduler: Arc<dyn Scheduler>,
    accounts: Arc<dyn Persistence<AccountModel>>,
    access_token: AccessToken,
    account: AccountModel,
    fetch: FetchJoin<AccountFetchPart>,
    changes: ChangeEmitter<AccountEvent>,
}

impl AccountStore {
    /// Build the store from persisted state, or an empty account if none.
    pub fn new(
        dispatcher: DispatchHandle,
        collaborators: AccountCollaborators,
        fetch_timeout: Duration,
    ) -> Result<Self, PersistenceError> {
        let account = collaborators
            .accounts
            .get(DEFAULT_ACCOUNT_ID)?
            .unwrap_or_default();
        Ok(Self {
            dispatcher,
            network: collaborators.network,
            scheduler: collaborators.scheduler,
            accounts: collaborators.accounts,
            access_token: collaborators.access_token,
            account,
            fetch: FetchJoin::new(fetch_timeout),
            changes: ChangeEmitter::new(),
        })
    }

    pub fn account(&self) -> &AccountModel {
        &self.account
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token.exists()
    }

    /// Signed in with a token, or holding at least one visible site.
    ///
    /// Recomputed on every call; either input changes independently.
    pub fn is_signed_in(&self) -> bool {
        self.has_access_token() || self.account.visible_site_count > 0
    }

    pub fn fetch_status(&self) -> FetchStatus {
        self.fetch.status()
    }

    fn on_authentication_action(
        &mut self,
        kind: AuthenticationAction,
        payload: &Payload,
    ) -> Result<(), StoreError> {
        match (kind, payload) {
            (AuthenticationAction::Authenticate, Payload::Authenticate(payload)) => {
                self.authenticate(payload);
            }
            (AuthenticationAction::Authenticated, Payload::Authenticated(payload)) => {
                self.store_token(payload.token.clone())?;
                if let Some(next) = &payload.next_action {
                    self.dispatcher.defer(next.as_ref().clone())?;
                }
                info!("authenticated");
                self.emit_change(AccountEvent::AuthenticationChanged(
                    OnAuthenticationChanged { error: None },
                ));
            }
            (AuthenticationAction::AuthenticateError, Payload::Error(err)) => {
                error!(kind = %err.kind, "Authentication error: {}", err.message);
                self.emit_auth_error(err.clone());
            }
            _ => {}
        }
        Ok(())
    }

    fn on_account_action(&mut self, kind: AccountAction, payload: &Payload) -> Result<(), StoreError> {
        match (kind, payload) {
            (AccountAction::FetchAccount, Payload::None) => {
                self.start_fetch(&[AccountFetchPart::Account, AccountFetchPart::Settings]);
            }
            (AccountAction::FetchSettings, Payload::None) => {
                self.start_fetch(&[AccountFetchPart::Settings]);
            }
            (AccountAction::FetchedAccount, Payload::Account(model)) => {
                self.apply_fetched(AccountFetchPart::Account, model, kind)?;
            }
            (AccountAction::FetchedSettings, Payload::Account(model)) => {
                self.apply_fetched(AccountFetchPart::Settings, model, kind)?;
            }
            (AccountAction::FetchAccountError | AccountAction::FetchSettingsError, Payload::Error(err)) => {
                // Left pending; the deadline check resets the fetch.
                warn!(
                    action = kind_name(kind),
                    kind = %err.kind,
                    auth_failure = err.kind.is_auth_failure(),
                    "sub-fetch failed: {}",
                    err.message
                );
            }
            (AccountAction::FetchTimedOut, Payload::FetchTimeout(timeout)) => {
                self.check_fetch_deadline(timeout.generation);
            }
            (AccountAction::PostSettings, Payload::PostSettings(payload)) => {
                self.call_network(
                    NetworkRequest::PostSettings {
                        params: payload.params.clone(),
                    },
                    |response| match response {
                        NetworkResponse::Settings(model) => {
                            AccountActionBuilder::new_posted_settings_action(model)
                        }
                        other => AccountActionBuilder::new_post_settings_error_action(unexpected(&other)),
                    },
                    AccountActionBuilder::new_post_settings_error_action,
                );
            }
            (AccountAction::PostedSettings, Payload::Account(model)) => {
                let mut merged = self.account.clone();
                merged.copy_account_settings_attributes(model);
                self.commit(merged)?;
                self.emit_account_changed(true, kind, None);
            }
            (AccountAction::PostSettingsError, Payload::Error(err)) => {
                warn!(kind = %err.kind, "posting settings failed: {}", err.message);
                self.emit_account_changed(false, kind, Some(err.clone()));
            }
            (AccountAction::UpdateAccount, Payload::Account(model)) => {
                self.commit(model.clone())?;
                self.emit_account_changed(true, kind, None);
            }
            (AccountAction::UpdateAccessToken, Payload::UpdateToken(payload)) => {
                self.store_token(payload.token.clone())?;
                self.emit_change(AccountEvent::AuthenticationChanged(
                    OnAuthenticationChanged { error: None },
                ));
            }
            (AccountAction::SignOut, Payload::None) => self.sign_out()?,
            (AccountAction::CreateNewAccount, Payload::NewAccount(payload)) => {
                self.create_new_account(payload);
            }
            (AccountAction::CreatedNewAccount, Payload::NewAccountResponse(payload)) => {
                self.emit_change(AccountEvent::NewUserCreated(OnNewUserCreated {
                    dry_run: payload.dry_run,
                    error: payload.error.clone(),
                }));
            }
            _ => {}
        }
        Ok(())
    }

    fn authenticate(&self, payload: &AuthenticatePayload) {
        debug!(username = %payload.username, "authenticating");
        let next_action = payload.next_action.clone();
        self.call_network(
            NetworkRequest::Authenticate {
                username: payload.username.clone(),
                password: payload.password.clone(),
            },
            move |response| match response {
                NetworkResponse::Token(token) => {
                    AuthenticationActionBuilder::new_authenticated_action(token.expose(), next_action)
                }
                other => AuthenticationActionBuilder::new_authenticate_error_action(unexpected(&other)),
            },
            AuthenticationActionBuilder::new_authenticate_error_action,
        );
    }

    /// Begin a fetch over `parts`; dropped while another fetch is pending.
    fn start_fetch(&mut self, parts: &[AccountFetchPart]) {
        let Some(generation) = self.fetch.begin(parts, Instant::now()) else {
            debug!(?parts, "account fetch already in flight; request dropped");
            return;
        };
        debug!(generation, ?parts, "account fetch started");
        self.scheduler.schedule(
            self.fetch.timeout(),
            AccountActionBuilder::new_fetch_timed_out_action(generation),
        );
        for part in parts {
            match part {
                AccountFetchPart::Account => self.call_network(
                    NetworkRequest::FetchAccount,
                    |response| match response {
                        NetworkResponse::Account(model) => {
                            AccountActionBuilder::new_fetched_account_action(model)
                        }
                        other => AccountActionBuilder::new_fetch_account_error_action(unexpected(&other)),
                    },
                    AccountActionBuilder::new_fetch_account_error_action,
                ),
                AccountFetchPart::Settings => self.call_network(
                    NetworkRequest::FetchSettings,
                    |response| match response {
                        NetworkResponse::Settings(model) => {
                            AccountActionBuilder::new_fetched_settings_action(model)
                        }
                        other => AccountActionBuilder::new_fetch_settings_error_action(unexpected(&other)),
                    },
                    AccountActionBuilder::new_fetch_settings_error_action,
                ),
            }
        }
    }

    fn apply_fetched(
        &mut self,
        part: AccountFetchPart,
        model: &AccountModel,
        cause: AccountAction,
    ) -> Result<(), StoreError> {
        let mut merged = self.account.clone();
        match part {
            AccountFetchPart::Account => merged.copy_account_attributes(model),
            AccountFetchPart::Settings => merged.copy_account_settings_attributes(model),
        }
        self.commit(merged)?;

        match self.fetch.complete(part, Instant::now()) {
            JoinProgress::Joined => {
                info!("account fetch complete");
                self.dispatcher
                    .defer(AccountActionBuilder::new_update_account_action(self.account.clone()))?;
            }
            JoinProgress::Partial { remaining } => debug!(?part, remaining, "account fetch progress"),
            JoinProgress::Ignored => debug!(?part, "fetch result outside a pending fetch"),
        }
        self.emit_account_changed(true, cause, None);
        Ok(())
    }

    fn check_fetch_deadline(&mut self, generation: u64) {
        match self.fetch.check_deadline(generation, Instant::now()) {
            DeadlineCheck::Stale => debug!(generation, "stale fetch deadline ignored"),
            DeadlineCheck::NotYet { remaining } => {
                self.scheduler.schedule(
                    remaining,
                    AccountActionBuilder::new_fetch_timed_out_action(generation),
                );
            }
            DeadlineCheck::Expired { missing } => {
                warn!(generation, ?missing, "account fetch timed out; reset to idle");
                let error = ClassifiedError::timeout(format!(
                    "account fetch timed out waiting for {:?}",
                    missing
                ));
                self.emit_account_changed(false, AccountAction::FetchTimedOut, Some(error));
            }
        }
    }

    fn create_new_account(&self, payload: &NewAccountPayload) {
        let dry_run = payload.dry_run;
        self.call_network(
            NetworkRequest::NewAccount {
                username: payload.username.clone(),
                password: payload.password.clone(),
                email: payload.email.clone(),
                dry_run,
            },
            move |response| {
                let error = match response {
                    NetworkResponse::NewAccount { .. } => None,
                    other => Some(unexpected(&other)),
                };
                AccountActionBuilder::new_created_new_account_action(NewAccountResponsePayload {
                    dry_run,
                    error,
                })
            },
            move |error| {
                AccountActionBuilder::new_created_new_account_action(NewAccountResponsePayload {
                    dry_run,
                    error: Some(error),
                })
            },
        );
    }

    /// Memory follows each persisted step, so a failed token delete still
    /// leaves the account reset on both sides.
    fn sign_out(&mut self) -> Result<(), StoreError> {
        self.accounts.delete(DEFAULT_ACCOUNT_ID)?;
        self.account = AccountModel::default();
        self.emit_account_changed(true, AccountAction::SignOut, None);

        if let Err(err) = self.access_token.clear() {
            error!("Failed to delete access token: {}", err);
            self.emit_auth_error(ClassifiedError::storage(format!(
                "access token not deleted: {}",
                err
            )));
            return Err(err.into());
        }
        info!("signed out");
        self.emit_change(AccountEvent::AuthenticationChanged(OnAuthenticationChanged {
            error: None,
        }));
        Ok(())
    }

    /// Persist a new token. A storage failure is also published, since the
    /// action usually arrives from a network callback nobody waits on.
    fn store_token(&self, token: SecureString) -> Result<(), StoreError> {
        if let Err(err) = self.access_token.set(token) {
            error!("Failed to persist access token: {}", err);
            self.emit_auth_error(ClassifiedError::storage(format!(
                "access token not saved: {}",
                err
            )));
            return Err(err.into());
        }
        Ok(())
    }

    fn emit_auth_error(&self, error: ClassifiedError) {
        self.emit_change(AccountEvent::AuthenticationChanged(OnAuthenticationChanged {
            error: Some(error),
        }));
    }

    /// Persist first; memory only moves once the write succeeded.
    fn commit(&mut self, account: AccountModel) -> Result<(), PersistenceError> {
        self.accounts.upsert(&account)?;
        self.account = account;
        Ok(())
    }

    fn emit_account_changed(
        &self,
        account_infos_changed: bool,
        cause: AccountAction,
        error: Option<ClassifiedError>,
    ) {
        self.emit_change(AccountEvent::AccountChanged(OnAccountChanged {
            account_infos_changed,
            cause: Some(cause),
            account: self.account.clone(),
            error,
        }));
    }

    /// Issue a network call whose outcome comes back as an action.
    fn call_network<S, F>(&self, request: NetworkRequest, on_success: S, on_failure: F)
    where
        S: FnOnce(NetworkResponse) -> Action + Send + 'static,
        F: FnOnce(ClassifiedError) -> Action + Send + 'static,
    {
        let success_handle = self.dispatcher.clone();
        let failure_handle = self.dispatcher.clone();
        self.network.call(
            request,
            Box::new(move |response| report(&success_handle, on_success(response))),
            Box::new(move |error| report(&failure_handle, on_failure(error))),
        );
    }
}

fn report(dispatcher: &DispatchHandle, action: Action) {
    let name = action.name();
    if let Err(err) = dispatcher.post(action) {
        warn!(action = name, "result dispatch failed: {}", err);
    }
}

fn unexpected(response: &NetworkResponse) -> ClassifiedError {
    ClassifiedError::invalid_response(format!("unexpected response: {:?}", response))
}

fn kind_name(kind: AccountAction) -> &'static str {
    ActionType::Account(kind).name()
}

impl EmitsChanges for AccountStore {
    type Event = AccountEvent;

    fn changes(&self) -> &ChangeEmitter<AccountEvent> {
        &self.changes
    }
}

impl Store for AccountStore {
    fn name(&self) -> &'static str {
        "account"
    }

    /// Startup snapshot for observers attached before registration.
    fn on_register(&mut self) {
        debug!("account store registered");
        self.emit_change(AccountEvent::AccountChanged(OnAccountChanged {
            account_infos_changed: false,
            cause: None,
            account: self.account.clone(),
            error: None,
        }));
        self.emit_change(AccountEvent::AuthenticationChanged(OnAuthenticationChanged {
            error: None,
        }));
    }

    fn on_action(&mut self, action: &Action) -> Result<(), StoreError> {
        match action.action_type() {
            ActionType::Account(kind) => self.on_account_action(kind, action.payload()),
            ActionType::Authentication(kind) => self.on_authentication_action(kind, action.payload()),
        }
    }
}
