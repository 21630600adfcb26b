//! In-process backend that answers requests after a fixed latency on a
//! tokio runtime. Used by the CLI and by tests that want real threading.

use std::time::Duration;

use tokio::runtime::Handle;

use super::{
    ClassifiedError, ErrorKind, FailureCallback, NetworkClient, NetworkRequest, NetworkResponse,
    SuccessCallback,
};
use crate::auth::SecureString;
use crate::config::NetworkConfig;
use crate::model::AccountModel;

/// Failure switches for exercising error paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulatedBehavior {
    pub fail_auth: bool,
    pub fail_settings: bool,
}

impl From<&NetworkConfig> for SimulatedBehavior {
    fn from(config: &NetworkConfig) -> Self {
        Self {
            fail_auth: config.fail_auth,
            fail_settings: config.fail_settings,
        }
    }
}

pub struct SimulatedNetwork {
    handle: Handle,
    latency: Duration,
    behavior: SimulatedBehavior,
    account: AccountModel,
}

impl SimulatedNetwork {
    pub fn new(handle: Handle, latency: Duration, behavior: SimulatedBehavior) -> Self {
        Self {
            handle,
            latency,
            behavior,
            account: sample_account(),
        }
    }

    pub fn from_config(handle: Handle, config: &NetworkConfig) -> Self {
        Self::new(handle, config.latency(), SimulatedBehavior::from(config))
    }

    fn respond(&self, request: &NetworkRequest) -> Result<NetworkResponse, ClassifiedError> {
        match request {
            NetworkRequest::Authenticate { username, password } => {
                if self.behavior.fail_auth || username.is_empty() || password.is_empty() {
                    return Err(ClassifiedError::new(
                        ErrorKind::IncorrectUsernameOrPassword,
                        "Incorrect username or password.",
                    ));
                }
                let token = uuid::Uuid::new_v4().simple().to_string();
                Ok(NetworkResponse::Token(SecureString::new(token)))
            }
            NetworkRequest::FetchAccount => Ok(NetworkResponse::Account(self.account.clone())),
            NetworkRequest::FetchSettings => {
                if self.behavior.fail_settings {
                    return Err(ClassifiedError::new(
                        ErrorKind::from_status(503),
                        "settings endpoint unavailable",
                    ));
                }
                Ok(NetworkResponse::Settings(self.account.clone()))
            }
            NetworkRequest::PostSettings { params } => {
                let mut settings = self.account.clone();
                for (key, value) in params {
                    match key.as_str() {
                        "first_name" => settings.first_name = value.clone(),
                        "last_name" => settings.last_name = value.clone(),
                        "about_me" => settings.about_me = value.clone(),
                        "web_address" => settings.web_address = value.clone(),
                        "new_email" => {
                            settings.new_email = value.clone();
                            settings.pending_email_change = true;
                        }
                        other => {
                            return Err(ClassifiedError::new(
                                ErrorKind::InvalidInput,
                                format!("unknown setting '{}'", other),
                            ))
                        }
                    }
                }
                Ok(NetworkResponse::Settings(settings))
            }
            NetworkRequest::NewAccount {
                username,
                email,
                dry_run,
                ..
            } => {
                if username == &self.account.user_name {
                    return Err(ClassifiedError::new(
                        ErrorKind::UsernameExists,
                        "That username is taken.",
                    ));
                }
                if !email.contains('@') {
                    return Err(ClassifiedError::new(
                        ErrorKind::InvalidInput,
                        "Please enter a valid email address.",
                    ));
                }
                Ok(NetworkResponse::NewAccount { dry_run: *dry_run })
            }
        }
    }
}

impl NetworkClient for SimulatedNetwork {
    fn call(&self, request: NetworkRequest, on_success: SuccessCallback, on_failure: FailureCallback) {
        let outcome = self.respond(&request);
        let latency = self.latency;
        let kind = request.kind();
        self.handle.spawn(async move {
            tokio::time::sleep(latency).await;
            tracing::debug!(?kind, ok = outcome.is_ok(), "simulated response");
            // Callbacks re-enter the dispatcher, which may block on a pass.
            let completed = tokio::task::spawn_blocking(move || match outcome {
                Ok(response) => on_success(response),
                Err(error) => on_failure(error),
            })
            .await;
            if let Err(err) = completed {
                tracing::error!(?kind, "network callback panicked: {}", err);
            }
        });
    }
}

fn sample_account() -> AccountModel {
    AccountModel {
        user_id: 1001,
        user_name: "demo".to_string(),
        email: "demo@example.com".to_string(),
        display_name: "Demo User".to_string(),
        profile_url: "https://example.com/demo".to_string(),
        avatar_url: "https://example.com/demo.png".to_string(),
        primary_site_id: 77,
        site_count: 2,
        visible_site_count: 1,
        date: "2016-01-01T00:00:00Z".to_string(),
        first_name: "Demo".to_string(),
        last_name: "User".to_string(),
        about_me: "Just testing.".to_string(),
        new_email: String::new(),
        pending_email_change: false,
        web_address: "https://demo.example.com".to_string(),
    }
}
