use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category of a failure reported by the network collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    IncorrectUsernameOrPassword,
    NeedsTwoStepCode,
    InvalidToken,
    NotAuthenticated,
    UsernameExists,
    EmailExists,
    InvalidInput,
    NetworkUnavailable,
    Timeout,
    Server,
    InvalidResponse,
    /// Local persistence rejected the result.
    Storage,
    Generic,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IncorrectUsernameOrPassword => "incorrect_username_or_password",
            Self::NeedsTwoStepCode => "needs_2fa",
            Self::InvalidToken => "invalid_token",
            Self::NotAuthenticated => "not_authenticated",
            Self::UsernameExists => "username_exists",
            Self::EmailExists => "email_exists",
            Self::InvalidInput => "invalid_input",
            Self::NetworkUnavailable => "network_unavailable",
            Self::Timeout => "timeout",
            Self::Server => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::Storage => "storage_error",
            Self::Generic => "generic_error",
        }
    }

    /// Authentication-class failures mean the stored credential is unusable.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::IncorrectUsernameOrPassword
                | Self::NeedsTwoStepCode
                | Self::InvalidToken
                | Self::NotAuthenticated
        )
    }

    /// Map an HTTP status to the closest category.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => Self::InvalidInput,
            401 | 403 => Self::NotAuthenticated,
            408 | 504 => Self::Timeout,
            500..=599 => Self::Server,
            _ => Self::Generic,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured failure from an external collaborator.
///
/// Travels inside actions and change events; never raised across `dispatch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{kind}: {message}")]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidResponse, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }
}
