//! Access token state and credential masking.
//!
//! The access token is the process-wide "signed in" credential. Exactly one
//! store owns an `AccessToken`; it is loaded from persistence at startup and
//! written through on every change.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::persistence::{Entity, Persistence, PersistenceError};

const TOKEN_ID: &str = "access_token";

/// Wrapper for sensitive strings that prevents accidental logging.
///
/// The inner value is never exposed via Debug or Display traits.
/// Use `expose()` to access the actual value when needed for API calls.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecureString(String);

impl SecureString {
    pub fn new(value: String) -> Self {
        Self(value)
    }

    /// Use sparingly and only when actually sending to APIs.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for SecureString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SecureString {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Debug for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecureString(••••••••)")
    }
}

impl std::fmt::Display for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "••••••••")
    }
}

/// Persisted form of the access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub token: SecureString,
}

impl Entity for TokenRecord {
    const COLLECTION: &'static str = "tokens";

    fn id(&self) -> String {
        TOKEN_ID.to_string()
    }
}

/// Shared handle to the current access token.
#[derive(Clone)]
pub struct AccessToken {
    value: Arc<RwLock<Option<SecureString>>>,
    storage: Arc<dyn Persistence<TokenRecord>>,
}

impl AccessToken {
    /// Load the persisted token, if any.
    pub fn load(storage: Arc<dyn Persistence<TokenRecord>>) -> Result<Self, PersistenceError> {
        let value = storage
            .get(TOKEN_ID)?
            .map(|record| record.token)
            .filter(|token| !token.is_empty());
        Ok(Self {
            value: Arc::new(RwLock::new(value)),
            storage,
        })
    }

    pub fn exists(&self) -> bool {
        self.value.read().is_some()
    }

    pub fn get(&self) -> Option<SecureString> {
        self.value.read().clone()
    }

    /// Persist first, then swap the in-memory value.
    pub fn set(&self, token: SecureString) -> Result<(), PersistenceError> {
        if token.is_empty() {
            return self.clear();
        }
        self.storage.upsert(&TokenRecord {
            token: token.clone(),
        })?;
        *self.value.write() = Some(token);
        Ok(())
    }

    pub fn clear(&self) -> Result<(), PersistenceError> {
        self.storage.delete(TOKEN_ID)?;
        *self.value.write() = None;
        Ok(())
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("exists", &self.exists())
            .finish()
    }
}
