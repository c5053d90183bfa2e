//! User lookup service — credential validation over the store.
//!
//! ERROR HANDLING
//! ==============
//! `validate_credentials` never surfaces a raw store or hashing error: every
//! failure collapses into a `RejectReason` so callers (and therefore clients)
//! observe only the reason string. A missing account and a wrong password
//! share one reason to keep account enumeration off the table.

use std::sync::Arc;

use tracing::error;
use uuid::Uuid;

use crate::services::password::{HashError, PasswordHasher};
use crate::services::store::{StoreError, User, UserStore};

/// Collapsed failure reason for a login attempt. The `Display` strings are
/// the exact messages clients see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MalformedEmail,
    InvalidCredentials,
    Internal,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::MalformedEmail => "malformed email",
            Self::InvalidCredentials => "invalid credentials",
            Self::Internal => "internal error",
        })
    }
}

/// Outcome of a credential check.
#[derive(Debug)]
pub enum CredentialCheck {
    Accepted(User),
    Rejected(RejectReason),
}

#[derive(Debug, thiserror::Error)]
pub enum PasswordChangeError {
    #[error("invalid credentials")]
    WrongPassword,
    #[error(transparent)]
    Hash(#[from] HashError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Syntactic email check and canonical form: trimmed, lowercased, exactly one
/// `@` with non-empty local and domain parts.
#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    if normalized.is_empty() || !normalized.contains('@') {
        return None;
    }
    let parts = normalized.split('@').collect::<Vec<_>>();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return None;
    }
    Some(normalized)
}

/// Lookup and validation over the credential store. Store and hasher are
/// injected so tests can run against doubles.
#[derive(Clone)]
pub struct UserDirectory {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
}

impl UserDirectory {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>, hasher: PasswordHasher) -> Self {
        Self { store, hasher }
    }

    /// Case-insensitive exact-match lookup. A syntactically invalid email is
    /// `Ok(None)` without touching the store.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        match normalize_email(email) {
            Some(normalized) => self.store.find_by_email(&normalized).await,
            None => Ok(None),
        }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.store.find_by_id(id).await
    }

    /// Validate a login attempt. Sequence: syntactic email check (no store
    /// query on failure), lookup, hash comparison. Each step short-circuits.
    pub async fn validate_credentials(&self, email: &str, password: &str) -> CredentialCheck {
        let Some(normalized) = normalize_email(email) else {
            return CredentialCheck::Rejected(RejectReason::MalformedEmail);
        };

        let user = match self.store.find_by_email(&normalized).await {
            Ok(Some(user)) => user,
            Ok(None) => return CredentialCheck::Rejected(RejectReason::InvalidCredentials),
            Err(e) => {
                error!(error = %e, "credential lookup failed");
                return CredentialCheck::Rejected(RejectReason::Internal);
            }
        };

        match self.hasher.verify(password, &user.password_hash).await {
            Ok(true) => CredentialCheck::Accepted(user),
            Ok(false) => CredentialCheck::Rejected(RejectReason::InvalidCredentials),
            Err(e) => {
                error!(error = %e, user_id = %user.id, "password comparison failed");
                CredentialCheck::Rejected(RejectReason::Internal)
            }
        }
    }

    /// Re-hash and overwrite a user's password after re-verifying the current
    /// one. A vanished user collapses into `WrongPassword` rather than
    /// confirming account state.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current: &str,
        new: &str,
    ) -> Result<(), PasswordChangeError> {
        let Some(user) = self.store.find_by_id(user_id).await? else {
            return Err(PasswordChangeError::WrongPassword);
        };

        if !self.hasher.verify(current, &user.password_hash).await? {
            return Err(PasswordChangeError::WrongPassword);
        }

        let new_hash = self.hasher.hash(new).await?;
        if !self.store.update_password_hash(user_id, &new_hash).await? {
            return Err(PasswordChangeError::WrongPassword);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "user_test.rs"]
mod tests;
