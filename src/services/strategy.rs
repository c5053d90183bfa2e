//! Authentication strategies — pluggable credential verification.
//!
//! A strategy is pure verification: it never touches session or cookie
//! state. The session manager resolves strategies by name and consumes the
//! `CredentialCheck` they report.

use async_trait::async_trait;

use crate::services::user::{CredentialCheck, UserDirectory};

#[async_trait]
pub trait AuthStrategy: Send + Sync {
    /// Registration name, e.g. `"local"`.
    fn name(&self) -> &'static str;

    /// Check an email/password pair and report the outcome.
    async fn verify(&self, email: &str, password: &str) -> CredentialCheck;
}

/// Email/password verification against the local user directory.
pub struct LocalStrategy {
    directory: UserDirectory,
}

impl LocalStrategy {
    pub const NAME: &'static str = "local";

    #[must_use]
    pub fn new(directory: UserDirectory) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl AuthStrategy for LocalStrategy {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn verify(&self, email: &str, password: &str) -> CredentialCheck {
        self.directory.validate_credentials(email, password).await
    }
}

#[cfg(test)]
#[path = "strategy_test.rs"]
mod tests;
