//! Password hashing — salted one-way transform and verification.
//!
//! DESIGN
//! ======
//! bcrypt embeds cost and salt in its output, so the same plaintext hashes
//! differently on every call while `verify` still matches. Both operations
//! are CPU-bound and run on the blocking pool so request tasks suspend
//! instead of stalling the runtime.

use tokio::task::spawn_blocking;

const MIN_COST: u32 = 4;
const MAX_COST: u32 = 31;

#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("malformed password hash")]
    MalformedHash,
    #[error("hashing failure: {0}")]
    Internal(String),
}

fn classify(err: bcrypt::BcryptError) -> HashError {
    match err {
        bcrypt::BcryptError::InvalidHash(_) | bcrypt::BcryptError::InvalidPrefix(_) => {
            HashError::MalformedHash
        }
        other => HashError::Internal(other.to_string()),
    }
}

/// Cost-configurable bcrypt hasher. Construct once and inject; cloning is
/// cheap.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    #[must_use]
    pub fn new(cost: u32) -> Self {
        Self { cost: cost.clamp(MIN_COST, MAX_COST) }
    }

    /// Load from `BCRYPT_COST`, defaulting to the bcrypt crate default.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(crate::services::session::env_parse("BCRYPT_COST", bcrypt::DEFAULT_COST))
    }

    #[must_use]
    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a plaintext password. Never fails on plaintext content; errors
    /// only on internal failure (entropy, blocking pool).
    pub async fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        let cost = self.cost;
        let plaintext = plaintext.to_owned();
        spawn_blocking(move || bcrypt::hash(plaintext, cost))
            .await
            .map_err(|e| HashError::Internal(e.to_string()))?
            .map_err(classify)
    }

    /// Compare a plaintext password against a stored hash. Mismatch is
    /// `Ok(false)`; only a malformed stored hash is an error.
    pub async fn verify(&self, plaintext: &str, stored: &str) -> Result<bool, HashError> {
        let plaintext = plaintext.to_owned();
        let stored = stored.to_owned();
        spawn_blocking(move || bcrypt::verify(plaintext, &stored))
            .await
            .map_err(|e| HashError::Internal(e.to_string()))?
            .map_err(classify)
    }
}

#[cfg(test)]
#[path = "password_test.rs"]
mod tests;
