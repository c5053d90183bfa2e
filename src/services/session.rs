//! Session management — token issuance, rolling expiry, strategy dispatch.
//!
//! DESIGN
//! ======
//! A session row links an opaque client token to the minimal identity needed
//! per request: the user id and nothing else. Validation and rolling refresh
//! happen in one store round trip, and deserialization never re-fetches the
//! user record.
//!
//! TRADE-OFFS
//! ==========
//! Because requests carry only the id, changes to a user mid-session (email,
//! password) are invisible until logout/re-login. Endpoints that need full
//! user data re-fetch it on demand.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::Serialize;
use sqlx::{PgPool, Row};
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use crate::services::store::{StoreError, User};
use crate::services::strategy::AuthStrategy;
use crate::services::user::{CredentialCheck, RejectReason};

const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 3600;
const DEFAULT_SESSION_SWEEP_INTERVAL_SECS: u64 = 3600;

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex session token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

// =============================================================================
// IDENTITY
// =============================================================================

/// The per-request identity carried by a session: the user id, nothing else.
/// No email, no password hash, no role data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionIdentity {
    pub id: Uuid,
}

/// Reduce a full user record to the identity a session may store.
#[must_use]
pub fn serialize_identity(user: &User) -> SessionIdentity {
    SessionIdentity { id: user.id }
}

/// Rebuild a request-scoped identity from a stored payload. Deliberately does
/// not consult the user store.
#[must_use]
pub fn deserialize_identity(id: Uuid) -> SessionIdentity {
    SessionIdentity { id }
}

// =============================================================================
// STORE
// =============================================================================

/// Persistence seam for session records. Expired rows are treated as absent
/// by `touch`; `purge_expired` only reclaims storage.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, token: &str, user_id: Uuid, ttl: Duration) -> Result<(), StoreError>;

    /// Validate a token and push its expiry forward in one step. Returns the
    /// owning user id, or `None` for an absent or expired session.
    async fn touch(&self, token: &str, ttl: Duration) -> Result<Option<Uuid>, StoreError>;

    async fn remove(&self, token: &str) -> Result<(), StoreError>;

    async fn purge_expired(&self) -> Result<u64, StoreError>;
}

/// Postgres-backed session store. All expiry comparisons happen in SQL so
/// clock skew between app replicas never matters.
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn insert(&self, token: &str, user_id: Uuid, ttl: Duration) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO sessions (token, user_id, expires_at)
             VALUES ($1, $2, now() + make_interval(secs => $3))",
        )
        .bind(token)
        .bind(user_id)
        .bind(ttl.as_secs_f64())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn touch(&self, token: &str, ttl: Duration) -> Result<Option<Uuid>, StoreError> {
        let row = sqlx::query(
            "UPDATE sessions
             SET expires_at = now() + make_interval(secs => $2)
             WHERE token = $1 AND expires_at > now()
             RETURNING user_id",
        )
        .bind(token)
        .bind(ttl.as_secs_f64())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.get("user_id")))
    }

    async fn remove(&self, token: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// =============================================================================
// MANAGER
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Rolling expiry window for each session.
    pub ttl: Duration,
    /// How often the background sweep reclaims expired rows.
    pub sweep_interval: Duration,
}

impl SessionConfig {
    /// Load from `SESSION_TTL_SECS` and `SESSION_SWEEP_INTERVAL_SECS`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            ttl: Duration::from_secs(env_parse("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)),
            sweep_interval: Duration::from_secs(env_parse(
                "SESSION_SWEEP_INTERVAL_SECS",
                DEFAULT_SESSION_SWEEP_INTERVAL_SECS,
            )),
        }
    }
}

/// A freshly established session: the token handed to the client plus the
/// identity it resolves to.
#[derive(Debug, Clone)]
pub struct EstablishedSession {
    pub token: String,
    pub identity: SessionIdentity,
}

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("unknown authentication strategy {0:?}")]
    UnknownStrategy(String),
    #[error("{0}")]
    Rejected(RejectReason),
}

/// Creates, validates, and destroys sessions. Strategies are registered by
/// name; the store and config are injected.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    strategies: Arc<HashMap<&'static str, Arc<dyn AuthStrategy>>>,
    config: SessionConfig,
}

impl SessionManager {
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>, config: SessionConfig) -> Self {
        Self { store, strategies: Arc::new(HashMap::new()), config }
    }

    /// Register a strategy under its own name. Later registrations under the
    /// same name win.
    #[must_use]
    pub fn with_strategy(mut self, strategy: Arc<dyn AuthStrategy>) -> Self {
        Arc::make_mut(&mut self.strategies).insert(strategy.name(), strategy);
        self
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    /// Run a login attempt through the named strategy and, on acceptance,
    /// establish a session holding only the serialized identity.
    pub async fn login(
        &self,
        strategy: &str,
        email: &str,
        password: &str,
    ) -> Result<EstablishedSession, LoginError> {
        let Some(strategy) = self.strategies.get(strategy) else {
            return Err(LoginError::UnknownStrategy(strategy.to_owned()));
        };

        let user = match strategy.verify(email, password).await {
            CredentialCheck::Accepted(user) => user,
            CredentialCheck::Rejected(reason) => return Err(LoginError::Rejected(reason)),
        };

        let identity = serialize_identity(&user);
        let token = generate_token();
        if let Err(e) = self.store.insert(&token, identity.id, self.config.ttl).await {
            error!(error = %e, user_id = %identity.id, "session insert failed");
            return Err(LoginError::Rejected(RejectReason::Internal));
        }

        Ok(EstablishedSession { token, identity })
    }

    /// Resolve a token to its identity, refreshing the rolling expiry.
    /// Absent or expired sessions are `Ok(None)`.
    pub async fn authenticate(&self, token: &str) -> Result<Option<SessionIdentity>, StoreError> {
        let user_id = self.store.touch(token, self.config.ttl).await?;
        Ok(user_id.map(deserialize_identity))
    }

    /// Destroy the server-side record. The client token is dead on next use
    /// even if this races a concurrent request.
    pub async fn logout(&self, token: &str) -> Result<(), StoreError> {
        self.store.remove(token).await
    }
}

/// Spawn the background sweep that deletes expired session rows. Expiry is
/// enforced at read time regardless; this only reclaims storage.
pub fn spawn_expiry_sweep(sessions: SessionManager) -> JoinHandle<()> {
    let interval = sessions.config.sweep_interval;
    info!(interval_secs = interval.as_secs(), "session expiry sweep configured");
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            match sessions.store.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => info!(purged, "expired sessions purged"),
                Err(e) => error!(error = %e, "session sweep failed"),
            }
        }
    })
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
