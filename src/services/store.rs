//! Credential store — user records and the persistence seam.
//!
//! DESIGN
//! ======
//! `UserStore` is the injected boundary between credential logic and the
//! database. Handlers and services hold it as `Arc<dyn UserStore>` so tests
//! can swap in an in-memory double without a live Postgres.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// One account holder. `id` is store-assigned and immutable; `email` is the
/// unique login key and is stored lowercase; `password_hash` is bcrypt output
/// and never leaves the service layer.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Persistence operations on user records. Absence is `Ok(None)`, never an
/// error.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Overwrite the stored hash. Returns `false` if no such user exists.
    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool, StoreError>;
}

/// Postgres-backed store over the `users` table.
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        // Callers normalize to lowercase; the index on lower(email) keeps
        // the match case-insensitive even for rows seeded by hand.
        let row = sqlx::query("SELECT id, email, password_hash FROM users WHERE lower(email) = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT id, email, password_hash FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
