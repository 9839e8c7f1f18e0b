//! Persistence contracts.
//!
//! The session service and the HTTP handlers only see these traits. Two
//! backends implement them: `postgres` (sqlx, production) and `memory`
//! (mutex-guarded maps, used by tests and local runs without a database).
//!
//! Every method is a single atomic operation from the caller's point of
//! view; nothing here retries.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::auth::RefreshToken;
use crate::error::AppError;

mod memory;
mod postgres;

pub use memory::{InMemoryChirpStore, InMemoryRefreshTokenStore, InMemoryUserDirectory};
pub use postgres::{PgChirpStore, PgRefreshTokenStore, PgUserDirectory};

/// Public profile of a user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub is_chirpy_red: bool,
}

/// A user together with the stored secret hash, as needed for login.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub hashed_password: Option<String>,
}

/// A short text post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chirp {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: String,
    pub user_id: Uuid,
}

/// Credential directory and user records.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Create a user. A duplicate email is a `DatabaseError::Duplicate`.
    async fn create(&self, email: &str, hashed_password: &str) -> Result<User, AppError>;

    /// Look up login material by email.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, AppError>;

    /// Replace email and password hash. Returns `None` if the user is gone.
    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<Option<User>, AppError>;

    /// Set the Chirpy Red entitlement. Returns `false` if no such user.
    async fn upgrade_to_chirpy_red(&self, id: Uuid) -> Result<bool, AppError>;

    /// Administrative reset.
    async fn delete_all(&self) -> Result<(), AppError>;
}

/// Refresh token persistence. Callers pass plaintext tokens; how they are
/// keyed at rest is the store's business.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn create(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshToken, AppError>;

    /// Returns the record regardless of its expiry or revocation state.
    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshToken>, AppError>;

    /// Mark the token revoked. Keeps the first revocation time if it is
    /// already revoked. Returns `false` if the token is unknown.
    async fn revoke(&self, token: &str) -> Result<bool, AppError>;

    /// Administrative reset.
    async fn delete_all(&self) -> Result<(), AppError>;
}

#[async_trait]
pub trait ChirpStore: Send + Sync {
    async fn create(&self, user_id: Uuid, body: &str) -> Result<Chirp, AppError>;

    /// Oldest first, optionally restricted to one author.
    async fn list(&self, author_id: Option<Uuid>) -> Result<Vec<Chirp>, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<Chirp>, AppError>;

    /// Delete `id` only if `owner` wrote it. Returns `false` when nothing
    /// was deleted, whether the chirp is absent or belongs to someone else.
    async fn delete_owned(&self, id: Uuid, owner: Uuid) -> Result<bool, AppError>;

    /// Administrative reset.
    async fn delete_all(&self) -> Result<(), AppError>;
}

/// The set of stores the application runs against.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserDirectory>,
    pub refresh_tokens: Arc<dyn RefreshTokenStore>,
    pub chirps: Arc<dyn ChirpStore>,
}

impl Storage {
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            users: Arc::new(PgUserDirectory::new(pool.clone())),
            refresh_tokens: Arc::new(PgRefreshTokenStore::new(pool.clone())),
            chirps: Arc::new(PgChirpStore::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserDirectory::default()),
            refresh_tokens: Arc::new(InMemoryRefreshTokenStore::default()),
            chirps: Arc::new(InMemoryChirpStore::default()),
        }
    }

    /// Delete every user, refresh token and chirp.
    pub async fn reset(&self) -> Result<(), AppError> {
        self.chirps.delete_all().await?;
        self.refresh_tokens.delete_all().await?;
        self.users.delete_all().await?;
        Ok(())
    }
}
