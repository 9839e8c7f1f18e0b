use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{Chirp, ChirpStore, RefreshTokenStore, User, UserCredentials, UserDirectory};
use crate::auth::{hash_token, RefreshToken};
use crate::error::{AppError, DatabaseError};

/// Unique violations on `users` can only be the email column.
fn email_taken(err: sqlx::Error) -> AppError {
    match AppError::from(err) {
        AppError::Database(DatabaseError::Duplicate(_)) => AppError::Database(
            DatabaseError::Duplicate("Email already registered".to_string()),
        ),
        other => other,
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    email: String,
    is_chirpy_red: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            email: row.email,
            is_chirpy_red: row.is_chirpy_red,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    email: String,
    is_chirpy_red: bool,
    hashed_password: Option<String>,
}

impl From<CredentialsRow> for UserCredentials {
    fn from(row: CredentialsRow) -> Self {
        Self {
            user: User {
                id: row.id,
                created_at: row.created_at,
                updated_at: row.updated_at,
                email: row.email,
                is_chirpy_red: row.is_chirpy_red,
            },
            hashed_password: row.hashed_password,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RefreshTokenRow {
    user_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
}

impl From<RefreshTokenRow> for RefreshToken {
    fn from(row: RefreshTokenRow) -> Self {
        Self {
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            expires_at: row.expires_at,
            revoked_at: row.revoked_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ChirpRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    body: String,
    user_id: Uuid,
}

impl From<ChirpRow> for Chirp {
    fn from(row: ChirpRow) -> Self {
        Self {
            id: row.id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            body: row.body,
            user_id: row.user_id,
        }
    }
}

/// Users table
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn create(&self, email: &str, hashed_password: &str) -> Result<User, AppError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, created_at, updated_at, email, hashed_password)
            VALUES ($1, $2, $2, $3, $4)
            RETURNING id, created_at, updated_at, email, is_chirpy_red
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(now)
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(email_taken)?;

        Ok(row.into())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, AppError> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            r#"
            SELECT id, created_at, updated_at, email, is_chirpy_red, hashed_password
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserCredentials::from))
    }

    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET email = $1, hashed_password = $2, updated_at = $3
            WHERE id = $4
            RETURNING id, created_at, updated_at, email, is_chirpy_red
            "#,
        )
        .bind(email)
        .bind(hashed_password)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(email_taken)?;

        Ok(row.map(User::from))
    }

    async fn upgrade_to_chirpy_red(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE users SET is_chirpy_red = true, updated_at = $1 WHERE id = $2",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self) -> Result<(), AppError> {
        sqlx::query("DELETE FROM users").execute(&self.pool).await?;
        Ok(())
    }
}

/// Refresh tokens table, keyed by the SHA-256 of the token value
pub struct PgRefreshTokenStore {
    pool: PgPool,
}

impl PgRefreshTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenStore for PgRefreshTokenStore {
    async fn create(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshToken, AppError> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            INSERT INTO refresh_tokens (token_hash, user_id, created_at, updated_at, expires_at)
            VALUES ($1, $2, $3, $3, $4)
            RETURNING user_id, created_at, updated_at, expires_at, revoked_at
            "#,
        )
        .bind(hash_token(token))
        .bind(user_id)
        .bind(Utc::now())
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshToken>, AppError> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            SELECT user_id, created_at, updated_at, expires_at, revoked_at
            FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(hash_token(token))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(RefreshToken::from))
    }

    async fn revoke(&self, token: &str) -> Result<bool, AppError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = COALESCE(revoked_at, $1),
                updated_at = CASE WHEN revoked_at IS NULL THEN $1 ELSE updated_at END
            WHERE token_hash = $2
            "#,
        )
        .bind(now)
        .bind(hash_token(token))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self) -> Result<(), AppError> {
        sqlx::query("DELETE FROM refresh_tokens")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Chirps table
pub struct PgChirpStore {
    pool: PgPool,
}

impl PgChirpStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChirpStore for PgChirpStore {
    async fn create(&self, user_id: Uuid, body: &str) -> Result<Chirp, AppError> {
        let row = sqlx::query_as::<_, ChirpRow>(
            r#"
            INSERT INTO chirps (id, created_at, updated_at, body, user_id)
            VALUES ($1, $2, $2, $3, $4)
            RETURNING id, created_at, updated_at, body, user_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(Utc::now())
        .bind(body)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn list(&self, author_id: Option<Uuid>) -> Result<Vec<Chirp>, AppError> {
        let rows = sqlx::query_as::<_, ChirpRow>(
            r#"
            SELECT id, created_at, updated_at, body, user_id
            FROM chirps
            WHERE $1::uuid IS NULL OR user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Chirp::from).collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Chirp>, AppError> {
        let row = sqlx::query_as::<_, ChirpRow>(
            "SELECT id, created_at, updated_at, body, user_id FROM chirps WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Chirp::from))
    }

    async fn delete_owned(&self, id: Uuid, owner: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM chirps WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self) -> Result<(), AppError> {
        sqlx::query("DELETE FROM chirps").execute(&self.pool).await?;
        Ok(())
    }
}
