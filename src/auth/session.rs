/// Session Service
///
/// Orchestrates login, refresh, revoke, request authorization and the
/// webhook-driven entitlement upgrade. Holds only immutable configuration
/// and handles to the stores, so one instance is shared by every worker.
///
/// Refresh tokens are not rotated on use: a refresh token stays valid until
/// it expires or is revoked explicitly.

use std::sync::Arc;

use actix_web::http::header::HeaderMap;
use chrono::{Duration, Utc};
use lazy_static::lazy_static;
use uuid::Uuid;

use crate::auth::extract::{api_key, bearer_token};
use crate::auth::jwt::{issue_access_token, parse_access_token};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::refresh_token::generate_refresh_token;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};
use crate::storage::{RefreshTokenStore, User, UserDirectory};

lazy_static! {
    /// Verified against when the account is unknown, so a miss costs as much
    /// as a wrong password.
    static ref DUMMY_PASSWORD_HASH: Option<String> =
        hash_password("chirpy-unknown-account").ok();
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

pub struct SessionService {
    users: Arc<dyn UserDirectory>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    jwt: JwtSettings,
    webhook_api_key: String,
}

impl SessionService {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        jwt: JwtSettings,
        webhook_api_key: String,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            jwt,
            webhook_api_key,
        }
    }

    /// Authenticate `email`/`password` and mint an access + refresh token pair.
    ///
    /// `requested_lifetime` may shorten the access token, never lengthen it
    /// past the configured default.
    ///
    /// # Errors
    /// - `InvalidCredentials` for an unknown email, a user without a stored
    ///   hash, or a wrong password. The three are indistinguishable.
    /// - `Database`, `Crypto` for infrastructure failures.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        requested_lifetime: Option<Duration>,
    ) -> Result<LoginOutcome, AppError> {
        let account = self
            .users
            .find_by_email(email)
            .await?
            .and_then(|c| c.hashed_password.map(|hash| (c.user, hash)));

        let Some((user, hash)) = account else {
            // Spend the same bcrypt work as a real check before rejecting.
            if let Some(dummy) = DUMMY_PASSWORD_HASH.as_deref() {
                let _ = verify_password(password, dummy);
            }
            return Err(AuthError::InvalidCredentials.into());
        };

        if !verify_password(password, &hash)? {
            return Err(AuthError::InvalidCredentials.into());
        }

        let default_lifetime = self.jwt.access_token_lifetime();
        let lifetime = requested_lifetime
            .filter(|requested| *requested > Duration::zero())
            .map_or(default_lifetime, |requested| requested.min(default_lifetime));

        let access_token = issue_access_token(user.id, lifetime, &self.jwt)?;
        let refresh_token = generate_refresh_token()?;
        self.refresh_tokens
            .create(
                user.id,
                &refresh_token,
                Utc::now() + self.jwt.refresh_token_lifetime(),
            )
            .await?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(LoginOutcome {
            user,
            access_token,
            refresh_token,
        })
    }

    /// Exchange an active refresh token for a new access token.
    ///
    /// # Errors
    /// `RefreshTokenInvalid` if the token is unknown, revoked or expired.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AppError> {
        let record = self
            .refresh_tokens
            .find_by_token(refresh_token)
            .await?
            .ok_or_else(|| {
                tracing::warn!("Refresh token not found");
                AuthError::RefreshTokenInvalid
            })?;

        if !record.is_active_at(Utc::now()) {
            tracing::warn!(
                user_id = %record.user_id,
                revoked = record.is_revoked(),
                "Refresh token no longer active"
            );
            return Err(AuthError::RefreshTokenInvalid.into());
        }

        let access_token =
            issue_access_token(record.user_id, self.jwt.access_token_lifetime(), &self.jwt)?;

        tracing::info!(user_id = %record.user_id, "Access token refreshed");
        Ok(access_token)
    }

    /// Revoke a refresh token.
    ///
    /// # Errors
    /// `NotFound` if the store has never seen the token.
    pub async fn revoke(&self, refresh_token: &str) -> Result<(), AppError> {
        if !self.refresh_tokens.revoke(refresh_token).await? {
            return Err(AppError::NotFound("Refresh token not found".to_string()));
        }
        tracing::info!("Refresh token revoked");
        Ok(())
    }

    /// Check the webhook API key presented in `headers`.
    ///
    /// # Errors
    /// `MissingToken` if no `ApiKey` credential is present, `InvalidApiKey`
    /// if it does not match.
    pub fn authorize_webhook(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let presented = api_key(headers)?;
        if presented != self.webhook_api_key {
            tracing::warn!("Webhook called with wrong API key");
            return Err(AuthError::InvalidApiKey);
        }
        Ok(())
    }

    /// Grant the Chirpy Red entitlement to `user_id` on behalf of the
    /// payment webhook.
    ///
    /// # Errors
    /// API key failures as in `authorize_webhook`; `NotFound` if no such user.
    pub async fn upgrade_entitlement(
        &self,
        headers: &HeaderMap,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        self.authorize_webhook(headers)?;

        if !self.users.upgrade_to_chirpy_red(user_id).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        tracing::info!(user_id = %user_id, "User upgraded to Chirpy Red");
        Ok(())
    }
}

/// Stateless bearer authorization, shared by the service and the middleware.
pub fn authorize_request(headers: &HeaderMap, jwt: &JwtSettings) -> Result<Uuid, AuthError> {
    let token = bearer_token(headers)?;
    parse_access_token(token, jwt)
}
