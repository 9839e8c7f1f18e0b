//! Error taxonomy for the Chirpy API.
//!
//! Services and handlers return `AppError`. actix renders it through
//! `ResponseError` as `{"error": "<message>", "code": "<CODE>"}`.
//!
//! Authentication failures carry fixed messages so a caller never learns which
//! check rejected them. Storage and crypto failures are logged in full and
//! reported without detail.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;

/// Postgres SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// Rejected client input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is empty")]
    EmptyField(String),
    #[error("{0} is too long (maximum {1} characters)")]
    TooLong(String, usize),
    #[error("{0} has invalid format")]
    InvalidFormat(String),
}

/// Storage failures, from Postgres or the in-memory stores
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// A unique key is already taken. The message is safe to show the caller.
    #[error("{0}")]
    Duplicate(String),
    #[error("database unavailable: {0}")]
    Unavailable(String),
    #[error("query failed: {0}")]
    Query(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Unknown email or wrong password. Deliberately one variant.
    #[error("Incorrect email or password")]
    InvalidCredentials,
    /// No usable `Authorization` header.
    #[error("Missing or malformed authorization header")]
    MissingToken,
    /// Access token is malformed, tampered with, expired, or names no user.
    #[error("Invalid or expired token")]
    TokenInvalid,
    /// Refresh token is unknown, revoked, or expired.
    #[error("Invalid or expired refresh token")]
    RefreshTokenInvalid,
    /// Webhook caller presented the wrong API key.
    #[error("Invalid API key")]
    InvalidApiKey,
}

/// bcrypt, entropy source or JWT signing failed
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("entropy source failed: {0}")]
    Randomness(String),
    #[error("token signing failed: {0}")]
    Signing(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    /// Valid identity, disallowed action
    #[error("{0}")]
    Forbidden(String),
    /// Resource absent, or present but hidden from the caller
    #[error("{0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let db_error = match &err {
            sqlx::Error::Database(e) if e.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                DatabaseError::Duplicate("Record already exists".to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseError::Unavailable(err.to_string())
            }
            _ => DatabaseError::Query(err.to_string()),
        };
        AppError::Database(db_error)
    }
}

/// JSON body of every error response
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
}

impl AppError {
    /// Stable, machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Database(DatabaseError::Duplicate(_)) => "DUPLICATE_ENTRY",
            AppError::Database(DatabaseError::Unavailable(_)) => "SERVICE_UNAVAILABLE",
            AppError::Database(DatabaseError::Query(_)) => "DATABASE_ERROR",
            AppError::Auth(AuthError::InvalidCredentials) => "INVALID_CREDENTIALS",
            AppError::Auth(AuthError::MissingToken) => "UNAUTHORIZED",
            AppError::Auth(AuthError::TokenInvalid) => "TOKEN_INVALID",
            AppError::Auth(AuthError::RefreshTokenInvalid) => "REFRESH_TOKEN_INVALID",
            AppError::Auth(AuthError::InvalidApiKey) => "INVALID_API_KEY",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Crypto(_) | AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// What the caller gets to see. Server-side failures say nothing specific.
    pub fn body(&self) -> ErrorBody {
        let error = match self {
            AppError::Database(DatabaseError::Unavailable(_)) => {
                "Service temporarily unavailable".to_string()
            }
            AppError::Database(DatabaseError::Query(_))
            | AppError::Crypto(_)
            | AppError::Internal(_) => "Something went wrong".to_string(),
            other => other.to_string(),
        };
        ErrorBody {
            error,
            code: self.code(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(DatabaseError::Duplicate(_)) => StatusCode::CONFLICT,
            AppError::Database(DatabaseError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(DatabaseError::Query(_))
            | AppError::Crypto(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let code = self.code();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), code, error = %self, "Request failed");
        } else if status == StatusCode::NOT_FOUND {
            tracing::debug!(code, error = %self, "Resource not found");
        } else {
            tracing::warn!(status = status.as_u16(), code, error = %self, "Request rejected");
        }

        HttpResponse::build(status).json(self.body())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::TooLong("Chirp".to_string(), 140);
        assert_eq!(err.to_string(), "Chirp is too long (maximum 140 characters)");
    }

    #[test]
    fn test_auth_errors_are_unauthorized() {
        for err in [
            AuthError::InvalidCredentials,
            AuthError::MissingToken,
            AuthError::TokenInvalid,
            AuthError::RefreshTokenInvalid,
            AuthError::InvalidApiKey,
        ] {
            assert_eq!(AppError::Auth(err).status_code(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_server_errors_hide_detail() {
        let err = AppError::Crypto(CryptoError::Randomness("getrandom: EIO".to_string()));

        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.body(),
            ErrorBody {
                error: "Something went wrong".to_string(),
                code: "INTERNAL_ERROR",
            }
        );
    }

    #[test]
    fn test_duplicate_is_conflict_with_its_message() {
        let err = AppError::Database(DatabaseError::Duplicate(
            "Email already registered".to_string(),
        ));

        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.body().error, "Email already registered");
    }

    #[test]
    fn test_sqlx_errors_are_classified() {
        assert!(matches!(
            AppError::from(sqlx::Error::PoolTimedOut),
            AppError::Database(DatabaseError::Unavailable(_))
        ));
        assert!(matches!(
            AppError::from(sqlx::Error::RowNotFound),
            AppError::Database(DatabaseError::Query(_))
        ));
        assert_eq!(
            AppError::from(sqlx::Error::PoolClosed).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_forbidden_and_not_found() {
        let forbidden = AppError::Forbidden("Reset is only allowed in dev environment".to_string());
        assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(forbidden.body().error, "Reset is only allowed in dev environment");

        let missing = AppError::NotFound("Chirp not found".to_string());
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(missing.code(), "NOT_FOUND");
    }
}
