/// Authentication Routes
///
/// Login, access token refresh and refresh token revocation. Refresh and
/// revoke read the refresh token from `Authorization: Bearer <token>`.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{bearer_token, lifetime_from_seconds, SessionService};
use crate::error::AppError;
use crate::routes::users::UserResponse;

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Optional shorter access token lifetime, in seconds
    pub expires_in_seconds: Option<i64>,
}

/// Login response: the public profile plus both tokens
#[derive(Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub token: String,
    pub refresh_token: String,
}

/// Refresh response
#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// POST /api/login
///
/// # Errors
/// - 400: Malformed body
/// - 401: Invalid credentials (unknown email and wrong password look the same)
/// - 500: Internal server error
pub async fn login(
    form: web::Json<LoginRequest>,
    session: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let requested_lifetime = form.expires_in_seconds.map(lifetime_from_seconds);

    let outcome = session
        .login(&form.email, &form.password, requested_lifetime)
        .await?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        user: outcome.user.into(),
        token: outcome.access_token,
        refresh_token: outcome.refresh_token,
    }))
}

/// POST /api/refresh
///
/// # Errors
/// - 401: Missing, unknown, revoked or expired refresh token
pub async fn refresh(
    req: HttpRequest,
    session: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let refresh_token = bearer_token(req.headers())?;
    let token = session.refresh(refresh_token).await?;

    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}

/// POST /api/revoke
///
/// # Errors
/// - 401: Missing Authorization header
/// - 404: The refresh token was never issued
pub async fn revoke(
    req: HttpRequest,
    session: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let refresh_token = bearer_token(req.headers())?;
    session.revoke(refresh_token).await?;

    Ok(HttpResponse::NoContent().finish())
}
