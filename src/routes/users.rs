use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::hash_password;
use crate::error::AppError;
use crate::middleware::AuthenticatedUser;
use crate::storage::{Storage, User};
use crate::validators::{is_valid_email, validate_password};

/// Credentials for account creation and update
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Public user profile. There is deliberately no password field.
#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    pub email: String,
    pub is_chirpy_red: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
            email: user.email,
            is_chirpy_red: user.is_chirpy_red,
        }
    }
}

/// POST /api/users
///
/// # Errors
/// - 400: Invalid email or password
/// - 409: Email already registered
pub async fn create_user(
    form: web::Json<CredentialsRequest>,
    storage: web::Data<Storage>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;
    validate_password(&form.password)?;
    let hashed_password = hash_password(&form.password)?;

    let user = storage.users.create(&email, &hashed_password).await?;

    tracing::info!(user_id = %user.id, "User registered successfully");

    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// PUT /api/users
///
/// Replace the caller's own email and password. Requires a bearer token.
pub async fn update_user(
    caller: web::ReqData<AuthenticatedUser>,
    form: web::Json<CredentialsRequest>,
    storage: web::Data<Storage>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;
    validate_password(&form.password)?;
    let hashed_password = hash_password(&form.password)?;

    let user = storage
        .users
        .update_credentials(caller.user_id, &email, &hashed_password)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %user.id, "User credentials updated");

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}
