/// Chirp Routes
///
/// Posting and deleting require a bearer access token; reading is public.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, ValidationError};
use crate::middleware::AuthenticatedUser;
use crate::storage::{Chirp, Storage};
use crate::validators::clean_chirp_body;

#[derive(Deserialize)]
pub struct CreateChirpRequest {
    pub body: String,
}

#[derive(Deserialize)]
pub struct ListChirpsQuery {
    pub author_id: Option<String>,
}

#[derive(Serialize)]
pub struct ChirpResponse {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    pub body: String,
    pub user_id: String,
}

impl From<Chirp> for ChirpResponse {
    fn from(chirp: Chirp) -> Self {
        Self {
            id: chirp.id.to_string(),
            created_at: chirp.created_at.to_rfc3339(),
            updated_at: chirp.updated_at.to_rfc3339(),
            body: chirp.body,
            user_id: chirp.user_id.to_string(),
        }
    }
}

fn parse_uuid(field: &str, raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ValidationError::InvalidFormat(field.to_string()).into())
}

/// POST /api/chirps
///
/// # Errors
/// - 400: Body longer than 140 characters
/// - 401: Missing, invalid or expired access token
pub async fn create_chirp(
    caller: web::ReqData<AuthenticatedUser>,
    form: web::Json<CreateChirpRequest>,
    storage: web::Data<Storage>,
) -> Result<HttpResponse, AppError> {
    let body = clean_chirp_body(&form.body)?;
    let chirp = storage.chirps.create(caller.user_id, &body).await?;

    tracing::info!(chirp_id = %chirp.id, user_id = %chirp.user_id, "Chirp created");
    Ok(HttpResponse::Created().json(ChirpResponse::from(chirp)))
}

/// GET /api/chirps?author_id=<uuid>
///
/// Oldest first.
pub async fn list_chirps(
    query: web::Query<ListChirpsQuery>,
    storage: web::Data<Storage>,
) -> Result<HttpResponse, AppError> {
    let author_id = match query.author_id.as_deref() {
        Some(raw) if !raw.trim().is_empty() => Some(parse_uuid("author_id", raw)?),
        _ => None,
    };

    let chirps: Vec<ChirpResponse> = storage
        .chirps
        .list(author_id)
        .await?
        .into_iter()
        .map(ChirpResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(chirps))
}

/// GET /api/chirps/{chirp_id}
pub async fn get_chirp(
    path: web::Path<String>,
    storage: web::Data<Storage>,
) -> Result<HttpResponse, AppError> {
    let chirp_id = parse_uuid("chirp_id", &path)?;

    let chirp = storage
        .chirps
        .get(chirp_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Chirp not found".to_string()))?;

    Ok(HttpResponse::Ok().json(ChirpResponse::from(chirp)))
}

/// DELETE /api/chirps/{chirp_id}
///
/// Only the author may delete. A chirp owned by someone else is reported as
/// not found, the same as one that does not exist.
pub async fn delete_chirp(
    caller: web::ReqData<AuthenticatedUser>,
    path: web::Path<String>,
    storage: web::Data<Storage>,
) -> Result<HttpResponse, AppError> {
    let chirp_id = parse_uuid("chirp_id", &path)?;

    if !storage.chirps.delete_owned(chirp_id, caller.user_id).await? {
        tracing::warn!(
            chirp_id = %chirp_id,
            user_id = %caller.user_id,
            "Chirp delete refused: missing or not owned"
        );
        return Err(AppError::NotFound("Chirp not found".to_string()));
    }

    tracing::info!(chirp_id = %chirp_id, user_id = %caller.user_id, "Chirp deleted");
    Ok(HttpResponse::NoContent().finish())
}
