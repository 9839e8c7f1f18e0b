use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::SessionService;
use crate::error::{AppError, ValidationError};

const USER_UPGRADED_EVENT: &str = "user.upgraded";

#[derive(Deserialize)]
pub struct WebhookData {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub data: Option<WebhookData>,
}

/// POST /api/polka/webhooks
///
/// Payment provider callback. The API key is checked before the body is
/// even parsed, so a caller without it always gets 401. Events other than
/// `user.upgraded` are acknowledged and ignored.
pub async fn polka_webhook(
    req: HttpRequest,
    body: web::Bytes,
    session: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    session.authorize_webhook(req.headers())?;

    let payload: WebhookEvent = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!("Malformed webhook payload: {}", e);
        ValidationError::InvalidFormat("webhook payload".to_string())
    })?;

    if payload.event != USER_UPGRADED_EVENT {
        tracing::debug!(event = %payload.event, "Ignoring webhook event");
        return Ok(HttpResponse::NoContent().finish());
    }

    let user_id = payload
        .data
        .map(|data| data.user_id)
        .ok_or_else(|| ValidationError::EmptyField("data.user_id".to_string()))?;

    session.upgrade_entitlement(req.headers(), user_id).await?;

    Ok(HttpResponse::NoContent().finish())
}
