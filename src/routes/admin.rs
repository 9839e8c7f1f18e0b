use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::configuration::ApplicationSettings;
use crate::error::AppError;
use crate::middleware::FileServerHits;
use crate::storage::Storage;

/// GET /admin/metrics
pub async fn metrics(hits: web::Data<FileServerHits>) -> HttpResponse {
    let page = format!(
        r#"<html>
  <body>
    <h1>Welcome, Chirpy Admin</h1>
    <p>Chirpy has been visited {} times!</p>
  </body>
</html>"#,
        hits.count()
    );

    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(page)
}

/// POST /admin/reset
///
/// Zeroes the hit counter and wipes every user, refresh token and chirp.
/// Only available when the platform is "dev"; everywhere else it answers 403.
pub async fn reset(
    application: web::Data<ApplicationSettings>,
    storage: web::Data<Storage>,
    hits: web::Data<FileServerHits>,
) -> Result<HttpResponse, AppError> {
    if !application.is_dev() {
        tracing::warn!(platform = %application.platform, "Reset refused outside dev platform");
        return Err(AppError::Forbidden(
            "Reset is only allowed in dev environment".to_string(),
        ));
    }

    hits.reset();
    storage.reset().await?;

    tracing::info!("Hit counter zeroed; all users, refresh tokens and chirps deleted");
    Ok(HttpResponse::Ok().json(json!({
        "hits": hits.count(),
        "msg": "All users deleted from the database",
    })))
}
