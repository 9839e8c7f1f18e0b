/// Authorization header parsing
///
/// `Authorization: Bearer <token>` for users, `Authorization: ApiKey <key>`
/// for the payment webhook. A missing header, a non-UTF-8 value, the wrong
/// scheme or an empty credential all yield `MissingToken`.

use actix_web::http::header::{HeaderMap, AUTHORIZATION};

use crate::error::AuthError;

const BEARER_PREFIX: &str = "Bearer ";
const API_KEY_PREFIX: &str = "ApiKey ";

fn credential<'a>(headers: &'a HeaderMap, prefix: &str) -> Result<&'a str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let credential = value
        .strip_prefix(prefix)
        .map(str::trim)
        .ok_or(AuthError::MissingToken)?;

    if credential.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(credential)
}

/// Extract the bearer token from the `Authorization` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    credential(headers, BEARER_PREFIX)
}

/// Extract the webhook API key from the `Authorization` header
pub fn api_key(headers: &HeaderMap) -> Result<&str, AuthError> {
    credential(headers, API_KEY_PREFIX)
}
