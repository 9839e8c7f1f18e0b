/// JWT Token Generation and Validation
///
/// Access tokens are HS256 JWTs signed with the process-wide secret from
/// `JwtSettings`. Verification is a pure function of (token, secret, now):
/// no store is consulted, so authorizing a request never costs a round trip.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, CryptoError};

/// Upper bound on any access token lifetime.
pub const MAX_ACCESS_TOKEN_LIFETIME: Duration = Duration::seconds(60 * 60);

/// Clamp a requested lifetime into `0..=MAX_ACCESS_TOKEN_LIFETIME`.
pub fn clamp_lifetime(requested: Duration) -> Duration {
    requested.max(Duration::zero()).min(MAX_ACCESS_TOKEN_LIFETIME)
}

/// Convert a client-supplied lifetime in seconds, clamped the same way.
///
/// The raw integer is clamped first: `Duration::seconds` panics on values
/// past `i64::MAX / 1000`.
pub fn lifetime_from_seconds(seconds: i64) -> Duration {
    Duration::seconds(seconds.clamp(0, MAX_ACCESS_TOKEN_LIFETIME.num_seconds()))
}

/// Issue a signed access token for `user_id`, valid from now.
///
/// # Errors
/// Returns `CryptoError::Signing` if encoding fails
pub fn issue_access_token(
    user_id: Uuid,
    lifetime: Duration,
    config: &JwtSettings,
) -> Result<String, AppError> {
    issue_access_token_at(user_id, lifetime, config, Utc::now())
}

/// Issue a signed access token as if the current time were `now`.
pub fn issue_access_token_at(
    user_id: Uuid,
    lifetime: Duration,
    config: &JwtSettings,
    now: DateTime<Utc>,
) -> Result<String, AppError> {
    let claims = Claims::new(user_id, now, clamp_lifetime(lifetime), config.issuer.clone());

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::Crypto(CryptoError::Signing(e.to_string())))
}

/// Validate an access token and return its subject.
///
/// Every failure is `TokenInvalid`; the specific cause is only logged.
pub fn parse_access_token(token: &str, config: &JwtSettings) -> Result<Uuid, AuthError> {
    parse_access_token_at(token, config, Utc::now())
}

/// Validate an access token against `now` and return its subject.
pub fn parse_access_token_at(
    token: &str,
    config: &JwtSettings,
    now: DateTime<Utc>,
) -> Result<Uuid, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);
    // Expiry is checked below against the caller-supplied clock.
    validation.validate_exp = false;
    validation.leeway = 0;

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::warn!("JWT validation error: {}", e);
        AuthError::TokenInvalid
    })?;

    if claims.is_expired_at(now) {
        tracing::warn!(exp = claims.exp, "JWT validation error: token expired");
        return Err(AuthError::TokenInvalid);
    }

    claims.user_id().map_err(|e| {
        tracing::warn!("JWT validation error: subject is not a UUID");
        e
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifetime_from_extreme_seconds() {
        assert_eq!(lifetime_from_seconds(i64::MAX), MAX_ACCESS_TOKEN_LIFETIME);
        assert_eq!(lifetime_from_seconds(i64::MIN), Duration::zero());
        assert_eq!(lifetime_from_seconds(-5), Duration::zero());
        assert_eq!(lifetime_from_seconds(90), Duration::seconds(90));
    }

    fn get_test_config() -> JwtSettings {
        JwtSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 5_184_000,
            issuer: "chirpy".to_string(),
        }
    }

    #[test]
    fn test_issue_and_parse_token() {
        let config = get_test_config();
        let user_id = Uuid::new_v4();

        let token = issue_access_token(user_id, Duration::seconds(60), &config)
            .expect("Failed to issue token");
        let subject = parse_access_token(&token, &config).expect("Failed to parse token");

        assert_eq!(subject, user_id);
    }

    #[test]
    fn test_expired_token_rejected() {
        let config = get_test_config();
        let issued_at = Utc::now() - Duration::seconds(120);

        let token = issue_access_token_at(Uuid::new_v4(), Duration::seconds(60), &config, issued_at)
            .expect("Failed to issue token");

        assert_eq!(parse_access_token(&token, &config), Err(AuthError::TokenInvalid));
    }

    #[test]
    fn test_validity_window_uses_supplied_clock() {
        let config = get_test_config();
        let user_id = Uuid::new_v4();
        let issued_at = Utc::now();

        let token = issue_access_token_at(user_id, Duration::seconds(30), &config, issued_at)
            .expect("Failed to issue token");

        let just_before = issued_at + Duration::seconds(29);
        let at_expiry = issued_at + Duration::seconds(30);
        assert_eq!(parse_access_token_at(&token, &config, just_before), Ok(user_id));
        assert_eq!(
            parse_access_token_at(&token, &config, at_expiry),
            Err(AuthError::TokenInvalid)
        );
    }

    #[test]
    fn test_lifetime_is_clamped_to_one_hour() {
        let config = get_test_config();
        let issued_at = Utc::now();

        let token = issue_access_token_at(Uuid::new_v4(), Duration::days(30), &config, issued_at)
            .expect("Failed to issue token");

        let within = issued_at + MAX_ACCESS_TOKEN_LIFETIME - Duration::seconds(1);
        let beyond = issued_at + MAX_ACCESS_TOKEN_LIFETIME;
        assert!(parse_access_token_at(&token, &config, within).is_ok());
        assert!(parse_access_token_at(&token, &config, beyond).is_err());
    }

    #[test]
    fn test_clamp_lifetime() {
        assert_eq!(clamp_lifetime(Duration::seconds(90)), Duration::seconds(90));
        assert_eq!(clamp_lifetime(Duration::hours(5)), MAX_ACCESS_TOKEN_LIFETIME);
        assert_eq!(clamp_lifetime(Duration::seconds(-5)), Duration::zero());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let config = get_test_config();
        let token = issue_access_token(Uuid::new_v4(), Duration::seconds(60), &config)
            .expect("Failed to issue token");

        let mut other = get_test_config();
        other.secret = "a-completely-different-signing-secret".to_string();

        assert_eq!(parse_access_token(&token, &other), Err(AuthError::TokenInvalid));
    }

    #[test]
    fn test_invalid_token() {
        let config = get_test_config();
        assert_eq!(
            parse_access_token("invalid.token.here", &config),
            Err(AuthError::TokenInvalid)
        );
    }

    #[test]
    fn test_tampered_token() {
        let config = get_test_config();
        let token = issue_access_token(Uuid::new_v4(), Duration::seconds(60), &config)
            .expect("Failed to issue token");

        let tampered = format!("{}X", token);
        assert!(parse_access_token(&tampered, &config).is_err());
    }

    #[test]
    fn test_wrong_issuer() {
        let mut config = get_test_config();
        let token = issue_access_token(Uuid::new_v4(), Duration::seconds(60), &config)
            .expect("Failed to issue token");

        config.issuer = "wrong-issuer".to_string();
        assert!(parse_access_token(&token, &config).is_err());
    }

    #[test]
    fn test_non_uuid_subject_rejected() {
        let config = get_test_config();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "not-a-uuid".to_string(),
            exp: now + 60,
            iat: now,
            iss: config.issuer.clone(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        assert_eq!(parse_access_token(&token, &config), Err(AuthError::TokenInvalid));
    }
}
