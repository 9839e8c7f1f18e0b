/// JWT Claims structure
///
/// Registered claims (RFC 7519) carried by every access token. The subject
/// is the user's UUID; nothing else about the user is embedded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthError;

/// JWT Claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
}

impl Claims {
    /// Create claims for `user_id`, issued at `now` and valid for `lifetime`.
    pub fn new(user_id: Uuid, issued_at: DateTime<Utc>, lifetime: chrono::Duration, issuer: String) -> Self {
        let iat = issued_at.timestamp();
        Self {
            sub: user_id.to_string(),
            exp: iat + lifetime.num_seconds(),
            iat,
            iss: issuer,
        }
    }

    /// Extract user ID from claims
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::TokenInvalid)
    }

    /// A token is expired from its `exp` second onwards.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let claims = Claims::new(user_id, now, Duration::seconds(3600), "chirpy".to_string());

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.iss, "chirpy");
        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(!claims.is_expired_at(now));
    }

    #[test]
    fn test_expired_at_boundary() {
        let now = Utc::now();
        let claims = Claims::new(Uuid::new_v4(), now, Duration::seconds(10), "chirpy".to_string());

        assert!(!claims.is_expired_at(now + Duration::seconds(9)));
        assert!(claims.is_expired_at(now + Duration::seconds(10)));
        assert!(claims.is_expired_at(now + Duration::seconds(11)));
    }

    #[test]
    fn test_user_id_extraction() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, Utc::now(), Duration::seconds(60), "chirpy".to_string());

        assert_eq!(claims.user_id().unwrap(), user_id);
    }

    #[test]
    fn test_invalid_user_id() {
        let mut claims = Claims::new(Uuid::new_v4(), Utc::now(), Duration::seconds(60), "chirpy".to_string());
        claims.sub = "invalid-uuid".to_string();

        assert_eq!(claims.user_id(), Err(AuthError::TokenInvalid));
    }
}
