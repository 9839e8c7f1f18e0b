/// Refresh Token Management
///
/// Refresh tokens are:
/// - 32 bytes from the OS CSPRNG, hex-encoded (64 characters)
/// - Persisted with their owner, expiry and an optional revocation time
/// - Hashed with SHA-256 before they reach a store key
/// - Never reused once revoked or expired

use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{AppError, CryptoError};

/// Number of random bytes in a refresh token.
pub const REFRESH_TOKEN_BYTES: usize = 32;

/// Generate a new cryptographically secure refresh token
///
/// # Errors
/// Returns `CryptoError::Randomness` if the OS entropy source fails. There is no
/// fallback to a weaker generator.
pub fn generate_refresh_token() -> Result<String, AppError> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AppError::Crypto(CryptoError::Randomness(e.to_string())))?;
    Ok(hex::encode(bytes))
}

/// Hash a refresh token using SHA-256
///
/// Stores key tokens by this digest so the plaintext never rests in storage.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// A persisted refresh token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken {
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshToken {
    #[inline]
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    #[inline]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Usable for a refresh: neither revoked nor expired.
    #[inline]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked() && !self.is_expired_at(now)
    }
}
