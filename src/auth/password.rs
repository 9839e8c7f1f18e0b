/// Password Hashing and Verification
///
/// bcrypt with a fixed work factor. Input policy (length, emptiness) is
/// enforced at registration by `validators::validate_password`, never here.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::{AppError, CryptoError};

/// Hash a password using bcrypt
///
/// # Errors
/// Returns `CryptoError::Hashing` only if bcrypt itself fails (e.g. the salt
/// cannot be drawn from the OS entropy source).
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Crypto(CryptoError::Hashing(e.to_string())))
}

/// Verify a password against its hash
///
/// A mismatch is `Ok(false)`. The comparison runs inside bcrypt against the
/// cost and salt embedded in `hash`.
///
/// # Errors
/// Returns `CryptoError::Hashing` if the stored hash is not a valid bcrypt digest.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::Crypto(CryptoError::Hashing(e.to_string())))
}
