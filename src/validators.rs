/// Input validators
/// - Email addresses for account creation and updates
/// - Password policy at registration (the hasher itself accepts anything)
/// - Chirp bodies: length limit and profanity masking

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MAX_PASSWORD_BYTES: usize = 72; // bcrypt input limit
pub const MAX_CHIRP_LENGTH: usize = 140;

const PROFANE_WORDS: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];
const PROFANITY_MASK: &str = "****";

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).expect("email regex is valid");
}

/// Validates and normalizes (trims) an email address
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email".to_string(), MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Password policy for new and updated credentials
///
/// bcrypt ignores everything past 72 bytes, so longer secrets are refused
/// rather than silently truncated.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password".to_string()));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_BYTES,
        ));
    }
    Ok(())
}

/// Validates a chirp body and masks profane words
pub fn clean_chirp_body(body: &str) -> Result<String, ValidationError> {
    if body.chars().count() > MAX_CHIRP_LENGTH {
        return Err(ValidationError::TooLong("Chirp".to_string(), MAX_CHIRP_LENGTH));
    }

    let cleaned = body
        .split(' ')
        .map(|word| {
            let lower = word.to_lowercase();
            if PROFANE_WORDS.contains(&lower.as_str()) {
                PROFANITY_MASK
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    Ok(cleaned)
}
