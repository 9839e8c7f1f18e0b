/// Authentication module
///
/// Password hashing, JWT access tokens, refresh tokens, Authorization
/// header parsing and the session service that ties them together.

mod claims;
mod extract;
mod jwt;
mod password;
mod refresh_token;
mod session;

pub use extract::bearer_token;
pub use jwt::{
    issue_access_token_at, lifetime_from_seconds, parse_access_token_at,
    MAX_ACCESS_TOKEN_LIFETIME,
};
pub use password::hash_password;
pub use refresh_token::{hash_token, RefreshToken};
pub use session::{authorize_request, LoginOutcome, SessionService};
