/// Middleware module
///
/// Bearer authentication for protected routes and the static file hit counter.

mod hit_counter;
mod jwt_middleware;

pub use hit_counter::{FileServerHits, HitCounter};
pub use jwt_middleware::{AuthenticatedUser, JwtMiddleware};
