//! Request middleware

pub mod auth;
pub mod logging;
pub mod permission;

pub use auth::{optional_auth, require_auth, AuthUser, Claims, TokenVerifier};
pub use logging::logging_middleware;
pub use permission::permission_gate;
