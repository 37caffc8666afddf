//! Storefront HTTP API
//!
//! Authenticates bearer tokens, gates every request through the route
//! permission table and exposes role permission administration.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use middleware::{AuthUser, Claims, TokenVerifier};
pub use routes::app;
pub use server::ApiServer;
pub use state::AppState;
