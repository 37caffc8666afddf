//! Error types for the permissions system

use thiserror::Error;

/// Result type for permissions operations
pub type Result<T> = std::result::Result<T, Error>;

/// Result type for role/permission store access
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in the permissions system
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid route pattern {pattern:?}: {reason}")]
    InvalidRoutePattern { pattern: String, reason: String },

    #[error("Invalid route {pattern:?} for permission {permission}: {reason}")]
    InvalidPermissionRoute {
        permission: String,
        pattern: String,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures of the backing role/permission store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Role not found: {0}")]
    RoleNotFound(i64),

    #[error("Unknown permission id: {0}")]
    UnknownPermission(i64),
}
