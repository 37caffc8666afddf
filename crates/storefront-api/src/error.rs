//! API error types and handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use storefront_permissions::StoreError;
use thiserror::Error;

use crate::config::ConfigError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Authentication(String),

    /// Caller lacks the permission guarding the route
    #[error("{message}")]
    Authorization {
        message: String,
        required_permission: Option<String>,
    },

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Permission error: {0}")]
    Permissions(#[from] storefront_permissions::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// 403 for a request lacking `required`
    pub fn permission_denied(required: impl Into<String>) -> Self {
        ApiError::Authorization {
            message: "You do not have permission to perform this action".to_string(),
            required_permission: Some(required.into()),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Authorization { .. } | ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(StoreError::RoleNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Store(StoreError::UnknownPermission(_)) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_)
            | ApiError::Store(_)
            | ApiError::Permissions(_)
            | ApiError::Config(_)
            | ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message sent to the client; server-side failures are not echoed back
    fn client_message(&self) -> String {
        match self {
            ApiError::Store(StoreError::RoleNotFound(_)) => "Role not found".to_string(),
            ApiError::Store(StoreError::UnknownPermission(id)) => {
                format!("Unknown permission id: {}", id)
            }
            ApiError::Internal(_)
            | ApiError::Store(_)
            | ApiError::Permissions(_)
            | ApiError::Config(_)
            | ApiError::Io(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let jsend_status = if status.is_server_error() {
            "error"
        } else {
            "fail"
        };

        let mut body = json!({
            "status": jsend_status,
            "message": self.client_message(),
        });
        if let ApiError::Authorization {
            required_permission: Some(required),
            ..
        } = &self
        {
            body["required_permission"] = json!(required);
        }

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_permission_denied_body() {
        let (status, body) = body_json(ApiError::permission_denied("users.view")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["status"], "fail");
        assert_eq!(body["required_permission"], "users.view");
    }

    #[tokio::test]
    async fn test_store_errors_map_to_client_statuses() {
        let (status, body) = body_json(StoreError::RoleNotFound(9).into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Role not found");

        let (status, _) = body_json(StoreError::UnknownPermission(9).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        let (status, body) =
            body_json(StoreError::Unavailable("db down".to_string()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Internal server error");
        assert!(body.get("required_permission").is_none());
    }
}
