//! Route permission gate

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use storefront_permissions::AccessDecision;

use crate::{
    error::{ApiError, ApiResult},
    middleware::auth::AuthUser,
    state::AppState,
};

/// Allow or reject the request according to the route table.
///
/// Expects [`super::optional_auth`] (or [`super::require_auth`]) to have run
/// first. A store failure rejects the request with 500.
pub async fn permission_gate(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let user_id = request.extensions().get::<AuthUser>().map(|user| user.id);
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let decision = state
        .permissions
        .authorize(user_id, method.as_str(), &path)
        .await?;

    match decision {
        AccessDecision::Public
        | AccessDecision::AdminBypass { .. }
        | AccessDecision::Granted { .. } => Ok(next.run(request).await),
        AccessDecision::Unauthenticated { .. } => {
            Err(ApiError::Authentication("Unauthorized".to_string()))
        }
        AccessDecision::Denied { required } => Err(ApiError::permission_denied(required)),
    }
}
