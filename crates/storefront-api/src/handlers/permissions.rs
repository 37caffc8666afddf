//! Caller permission lookup

use axum::{extract::State, Json};
use storefront_permissions::PermissionResolver;

use crate::{
    error::ApiResult,
    middleware::AuthUser,
    models::{CallerPermissionsEnvelope, CallerPermissionsResponse, JSend},
    state::AppState,
};

/// Roles and permissions of the authenticated caller
#[utoipa::path(
    get,
    path = "/api/v1/auth/permissions",
    responses(
        (status = 200, description = "Caller permissions", body = CallerPermissionsEnvelope),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer" = []))
)]
pub async fn get_my_permissions(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<JSend<CallerPermissionsResponse>>> {
    let roles = state.permissions.try_user_roles(user.id).await?;
    let permissions = state.permissions.try_user_permissions(user.id).await?;

    Ok(Json(JSend::success(CallerPermissionsResponse {
        user_id: user.id,
        is_admin: PermissionResolver::is_admin(&roles),
        roles,
        permissions: permissions.as_ref().clone(),
    })))
}
