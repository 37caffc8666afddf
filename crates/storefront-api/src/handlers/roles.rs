//! Role administration

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde::Deserialize;
use storefront_permissions::{Pagination, CUSTOMER_ROLE, DEFAULT_PAGE_LIMIT};
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    models::{
        JSend, RoleDetailEnvelope, RoleDetailResponse, RoleListEnvelope, RoleListResponse,
        RolePermissionsEnvelope, RolePermissionsResponse, RoleUsersEnvelope, RoleUsersResponse,
        UpdateRolePermissionsEnvelope, UpdateRolePermissionsRequest,
        UpdateRolePermissionsResponse,
    },
    state::AppState,
};

/// Query parameters for listing a role's users
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct RoleUsersQuery {
    /// 1-based page number, default 1
    pub page: Option<u32>,
    /// Page size, default 20, at most 100
    pub limit: Option<u32>,
}

/// All roles with user and permission counts
#[utoipa::path(
    get,
    path = "/api/v1/admin/roles",
    responses(
        (status = 200, description = "Roles, admin first", body = RoleListEnvelope),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller lacks roles.manage")
    ),
    security(("bearer" = []))
)]
pub async fn list_roles(
    State(state): State<AppState>,
) -> ApiResult<Json<JSend<RoleListResponse>>> {
    let roles = state.store().roles().await?;

    Ok(Json(JSend::success(RoleListResponse {
        roles: roles.into_iter().map(Into::into).collect(),
    })))
}

/// A single role
#[utoipa::path(
    get,
    path = "/api/v1/admin/roles/{role_id}",
    params(("role_id" = i64, Path, description = "Role id")),
    responses(
        (status = 200, description = "Role", body = RoleDetailEnvelope),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller lacks roles.manage"),
        (status = 404, description = "Role not found")
    ),
    security(("bearer" = []))
)]
pub async fn get_role(
    State(state): State<AppState>,
    Path(role_id): Path<i64>,
) -> ApiResult<Json<JSend<RoleDetailResponse>>> {
    let role = state
        .store()
        .role(role_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Role not found".to_string()))?;

    Ok(Json(JSend::success(RoleDetailResponse { role: role.into() })))
}

/// Users holding a role, most recently assigned first
#[utoipa::path(
    get,
    path = "/api/v1/admin/roles/{role_id}/users",
    params(("role_id" = i64, Path, description = "Role id"), RoleUsersQuery),
    responses(
        (status = 200, description = "One page of role members", body = RoleUsersEnvelope),
        (status = 400, description = "page or limit is not a non-negative integer"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller lacks roles.manage"),
        (status = 404, description = "Role not found")
    ),
    security(("bearer" = []))
)]
pub async fn get_role_users(
    State(state): State<AppState>,
    Path(role_id): Path<i64>,
    query: Result<Query<RoleUsersQuery>, QueryRejection>,
) -> ApiResult<Json<JSend<RoleUsersResponse>>> {
    let Query(query) = query.map_err(|_| {
        ApiError::BadRequest("page and limit must be non-negative integers".to_string())
    })?;
    let page = Pagination::new(
        query.page.unwrap_or(1),
        query.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
    );

    // RoleNotFound maps to 404
    let members = state.store().role_users(role_id, page).await?;

    Ok(Json(JSend::success(RoleUsersResponse {
        users: members.users.into_iter().map(Into::into).collect(),
        metadata: members.metadata.into(),
    })))
}

/// Permissions attached to a role
#[utoipa::path(
    get,
    path = "/api/v1/admin/roles/{role_id}/permissions",
    params(("role_id" = i64, Path, description = "Role id")),
    responses(
        (status = 200, description = "Role permissions", body = RolePermissionsEnvelope),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller lacks roles.manage"),
        (status = 404, description = "Role not found")
    ),
    security(("bearer" = []))
)]
pub async fn get_role_permissions(
    State(state): State<AppState>,
    Path(role_id): Path<i64>,
) -> ApiResult<Json<JSend<RolePermissionsResponse>>> {
    let role = state
        .store()
        .role(role_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Role not found".to_string()))?;
    let permissions = state.store().role_permissions(role_id).await?;

    Ok(Json(JSend::success(RolePermissionsResponse {
        role: role.into(),
        permissions: permissions.into_iter().map(Into::into).collect(),
    })))
}

/// Replace a role's permission set and drop every cached permission set
#[utoipa::path(
    put,
    path = "/api/v1/admin/roles/{role_id}/permissions",
    params(("role_id" = i64, Path, description = "Role id")),
    request_body = UpdateRolePermissionsRequest,
    responses(
        (status = 200, description = "Permissions replaced", body = UpdateRolePermissionsEnvelope),
        (status = 400, description = "permission_ids missing, not an array, or unknown"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller lacks roles.manage, or the role is protected"),
        (status = 404, description = "Role not found")
    ),
    security(("bearer" = []))
)]
pub async fn update_role_permissions(
    State(state): State<AppState>,
    Path(role_id): Path<i64>,
    payload: Result<Json<UpdateRolePermissionsRequest>, JsonRejection>,
) -> ApiResult<Json<JSend<UpdateRolePermissionsResponse>>> {
    let Json(request) = payload
        .map_err(|_| ApiError::BadRequest("permission_ids must be an array".to_string()))?;

    let role = state
        .store()
        .role(role_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Role not found".to_string()))?;
    if role.role_name == CUSTOMER_ROLE {
        return Err(ApiError::Forbidden(
            "Cannot modify customer role permissions".to_string(),
        ));
    }

    state
        .store()
        .replace_role_permissions(role_id, &request.permission_ids)
        .await?;
    state.permissions.clear_permission_cache();

    let permission_count = state.store().role_permissions(role_id).await?.len();
    info!(role_id, permission_count, "role permissions updated");

    Ok(Json(JSend::success(UpdateRolePermissionsResponse {
        message: "Role permissions updated successfully".to_string(),
        role_id,
        permission_count,
    })))
}
