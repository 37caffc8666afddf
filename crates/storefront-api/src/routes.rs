//! API route definitions

use axum::{middleware, routing::get, Router};
use tower_http::cors::CorsLayer;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    handlers::{health, permissions, roles},
    middleware::{logging_middleware, optional_auth, permission_gate, require_auth},
    state::AppState,
};

/// API routes.
///
/// Every request passes `optional_auth` and then the permission gate, so
/// routes listed in the permission table are enforced whether or not the
/// handler itself asks for a user.
pub fn api_routes(state: AppState) -> Router<AppState> {
    let authenticated = Router::new()
        .route(
            "/api/v1/auth/permissions",
            get(permissions::get_my_permissions),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Role administration, guarded by roles.manage in the route table
        .route("/api/v1/admin/roles", get(roles::list_roles))
        .route("/api/v1/admin/roles/:role_id", get(roles::get_role))
        .route(
            "/api/v1/admin/roles/:role_id/users",
            get(roles::get_role_users),
        )
        .route(
            "/api/v1/admin/roles/:role_id/permissions",
            get(roles::get_role_permissions).put(roles::update_role_permissions),
        )
        .merge(authenticated)
        // Layers run bottom-up: auth attaches the user before the gate reads it
        .layer(middleware::from_fn_with_state(state.clone(), permission_gate))
        .layer(middleware::from_fn_with_state(state, optional_auth))
}

/// Swagger UI routes
pub fn swagger_routes() -> Router<AppState> {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

/// Combined application router
pub fn app(state: AppState) -> Router {
    api_routes(state.clone())
        .merge(swagger_routes())
        .layer(middleware::from_fn(logging_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        permissions::get_my_permissions,
        roles::list_roles,
        roles::get_role,
        roles::get_role_users,
        roles::get_role_permissions,
        roles::update_role_permissions,
    ),
    components(schemas(
        crate::models::HealthResponse,
        crate::models::HealthEnvelope,
        crate::models::CacheHealth,
        crate::models::CallerPermissionsResponse,
        crate::models::CallerPermissionsEnvelope,
        crate::models::RoleOverviewInfo,
        crate::models::RoleListResponse,
        crate::models::RoleListEnvelope,
        crate::models::RoleDetail,
        crate::models::RoleDetailResponse,
        crate::models::RoleDetailEnvelope,
        crate::models::RoleMemberInfo,
        crate::models::PageMetadataInfo,
        crate::models::RoleUsersResponse,
        crate::models::RoleUsersEnvelope,
        crate::models::RoleSummary,
        crate::models::PermissionInfo,
        crate::models::RolePermissionsResponse,
        crate::models::RolePermissionsEnvelope,
        crate::models::UpdateRolePermissionsRequest,
        crate::models::UpdateRolePermissionsResponse,
        crate::models::UpdateRolePermissionsEnvelope,
    )),
    modifiers(&SecurityAddon),
    info(
        title = "Storefront API",
        version = "1.0.0",
        description = "Route permission gating and role administration for the storefront backend"
    )
)]
pub struct ApiDoc;
