//! Health check endpoint

use axum::{extract::State, Json};
use tracing::warn;

use crate::{
    models::{HealthEnvelope, HealthResponse, JSend},
    state::AppState,
};

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthEnvelope)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<JSend<HealthResponse>> {
    let database = match &state.pool {
        Some(pool) => match sqlx::query("SELECT 1").execute(pool).await {
            Ok(_) => "connected",
            Err(err) => {
                warn!(error = %err, "database health check failed");
                "unavailable"
            }
        },
        None => "not configured",
    };

    let status = if database == "unavailable" {
        "degraded"
    } else {
        "healthy"
    };

    Json(JSend::success(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.uptime_seconds(),
        database: database.to_string(),
        permission_routes: state.permissions.table().len(),
        permission_cache: state.permissions.cache_stats().into(),
    }))
}
