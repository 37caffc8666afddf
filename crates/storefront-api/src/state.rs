//! Application state for the API server

use std::{sync::Arc, time::Instant};

use sqlx::SqlitePool;
use storefront_permissions::{PermissionService, RolePermissionStore};

use crate::middleware::TokenVerifier;

/// Application state shared across all API handlers
#[derive(Clone)]
pub struct AppState {
    /// Route resolution and cached permission lookup
    pub permissions: Arc<PermissionService>,
    /// Access token verification
    pub tokens: Arc<TokenVerifier>,
    /// Pool backing the role store, pinged by the health check
    pub pool: Option<SqlitePool>,
    /// Server start time for uptime calculation
    pub start_time: Instant,
}

impl AppState {
    pub fn new(permissions: Arc<PermissionService>, tokens: TokenVerifier) -> Self {
        Self {
            permissions,
            tokens: Arc::new(tokens),
            pool: None,
            start_time: Instant::now(),
        }
    }

    pub fn with_pool(mut self, pool: SqlitePool) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn store(&self) -> &Arc<dyn RolePermissionStore> {
        self.permissions.store()
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
