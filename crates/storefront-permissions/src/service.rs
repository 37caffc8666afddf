//! Permission service: route resolution plus cached per-user permission lookup

use std::{sync::Arc, time::Duration};

use storefront_cache::{CacheBuilder, CacheStats, TtlCache};
use tracing::{debug, error, info, warn};

use crate::{
    audit::{AuditAction, AuditLogEntry, AuditLogger},
    error::{Error, Result, StoreError, StoreResult},
    permission::{AccessDecision, PermissionResolver, PermissionRouteTable, UserId},
    store::RolePermissionStore,
};

/// How long a user's permission set is served from cache
pub const DEFAULT_PERMISSION_TTL: Duration = Duration::from_secs(5 * 60);

/// Resolves required permissions and answers "does this user hold it"
///
/// User permission sets are cached per user for the configured TTL.
/// Concurrent misses for the same user share one store query. Roles are
/// always read from the store.
pub struct PermissionService {
    resolver: PermissionResolver,
    store: Arc<dyn RolePermissionStore>,
    cache: TtlCache<UserId, Arc<Vec<String>>>,
    audit: Option<AuditLogger>,
}

impl PermissionService {
    /// Create a service with the default TTL and no audit logger
    pub fn new(table: Arc<PermissionRouteTable>, store: Arc<dyn RolePermissionStore>) -> Self {
        Self {
            resolver: PermissionResolver::new(table),
            store,
            cache: TtlCache::new(DEFAULT_PERMISSION_TTL),
            audit: None,
        }
    }

    pub fn builder() -> PermissionServiceBuilder {
        PermissionServiceBuilder::new()
    }

    pub fn table(&self) -> &PermissionRouteTable {
        self.resolver.table()
    }

    pub fn store(&self) -> &Arc<dyn RolePermissionStore> {
        &self.store
    }

    pub fn audit_logger(&self) -> Option<&AuditLogger> {
        self.audit.as_ref()
    }

    /// Permission required by a request, or `None` for public routes
    pub fn required_permission(&self, method: &str, path: &str) -> Option<&str> {
        self.resolver.required_permission(method, path)
    }

    /// Cached permission names for a user, surfacing store failures.
    ///
    /// Failures are never cached.
    pub async fn try_user_permissions(&self, user_id: UserId) -> StoreResult<Arc<Vec<String>>> {
        self.cache
            .get_or_try_fetch(user_id, || async {
                let permissions = self.store.permissions_for_user(user_id).await?;
                debug!(user_id, count = permissions.len(), "loaded user permissions");
                Ok::<_, StoreError>(Arc::new(permissions))
            })
            .await
    }

    /// Cached permission names for a user.
    ///
    /// A store failure is logged and yields an empty set, which is not cached.
    pub async fn user_permissions(&self, user_id: UserId) -> Arc<Vec<String>> {
        match self.try_user_permissions(user_id).await {
            Ok(permissions) => permissions,
            Err(err) => {
                error!(user_id, error = %err, "failed to fetch user permissions");
                Arc::new(Vec::new())
            }
        }
    }

    /// Role names for a user, read straight from the store
    pub async fn try_user_roles(&self, user_id: UserId) -> StoreResult<Vec<String>> {
        self.store.roles_for_user(user_id).await
    }

    /// Role names for a user; a store failure yields an empty list
    pub async fn user_roles(&self, user_id: UserId) -> Vec<String> {
        match self.try_user_roles(user_id).await {
            Ok(roles) => roles,
            Err(err) => {
                error!(user_id, error = %err, "failed to fetch user roles");
                Vec::new()
            }
        }
    }

    /// Whether the user currently holds `permission`
    pub async fn has_permission(&self, user_id: UserId, permission: &str) -> StoreResult<bool> {
        let permissions = self.try_user_permissions(user_id).await?;
        Ok(permissions.iter().any(|p| p == permission))
    }

    /// Drop every cached permission set.
    ///
    /// Lookups already in flight complete for their callers but do not
    /// repopulate the cache.
    pub fn clear_permission_cache(&self) {
        self.cache.clear();
        info!("permission cache cleared");
    }

    /// Drop one user's cached permission set
    pub fn invalidate_user(&self, user_id: UserId) -> bool {
        self.cache.invalidate(&user_id)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.metrics().snapshot()
    }

    /// Decide whether a request may proceed.
    ///
    /// Public routes are allowed without a user. Holders of the admin role
    /// are allowed on any route. Everyone else needs the exact permission.
    pub async fn authorize(
        &self,
        user_id: Option<UserId>,
        method: &str,
        path: &str,
    ) -> StoreResult<AccessDecision> {
        let Some(required) = self.required_permission(method, path) else {
            return Ok(AccessDecision::Public);
        };
        let required = required.to_string();

        let decision = match user_id {
            None => AccessDecision::Unauthenticated { required },
            Some(user_id) => {
                let roles = self.try_user_roles(user_id).await?;
                if PermissionResolver::is_admin(&roles) {
                    AccessDecision::AdminBypass { required }
                } else {
                    let permissions = self.try_user_permissions(user_id).await?;
                    PermissionResolver::check_permission(&required, permissions.as_slice())
                }
            }
        };

        if let AccessDecision::Denied { required } = &decision {
            warn!(?user_id, method, path, required = %required, "permission denied");
        }
        self.record(user_id, method, path, &decision);
        Ok(decision)
    }

    fn record(
        &self,
        user_id: Option<UserId>,
        method: &str,
        path: &str,
        decision: &AccessDecision,
    ) {
        let (Some(audit), Some(action), Some(required)) = (
            self.audit.as_ref(),
            AuditAction::from_decision(decision),
            decision.required_permission(),
        ) else {
            return;
        };

        let mut entry = AuditLogEntry::new(method, path, required, action);
        if let Some(user_id) = user_id {
            entry = entry.with_user(user_id);
        }
        if let Err(err) = audit.record(entry) {
            error!(error = %err, "failed to record audit entry");
        }
    }
}

/// Builder for [`PermissionService`]
pub struct PermissionServiceBuilder {
    table: Option<Arc<PermissionRouteTable>>,
    store: Option<Arc<dyn RolePermissionStore>>,
    ttl: Duration,
    audit: Option<AuditLogger>,
}

impl PermissionServiceBuilder {
    pub fn new() -> Self {
        Self {
            table: None,
            store: None,
            ttl: DEFAULT_PERMISSION_TTL,
            audit: None,
        }
    }

    pub fn table(mut self, table: Arc<PermissionRouteTable>) -> Self {
        self.table = Some(table);
        self
    }

    pub fn store(mut self, store: Arc<dyn RolePermissionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Permission cache TTL; must be non-zero
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn audit_logger(mut self, audit: AuditLogger) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Build the service. Without a table, the built-in storefront table is used.
    pub fn build(self) -> Result<PermissionService> {
        let store = self
            .store
            .ok_or_else(|| Error::ConfigError("A role/permission store is required".to_string()))?;
        let table = match self.table {
            Some(table) => table,
            None => Arc::new(PermissionRouteTable::storefront_defaults()?),
        };
        let cache = CacheBuilder::new()
            .ttl(self.ttl)
            .build()
            .map_err(|e| Error::ConfigError(e.to_string()))?;

        Ok(PermissionService {
            resolver: PermissionResolver::new(table),
            store,
            cache,
            audit: self.audit,
        })
    }
}

impl Default for PermissionServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
