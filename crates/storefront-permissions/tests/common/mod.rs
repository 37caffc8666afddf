//! Shared fixtures for permissions integration tests

#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use storefront_permissions::{
    InMemoryRoleStore, Pagination, Permission, Role, RoleMemberPage, RoleOverview,
    RolePermissionStore, StoreError, StoreResult, UserId,
};
use tokio::sync::Notify;

pub const ADMIN_USER: UserId = 1;
pub const STAFF_USER: UserId = 2;
pub const CUSTOMER_USER: UserId = 3;

/// In-memory store seeded with admin/staff/customer roles
pub fn seeded_store() -> InMemoryRoleStore {
    let store = InMemoryRoleStore::new();
    store.add_role(Role::new(1, "admin")).unwrap();
    store.add_role(Role::new(2, "staff")).unwrap();
    store.add_role(Role::new(3, "customer")).unwrap();

    for (id, name) in [
        (10, "products.create"),
        (11, "products.edit"),
        (12, "orders.manage_status"),
        (13, "users.view"),
    ] {
        store.add_permission(Permission::new(id, name)).unwrap();
    }

    store.grant(2, 10).unwrap();
    store.grant(2, 11).unwrap();
    store.grant(2, 12).unwrap();

    store.assign_role(ADMIN_USER, 1).unwrap();
    store.assign_role(STAFF_USER, 2).unwrap();
    store.assign_role(CUSTOMER_USER, 3).unwrap();
    store
}

/// Store wrapper that counts queries and can be switched into failure mode
pub struct CountingStore {
    pub inner: InMemoryRoleStore,
    permission_queries: AtomicUsize,
    role_queries: AtomicUsize,
    failing: AtomicBool,
    gate: Option<Arc<Notify>>,
}

impl CountingStore {
    pub fn new(inner: InMemoryRoleStore) -> Self {
        Self {
            inner,
            permission_queries: AtomicUsize::new(0),
            role_queries: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            gate: None,
        }
    }

    /// Block every permission query until the gate is notified
    pub fn gated(inner: InMemoryRoleStore, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(inner)
        }
    }

    pub fn permission_queries(&self) -> usize {
        self.permission_queries.load(Ordering::SeqCst)
    }

    pub fn role_queries(&self) -> usize {
        self.role_queries.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RolePermissionStore for CountingStore {
    async fn permissions_for_user(&self, user_id: UserId) -> StoreResult<Vec<String>> {
        self.permission_queries.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.check()?;
        self.inner.permissions_for_user(user_id).await
    }

    async fn roles_for_user(&self, user_id: UserId) -> StoreResult<Vec<String>> {
        self.role_queries.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.roles_for_user(user_id).await
    }

    async fn role(&self, role_id: i64) -> StoreResult<Option<Role>> {
        self.check()?;
        self.inner.role(role_id).await
    }

    async fn roles(&self) -> StoreResult<Vec<RoleOverview>> {
        self.check()?;
        self.inner.roles().await
    }

    async fn role_users(&self, role_id: i64, page: Pagination) -> StoreResult<RoleMemberPage> {
        self.check()?;
        self.inner.role_users(role_id, page).await
    }

    async fn role_permissions(&self, role_id: i64) -> StoreResult<Vec<Permission>> {
        self.check()?;
        self.inner.role_permissions(role_id).await
    }

    async fn replace_role_permissions(
        &self,
        role_id: i64,
        permission_ids: &[i64],
    ) -> StoreResult<()> {
        self.check()?;
        self.inner
            .replace_role_permissions(role_id, permission_ids)
            .await
    }
}
