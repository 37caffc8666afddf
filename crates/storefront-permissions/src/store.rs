//! Role/permission store abstraction
//!
//! The service only reads through [`RolePermissionStore`]; the SQL-backed
//! implementation lives in [`crate::sql_store`].

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use async_trait::async_trait;
use chrono::{NaiveDateTime, SubsecRound, Utc};

use crate::{
    error::{StoreError, StoreResult},
    permission::{
        role_rank, Pagination, Permission, Role, RoleMember, RoleMemberPage, RoleOverview, UserId,
    },
};

/// Backing store for roles, permissions and their assignments
#[async_trait]
pub trait RolePermissionStore: Send + Sync {
    /// Distinct permission names granted to the user through active roles
    async fn permissions_for_user(&self, user_id: UserId) -> StoreResult<Vec<String>>;

    /// Names of the user's active roles
    async fn roles_for_user(&self, user_id: UserId) -> StoreResult<Vec<String>>;

    async fn role(&self, role_id: i64) -> StoreResult<Option<Role>>;

    /// Every role with its user and permission counts, well-known roles first
    async fn roles(&self) -> StoreResult<Vec<RoleOverview>>;

    /// One page of the users holding a role, most recently assigned first.
    ///
    /// Fails with [`StoreError::RoleNotFound`] for an unknown role.
    async fn role_users(&self, role_id: i64, page: Pagination) -> StoreResult<RoleMemberPage>;

    /// Permissions attached to a role, ordered by module then name
    async fn role_permissions(&self, role_id: i64) -> StoreResult<Vec<Permission>>;

    /// Atomically replace a role's permission set
    async fn replace_role_permissions(&self, role_id: i64, permission_ids: &[i64])
        -> StoreResult<()>;
}

#[derive(Debug, Default)]
struct Tables {
    roles: Vec<Role>,
    permissions: Vec<Permission>,
    /// Assignment time per `(user, role)`, at second precision like SQLite's `CURRENT_TIMESTAMP`
    user_roles: BTreeMap<(UserId, i64), NaiveDateTime>,
    role_permissions: BTreeSet<(i64, i64)>,
}

impl Tables {
    fn role(&self, role_id: i64) -> Option<&Role> {
        self.roles.iter().find(|role| role.role_id == role_id)
    }

    fn permission(&self, permission_id: i64) -> Option<&Permission> {
        self.permissions
            .iter()
            .find(|permission| permission.permission_id == permission_id)
    }

    fn user_role_ids(&self, user_id: UserId) -> impl Iterator<Item = i64> + '_ {
        self.user_roles
            .keys()
            .filter(move |(user, _)| *user == user_id)
            .map(|(_, role_id)| *role_id)
    }
}

/// In-memory store, used by tests and local development
#[derive(Debug, Default)]
pub struct InMemoryRoleStore {
    tables: RwLock<Tables>,
}

impl InMemoryRoleStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|e| StoreError::Unavailable(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|e| StoreError::Unavailable(format!("Failed to acquire write lock: {}", e)))
    }

    /// Insert or replace a role
    pub fn add_role(&self, role: Role) -> StoreResult<()> {
        let mut tables = self.write()?;
        tables.roles.retain(|r| r.role_id != role.role_id);
        tables.roles.push(role);
        Ok(())
    }

    /// Insert or replace a permission
    pub fn add_permission(&self, permission: Permission) -> StoreResult<()> {
        let mut tables = self.write()?;
        tables
            .permissions
            .retain(|p| p.permission_id != permission.permission_id);
        tables.permissions.push(permission);
        Ok(())
    }

    pub fn assign_role(&self, user_id: UserId, role_id: i64) -> StoreResult<()> {
        self.assign_role_at(user_id, role_id, Utc::now().naive_utc().trunc_subsecs(0))
    }

    /// Assign a role with an explicit assignment time; re-assigning keeps the first time
    pub fn assign_role_at(
        &self,
        user_id: UserId,
        role_id: i64,
        assigned_at: NaiveDateTime,
    ) -> StoreResult<()> {
        let mut tables = self.write()?;
        if tables.role(role_id).is_none() {
            return Err(StoreError::RoleNotFound(role_id));
        }
        tables
            .user_roles
            .entry((user_id, role_id))
            .or_insert(assigned_at);
        Ok(())
    }

    pub fn grant(&self, role_id: i64, permission_id: i64) -> StoreResult<()> {
        let mut tables = self.write()?;
        if tables.role(role_id).is_none() {
            return Err(StoreError::RoleNotFound(role_id));
        }
        if tables.permission(permission_id).is_none() {
            return Err(StoreError::UnknownPermission(permission_id));
        }
        tables.role_permissions.insert((role_id, permission_id));
        Ok(())
    }

    pub fn set_role_active(&self, role_id: i64, active: bool) -> StoreResult<()> {
        let mut tables = self.write()?;
        let role = tables
            .roles
            .iter_mut()
            .find(|role| role.role_id == role_id)
            .ok_or(StoreError::RoleNotFound(role_id))?;
        role.is_active = active;
        Ok(())
    }
}

#[async_trait]
impl RolePermissionStore for InMemoryRoleStore {
    async fn permissions_for_user(&self, user_id: UserId) -> StoreResult<Vec<String>> {
        let tables = self.read()?;
        let active_roles: BTreeSet<i64> = tables
            .user_role_ids(user_id)
            .filter(|role_id| tables.role(*role_id).is_some_and(|role| role.is_active))
            .collect();

        let names: BTreeSet<String> = tables
            .role_permissions
            .iter()
            .filter(|(role_id, _)| active_roles.contains(role_id))
            .filter_map(|(_, permission_id)| tables.permission(*permission_id))
            .map(|permission| permission.permission_name.clone())
            .collect();

        Ok(names.into_iter().collect())
    }

    async fn roles_for_user(&self, user_id: UserId) -> StoreResult<Vec<String>> {
        let tables = self.read()?;
        let names: BTreeSet<String> = tables
            .user_role_ids(user_id)
            .filter_map(|role_id| tables.role(role_id))
            .filter(|role| role.is_active)
            .map(|role| role.role_name.clone())
            .collect();
        Ok(names.into_iter().collect())
    }

    async fn role(&self, role_id: i64) -> StoreResult<Option<Role>> {
        Ok(self.read()?.role(role_id).cloned())
    }

    async fn roles(&self) -> StoreResult<Vec<RoleOverview>> {
        let tables = self.read()?;
        let mut roles: Vec<RoleOverview> = tables
            .roles
            .iter()
            .map(|role| RoleOverview {
                role_id: role.role_id,
                role_name: role.role_name.clone(),
                display_name: role.display_name.clone(),
                description: role.description.clone(),
                is_active: role.is_active,
                user_count: tables
                    .user_roles
                    .keys()
                    .filter(|(_, role_id)| *role_id == role.role_id)
                    .count() as i64,
                permission_count: tables
                    .role_permissions
                    .iter()
                    .filter(|(role_id, _)| *role_id == role.role_id)
                    .count() as i64,
            })
            .collect();
        roles.sort_by_key(|role| (role_rank(&role.role_name), role.role_id));
        Ok(roles)
    }

    async fn role_users(&self, role_id: i64, page: Pagination) -> StoreResult<RoleMemberPage> {
        let tables = self.read()?;
        if tables.role(role_id).is_none() {
            return Err(StoreError::RoleNotFound(role_id));
        }

        let mut members: Vec<RoleMember> = tables
            .user_roles
            .iter()
            .filter(|((_, role), _)| *role == role_id)
            .map(|((user_id, _), assigned_at)| RoleMember {
                user_id: *user_id,
                assigned_at: *assigned_at,
            })
            .collect();
        members.sort_by(|a, b| (b.assigned_at, b.user_id).cmp(&(a.assigned_at, a.user_id)));

        let metadata = page.metadata(members.len() as u64);
        let users = members
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(page.limit() as usize)
            .collect();
        Ok(RoleMemberPage { users, metadata })
    }

    async fn role_permissions(&self, role_id: i64) -> StoreResult<Vec<Permission>> {
        let tables = self.read()?;
        let mut permissions: Vec<Permission> = tables
            .role_permissions
            .iter()
            .filter(|(role, _)| *role == role_id)
            .filter_map(|(_, permission_id)| tables.permission(*permission_id).cloned())
            .collect();
        permissions.sort_by(|a, b| {
            (&a.module, &a.permission_name).cmp(&(&b.module, &b.permission_name))
        });
        Ok(permissions)
    }

    async fn replace_role_permissions(
        &self,
        role_id: i64,
        permission_ids: &[i64],
    ) -> StoreResult<()> {
        let mut tables = self.write()?;
        if tables.role(role_id).is_none() {
            return Err(StoreError::RoleNotFound(role_id));
        }
        // Validate everything before touching the table
        if let Some(unknown) = permission_ids
            .iter()
            .find(|id| tables.permission(**id).is_none())
        {
            return Err(StoreError::UnknownPermission(*unknown));
        }

        tables.role_permissions.retain(|(role, _)| *role != role_id);
        for permission_id in permission_ids {
            tables.role_permissions.insert((role_id, *permission_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> InMemoryRoleStore {
        let store = InMemoryRoleStore::new();
        store.add_role(Role::new(1, "admin")).unwrap();
        store.add_role(Role::new(2, "staff")).unwrap();
        store.add_role(Role::new(3, "legacy").inactive()).unwrap();
        store.add_permission(Permission::new(10, "products.create")).unwrap();
        store.add_permission(Permission::new(11, "orders.cancel")).unwrap();
        store.add_permission(Permission::new(12, "users.view")).unwrap();
        store
    }

    #[tokio::test]
    async fn test_permissions_come_from_active_roles_only() {
        let store = seeded();
        store.grant(2, 10).unwrap();
        store.grant(3, 12).unwrap();
        store.assign_role(7, 2).unwrap();
        store.assign_role(7, 3).unwrap();

        assert_eq!(
            store.permissions_for_user(7).await.unwrap(),
            vec!["products.create".to_string()]
        );
        assert_eq!(
            store.roles_for_user(7).await.unwrap(),
            vec!["staff".to_string()]
        );
    }

    #[tokio::test]
    async fn test_permissions_are_distinct() {
        let store = seeded();
        store.add_role(Role::new(4, "manager")).unwrap();
        store.grant(2, 10).unwrap();
        store.grant(4, 10).unwrap();
        store.assign_role(7, 2).unwrap();
        store.assign_role(7, 4).unwrap();

        assert_eq!(store.permissions_for_user(7).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_user_has_nothing() {
        let store = seeded();
        assert!(store.permissions_for_user(99).await.unwrap().is_empty());
        assert!(store.roles_for_user(99).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_role_permissions_ordered_by_module() {
        let store = seeded();
        store.grant(2, 12).unwrap();
        store.grant(2, 10).unwrap();
        store.grant(2, 11).unwrap();

        let names: Vec<_> = store
            .role_permissions(2)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.permission_name)
            .collect();
        assert_eq!(names, vec!["orders.cancel", "products.create", "users.view"]);
    }

    #[tokio::test]
    async fn test_replace_role_permissions() {
        let store = seeded();
        store.grant(2, 10).unwrap();

        store.replace_role_permissions(2, &[11, 12]).await.unwrap();
        let ids: Vec<_> = store
            .role_permissions(2)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.permission_id)
            .collect();
        assert_eq!(ids, vec![11, 12]);

        store.replace_role_permissions(2, &[]).await.unwrap();
        assert!(store.role_permissions(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_rejects_unknown_ids_atomically() {
        let store = seeded();
        store.grant(2, 10).unwrap();

        let err = store.replace_role_permissions(2, &[11, 999]).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownPermission(999)));
        assert_eq!(store.role_permissions(2).await.unwrap().len(), 1);

        let err = store.replace_role_permissions(42, &[10]).await.unwrap_err();
        assert!(matches!(err, StoreError::RoleNotFound(42)));
    }

    #[test]
    fn test_assign_unknown_role_fails() {
        let store = seeded();
        assert!(matches!(
            store.assign_role(1, 99),
            Err(StoreError::RoleNotFound(99))
        ));
        assert!(matches!(
            store.grant(1, 99),
            Err(StoreError::UnknownPermission(99))
        ));
    }

    fn at(seconds: i64) -> NaiveDateTime {
        chrono::DateTime::from_timestamp(1_700_000_000 + seconds, 0)
            .unwrap()
            .naive_utc()
    }

    #[tokio::test]
    async fn test_roles_overview_counts_and_order() {
        let store = seeded();
        store.add_role(Role::new(4, "customer")).unwrap();
        store.add_role(Role::new(5, "manager")).unwrap();
        store.grant(2, 10).unwrap();
        store.grant(2, 11).unwrap();
        store.assign_role(7, 2).unwrap();
        store.assign_role(8, 2).unwrap();
        store.assign_role(8, 1).unwrap();

        let roles = store.roles().await.unwrap();
        let names: Vec<_> = roles.iter().map(|r| r.role_name.as_str()).collect();
        assert_eq!(names, vec!["admin", "manager", "staff", "customer", "legacy"]);

        let staff = &roles[2];
        assert_eq!((staff.user_count, staff.permission_count), (2, 2));
        assert_eq!((roles[0].user_count, roles[0].permission_count), (1, 0));
        assert!(!roles[4].is_active);
    }

    #[tokio::test]
    async fn test_role_users_paginates_newest_first() {
        let store = seeded();
        for user_id in 1..=5 {
            store.assign_role_at(user_id, 2, at(user_id)).unwrap();
        }
        // Re-assigning keeps the original time
        store.assign_role_at(1, 2, at(100)).unwrap();

        let first = store.role_users(2, Pagination::new(1, 2)).await.unwrap();
        let ids: Vec<_> = first.users.iter().map(|u| u.user_id).collect();
        assert_eq!(ids, vec![5, 4]);
        assert_eq!(first.metadata.total_records, 5);
        assert_eq!(first.metadata.last_page, 3);

        let last = store.role_users(2, Pagination::new(3, 2)).await.unwrap();
        assert_eq!(last.users.len(), 1);
        assert_eq!(last.users[0].user_id, 1);
        assert_eq!(last.users[0].assigned_at, at(1));

        let beyond = store.role_users(2, Pagination::new(9, 2)).await.unwrap();
        assert!(beyond.users.is_empty());
        assert_eq!(beyond.metadata.total_records, 5);
    }

    #[tokio::test]
    async fn test_role_users_unknown_role() {
        let store = seeded();
        assert!(matches!(
            store.role_users(42, Pagination::default()).await,
            Err(StoreError::RoleNotFound(42))
        ));
        let empty = store.role_users(1, Pagination::default()).await.unwrap();
        assert!(empty.users.is_empty());
        assert_eq!(empty.metadata.last_page, 0);
    }
}
