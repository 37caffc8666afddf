//! SQLite-backed role/permission store

use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tracing::{debug, info};

use crate::{
    error::{StoreError, StoreResult},
    permission::{Pagination, Permission, Role, RoleMember, RoleMemberPage, RoleOverview, UserId},
    store::RolePermissionStore,
};

const SCHEMA: &str = include_str!("../sql/schema.sql");

const USER_PERMISSIONS_SQL: &str = r#"
SELECT DISTINCT p.permission_name
FROM user_roles ur
JOIN roles r ON ur.role_id = r.role_id AND r.is_active = 1
JOIN role_permissions rp ON r.role_id = rp.role_id
JOIN permissions p ON rp.permission_id = p.permission_id
WHERE ur.user_id = ?
ORDER BY p.permission_name
"#;

const USER_ROLES_SQL: &str = r#"
SELECT DISTINCT r.role_name
FROM user_roles ur
JOIN roles r ON ur.role_id = r.role_id AND r.is_active = 1
WHERE ur.user_id = ?
ORDER BY r.role_name
"#;

const ROLE_SQL: &str = r#"
SELECT role_id, role_name, display_name, description, is_active
FROM roles
WHERE role_id = ?
"#;

const ROLES_OVERVIEW_SQL: &str = r#"
SELECT
    r.role_id,
    r.role_name,
    r.display_name,
    r.description,
    r.is_active,
    COUNT(DISTINCT ur.user_id) AS user_count,
    COUNT(DISTINCT rp.permission_id) AS permission_count
FROM roles r
LEFT JOIN user_roles ur ON r.role_id = ur.role_id
LEFT JOIN role_permissions rp ON r.role_id = rp.role_id
GROUP BY r.role_id, r.role_name, r.display_name, r.description, r.is_active
ORDER BY
    CASE r.role_name
        WHEN 'admin' THEN 1
        WHEN 'manager' THEN 2
        WHEN 'staff' THEN 3
        WHEN 'customer' THEN 4
        ELSE 5
    END,
    r.role_id
"#;

const ROLE_USER_COUNT_SQL: &str = "SELECT COUNT(*) FROM user_roles WHERE role_id = ?";

const ROLE_USERS_SQL: &str = r#"
SELECT user_id, assigned_at
FROM user_roles
WHERE role_id = ?
ORDER BY assigned_at DESC, user_id DESC
LIMIT ? OFFSET ?
"#;

const ROLE_PERMISSIONS_SQL: &str = r#"
SELECT p.permission_id, p.permission_name, p.display_name, p.description, p.module
FROM role_permissions rp
JOIN permissions p ON rp.permission_id = p.permission_id
WHERE rp.role_id = ?
ORDER BY p.module, p.permission_name
"#;

/// Role/permission store over a SQLite connection pool
#[derive(Debug, Clone)]
pub struct SqlRoleStore {
    pool: SqlitePool,
}

impl SqlRoleStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a pool for `database_url`
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        debug!(database_url, max_connections, "connected role store");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the RBAC tables if they do not exist
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        info!("role/permission schema ready");
        Ok(())
    }

    /// Insert or update a role
    pub async fn upsert_role(&self, role: &Role) -> StoreResult<()> {
        sqlx::query(
            r#"
INSERT INTO roles (role_id, role_name, display_name, description, is_active)
VALUES (?, ?, ?, ?, ?)
ON CONFLICT (role_id) DO UPDATE SET
    role_name = excluded.role_name,
    display_name = excluded.display_name,
    description = excluded.description,
    is_active = excluded.is_active
"#,
        )
        .bind(role.role_id)
        .bind(&role.role_name)
        .bind(&role.display_name)
        .bind(&role.description)
        .bind(role.is_active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Insert or update a permission
    pub async fn upsert_permission(&self, permission: &Permission) -> StoreResult<()> {
        sqlx::query(
            r#"
INSERT INTO permissions (permission_id, permission_name, display_name, description, module)
VALUES (?, ?, ?, ?, ?)
ON CONFLICT (permission_id) DO UPDATE SET
    permission_name = excluded.permission_name,
    display_name = excluded.display_name,
    description = excluded.description,
    module = excluded.module
"#,
        )
        .bind(permission.permission_id)
        .bind(&permission.permission_name)
        .bind(&permission.display_name)
        .bind(&permission.description)
        .bind(&permission.module)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn assign_role(&self, user_id: UserId, role_id: i64) -> StoreResult<()> {
        if self.role(role_id).await?.is_none() {
            return Err(StoreError::RoleNotFound(role_id));
        }
        sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(role_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_role_active(&self, role_id: i64, active: bool) -> StoreResult<()> {
        let result = sqlx::query("UPDATE roles SET is_active = ? WHERE role_id = ?")
            .bind(active)
            .bind(role_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::RoleNotFound(role_id));
        }
        Ok(())
    }
}

#[async_trait]
impl RolePermissionStore for SqlRoleStore {
    async fn permissions_for_user(&self, user_id: UserId) -> StoreResult<Vec<String>> {
        Ok(sqlx::query_scalar::<_, String>(USER_PERMISSIONS_SQL)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn roles_for_user(&self, user_id: UserId) -> StoreResult<Vec<String>> {
        Ok(sqlx::query_scalar::<_, String>(USER_ROLES_SQL)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn role(&self, role_id: i64) -> StoreResult<Option<Role>> {
        Ok(sqlx::query_as::<_, Role>(ROLE_SQL)
            .bind(role_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn roles(&self) -> StoreResult<Vec<RoleOverview>> {
        Ok(sqlx::query_as::<_, RoleOverview>(ROLES_OVERVIEW_SQL)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn role_users(&self, role_id: i64, page: Pagination) -> StoreResult<RoleMemberPage> {
        if self.role(role_id).await?.is_none() {
            return Err(StoreError::RoleNotFound(role_id));
        }

        let total: i64 = sqlx::query_scalar(ROLE_USER_COUNT_SQL)
            .bind(role_id)
            .fetch_one(&self.pool)
            .await?;
        let users = sqlx::query_as::<_, RoleMember>(ROLE_USERS_SQL)
            .bind(role_id)
            .bind(i64::from(page.limit()))
            .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        Ok(RoleMemberPage {
            users,
            metadata: page.metadata(u64::try_from(total).unwrap_or_default()),
        })
    }

    async fn role_permissions(&self, role_id: i64) -> StoreResult<Vec<Permission>> {
        Ok(sqlx::query_as::<_, Permission>(ROLE_PERMISSIONS_SQL)
            .bind(role_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn replace_role_permissions(
        &self,
        role_id: i64,
        permission_ids: &[i64],
    ) -> StoreResult<()> {
        let permission_ids: BTreeSet<i64> = permission_ids.iter().copied().collect();
        let mut tx = self.pool.begin().await?;

        let role_exists = sqlx::query_scalar::<_, i64>("SELECT role_id FROM roles WHERE role_id = ?")
            .bind(role_id)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if !role_exists {
            return Err(StoreError::RoleNotFound(role_id));
        }

        for permission_id in &permission_ids {
            let known = sqlx::query_scalar::<_, i64>(
                "SELECT permission_id FROM permissions WHERE permission_id = ?",
            )
            .bind(permission_id)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
            if !known {
                return Err(StoreError::UnknownPermission(*permission_id));
            }
        }

        sqlx::query("DELETE FROM role_permissions WHERE role_id = ?")
            .bind(role_id)
            .execute(&mut *tx)
            .await?;

        for permission_id in &permission_ids {
            sqlx::query("INSERT INTO role_permissions (role_id, permission_id) VALUES (?, ?)")
                .bind(role_id)
                .bind(permission_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        info!(role_id, count = permission_ids.len(), "replaced role permissions");
        Ok(())
    }
}
