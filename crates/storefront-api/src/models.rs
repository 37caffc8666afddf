//! API request and response models

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use storefront_permissions::{PageMetadata, Permission, Role, RoleMember, RoleOverview};
use utoipa::ToSchema;

/// JSend success envelope: `{ "status": "success", "data": ... }`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[aliases(
    CallerPermissionsEnvelope = JSend<CallerPermissionsResponse>,
    RoleListEnvelope = JSend<RoleListResponse>,
    RoleDetailEnvelope = JSend<RoleDetailResponse>,
    RoleUsersEnvelope = JSend<RoleUsersResponse>,
    RolePermissionsEnvelope = JSend<RolePermissionsResponse>,
    UpdateRolePermissionsEnvelope = JSend<UpdateRolePermissionsResponse>,
    HealthEnvelope = JSend<HealthResponse>
)]
pub struct JSend<T> {
    /// Always `success`
    pub status: String,
    pub data: T,
}

impl<T> JSend<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            data,
        }
    }
}

/// Roles and permissions held by the authenticated caller
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CallerPermissionsResponse {
    pub user_id: i64,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    /// Holders of the admin role pass every permission check
    pub is_admin: bool,
}

/// Role summary embedded in role responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleSummary {
    pub role_id: i64,
    pub role_name: String,
    pub display_name: Option<String>,
}

impl From<Role> for RoleSummary {
    fn from(role: Role) -> Self {
        Self {
            role_id: role.role_id,
            role_name: role.role_name,
            display_name: role.display_name,
        }
    }
}

/// A role with how many users and permissions it carries
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleOverviewInfo {
    pub role_id: i64,
    pub role_name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub user_count: i64,
    pub permission_count: i64,
}

impl From<RoleOverview> for RoleOverviewInfo {
    fn from(role: RoleOverview) -> Self {
        Self {
            role_id: role.role_id,
            role_name: role.role_name,
            display_name: role.display_name,
            description: role.description,
            is_active: role.is_active,
            user_count: role.user_count,
            permission_count: role.permission_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleListResponse {
    pub roles: Vec<RoleOverviewInfo>,
}

/// Full role record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleDetail {
    pub role_id: i64,
    pub role_name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
}

impl From<Role> for RoleDetail {
    fn from(role: Role) -> Self {
        Self {
            role_id: role.role_id,
            role_name: role.role_name,
            display_name: role.display_name,
            description: role.description,
            is_active: role.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleDetailResponse {
    pub role: RoleDetail,
}

/// A user holding a role
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleMemberInfo {
    pub user_id: i64,
    pub assigned_at: NaiveDateTime,
}

impl From<RoleMember> for RoleMemberInfo {
    fn from(member: RoleMember) -> Self {
        Self {
            user_id: member.user_id,
            assigned_at: member.assigned_at,
        }
    }
}

/// Paging information for list responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PageMetadataInfo {
    pub total_records: u64,
    pub first_page: u32,
    /// 0 when there are no records
    pub last_page: u64,
    pub page: u32,
    pub limit: u32,
}

impl From<PageMetadata> for PageMetadataInfo {
    fn from(metadata: PageMetadata) -> Self {
        Self {
            total_records: metadata.total_records,
            first_page: metadata.first_page,
            last_page: metadata.last_page,
            page: metadata.page,
            limit: metadata.limit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleUsersResponse {
    pub users: Vec<RoleMemberInfo>,
    pub metadata: PageMetadataInfo,
}

/// A permission as returned by the role endpoints
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PermissionInfo {
    pub permission_id: i64,
    pub permission_name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub module: Option<String>,
}

impl From<Permission> for PermissionInfo {
    fn from(permission: Permission) -> Self {
        Self {
            permission_id: permission.permission_id,
            permission_name: permission.permission_name,
            display_name: permission.display_name,
            description: permission.description,
            module: permission.module,
        }
    }
}

/// Permissions attached to a role
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RolePermissionsResponse {
    pub role: RoleSummary,
    pub permissions: Vec<PermissionInfo>,
}

/// Replace a role's permission set
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateRolePermissionsRequest {
    pub permission_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateRolePermissionsResponse {
    pub message: String,
    pub role_id: i64,
    pub permission_count: usize,
}

/// Permission cache counters
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CacheHealth {
    pub hits: u64,
    pub misses: u64,
    pub coalesced: u64,
    pub fetch_failures: u64,
    pub invalidations: u64,
    pub entry_count: usize,
}

impl From<storefront_cache::CacheStats> for CacheHealth {
    fn from(stats: storefront_cache::CacheStats) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            coalesced: stats.coalesced,
            fetch_failures: stats.fetch_failures,
            invalidations: stats.invalidations,
            entry_count: stats.entry_count,
        }
    }
}

/// API health response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Version
    pub version: String,
    /// Uptime in seconds
    pub uptime: u64,
    /// Database status
    pub database: String,
    /// Number of permissions in the route table
    pub permission_routes: usize,
    pub permission_cache: CacheHealth,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jsend_success_shape() {
        let body = serde_json::to_value(JSend::success(UpdateRolePermissionsResponse {
            message: "ok".to_string(),
            role_id: 2,
            permission_count: 3,
        }))
        .unwrap();
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["permission_count"], 3);
    }

    #[test]
    fn test_update_request_requires_array() {
        assert!(serde_json::from_str::<UpdateRolePermissionsRequest>(
            r#"{"permission_ids": [1, 2]}"#
        )
        .is_ok());
        assert!(serde_json::from_str::<UpdateRolePermissionsRequest>(
            r#"{"permission_ids": "1,2"}"#
        )
        .is_err());
        assert!(serde_json::from_str::<UpdateRolePermissionsRequest>("{}").is_err());
    }

    #[test]
    fn test_role_users_shape() {
        let body = serde_json::to_value(JSend::success(RoleUsersResponse {
            users: vec![RoleMemberInfo {
                user_id: 7,
                assigned_at: NaiveDateTime::parse_from_str(
                    "2024-01-02 03:04:05",
                    "%Y-%m-%d %H:%M:%S",
                )
                .unwrap(),
            }],
            metadata: storefront_permissions::Pagination::new(1, 20)
                .metadata(1)
                .into(),
        }))
        .unwrap();
        assert_eq!(body["data"]["users"][0]["user_id"], 7);
        assert_eq!(body["data"]["users"][0]["assigned_at"], "2024-01-02T03:04:05");
        assert_eq!(body["data"]["metadata"]["total_records"], 1);
        assert_eq!(body["data"]["metadata"]["last_page"], 1);
    }
}
