//! Role and permission records

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Identifier of an authenticated user
pub type UserId = i64;

/// Role whose holders skip every permission check
pub const ADMIN_ROLE: &str = "admin";

/// Role whose permission set cannot be edited through the admin API
pub const CUSTOMER_ROLE: &str = "customer";

/// Listing order for well-known roles; anything else sorts after them
const ROLE_RANK: [&str; 4] = [ADMIN_ROLE, "manager", "staff", CUSTOMER_ROLE];

/// Sort key placing admin, manager, staff, customer first, then by id
pub fn role_rank(role_name: &str) -> usize {
    ROLE_RANK
        .iter()
        .position(|name| *name == role_name)
        .unwrap_or(ROLE_RANK.len())
}

/// A named role; only active roles contribute permissions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    pub role_id: i64,
    pub role_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_active: bool,
}

impl Role {
    /// Create an active role with no display metadata
    pub fn new(role_id: i64, role_name: impl Into<String>) -> Self {
        Self {
            role_id,
            role_name: role_name.into(),
            display_name: None,
            description: None,
            is_active: true,
        }
    }

    /// Mark the role inactive
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Admin holders bypass permission checks
    pub fn is_admin(&self) -> bool {
        self.role_name == ADMIN_ROLE
    }
}

/// A permission name such as `products.create`, grouped by module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Permission {
    pub permission_id: i64,
    pub permission_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
}

impl Permission {
    /// Create a permission whose module is the prefix before the first `.`
    pub fn new(permission_id: i64, permission_name: impl Into<String>) -> Self {
        let permission_name = permission_name.into();
        let module = permission_name
            .split_once('.')
            .map(|(module, _)| module.to_string());
        Self {
            permission_id,
            permission_name,
            display_name: None,
            description: None,
            module,
        }
    }
}

/// A role with the number of users and permissions attached to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RoleOverview {
    pub role_id: i64,
    pub role_name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub user_count: i64,
    pub permission_count: i64,
}

/// A user holding a role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RoleMember {
    pub user_id: UserId,
    pub assigned_at: NaiveDateTime,
}

/// Default page size for paginated listings
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Largest accepted page size
pub const MAX_PAGE_LIMIT: u32 = 100;

/// 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u32,
    limit: u32,
}

impl Pagination {
    /// Page numbers below 1 become 1; the limit is clamped to `1..=MAX_PAGE_LIMIT`
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Rows to skip before this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    pub fn metadata(&self, total_records: u64) -> PageMetadata {
        PageMetadata {
            total_records,
            first_page: 1,
            last_page: total_records.div_ceil(u64::from(self.limit)),
            page: self.page,
            limit: self.limit,
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_LIMIT)
    }
}

/// Paging information returned with a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub total_records: u64,
    pub first_page: u32,
    /// 0 when there are no records
    pub last_page: u64,
    pub page: u32,
    pub limit: u32,
}

/// One page of a role's members, most recently assigned first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMemberPage {
    pub users: Vec<RoleMember>,
    pub metadata: PageMetadata,
}
