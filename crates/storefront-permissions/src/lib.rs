//! Route-based permission system for the storefront backend
//!
//! Maps incoming `METHOD /path` requests to the permission that guards them,
//! looks up the permissions a user holds through their active roles (cached
//! per user), and decides whether the request may proceed. Holders of the
//! `admin` role bypass every check.

pub mod audit;
pub mod error;
pub mod permission;
pub mod route_matcher;
pub mod service;
pub mod sql_store;
pub mod store;

pub use audit::{AuditAction, AuditLogEntry, AuditLogger};
pub use error::{Error, Result, StoreError, StoreResult};
pub use permission::{
    AccessDecision, PageMetadata, Pagination, Permission, PermissionResolver, PermissionRouteTable,
    PermissionRoutes, Role, RoleMember, RoleMemberPage, RoleOverview, RouteConfig, UserId,
    ADMIN_ROLE, CUSTOMER_ROLE, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT,
};
pub use route_matcher::{match_route, normalize_path, PatternToken, RoutePattern};
pub use service::{PermissionService, PermissionServiceBuilder, DEFAULT_PERMISSION_TTL};
pub use sql_store::SqlRoleStore;
pub use store::{InMemoryRoleStore, RolePermissionStore};
