//! Route table, role/permission records and access decisions

pub mod config;
pub mod models;
pub mod resolver;

pub use config::{PermissionRouteTable, PermissionRoutes, RouteConfig};
pub use models::{
    role_rank, PageMetadata, Pagination, Permission, Role, RoleMember, RoleMemberPage,
    RoleOverview, UserId, ADMIN_ROLE, CUSTOMER_ROLE, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT,
};
pub use resolver::{AccessDecision, PermissionResolver};
