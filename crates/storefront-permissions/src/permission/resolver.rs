//! Request-to-permission resolution and access decisions

use std::{fmt, sync::Arc};

use serde::Serialize;

use crate::permission::{config::PermissionRouteTable, models::ADMIN_ROLE};

/// Outcome of authorizing a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AccessDecision {
    /// No permission guards the route
    Public,
    /// The route is guarded and no user is attached to the request
    Unauthenticated { required: String },
    /// The user holds the admin role
    AdminBypass { required: String },
    /// The user holds the required permission
    Granted { required: String },
    /// The user lacks the required permission
    Denied { required: String },
}

impl AccessDecision {
    /// Whether the request may proceed
    pub fn is_allowed(&self) -> bool {
        matches!(
            self,
            AccessDecision::Public | AccessDecision::AdminBypass { .. } | AccessDecision::Granted { .. }
        )
    }

    /// The permission guarding the route, if any
    pub fn required_permission(&self) -> Option<&str> {
        match self {
            AccessDecision::Public => None,
            AccessDecision::Unauthenticated { required }
            | AccessDecision::AdminBypass { required }
            | AccessDecision::Granted { required }
            | AccessDecision::Denied { required } => Some(required),
        }
    }
}

impl fmt::Display for AccessDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessDecision::Public => write!(f, "public"),
            AccessDecision::Unauthenticated { required } => {
                write!(f, "unauthenticated ({})", required)
            }
            AccessDecision::AdminBypass { required } => write!(f, "admin bypass ({})", required),
            AccessDecision::Granted { required } => write!(f, "granted ({})", required),
            AccessDecision::Denied { required } => write!(f, "denied ({})", required),
        }
    }
}

/// Resolves the permission a request requires from the route table
#[derive(Debug, Clone)]
pub struct PermissionResolver {
    table: Arc<PermissionRouteTable>,
}

impl PermissionResolver {
    pub fn new(table: Arc<PermissionRouteTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &PermissionRouteTable {
        &self.table
    }

    /// First permission, in table order, with a route matching the request.
    ///
    /// `None` means the route is public.
    pub fn required_permission(&self, method: &str, path: &str) -> Option<&str> {
        self.table
            .iter()
            .find(|entry| entry.matches(method, path))
            .map(|entry| entry.name())
    }

    /// Whether any of the role names is the admin role
    pub fn is_admin<S: AsRef<str>>(roles: &[S]) -> bool {
        roles.iter().any(|role| role.as_ref() == ADMIN_ROLE)
    }

    /// Grant or deny based on an exact, case-sensitive membership test
    pub fn check_permission<S: AsRef<str>>(required: &str, permissions: &[S]) -> AccessDecision {
        let required_owned = required.to_string();
        if permissions.iter().any(|p| p.as_ref() == required) {
            AccessDecision::Granted {
                required: required_owned,
            }
        } else {
            AccessDecision::Denied {
                required: required_owned,
            }
        }
    }
}
