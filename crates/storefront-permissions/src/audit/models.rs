//! Audit log data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::permission::{AccessDecision, UserId};

/// Outcome recorded for a guarded request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    /// The user held the required permission
    Allowed,
    /// The user lacked the required permission
    Denied,
    /// The admin role skipped the check
    Bypassed,
    /// No user was attached to the request
    Unauthenticated,
}

impl AuditAction {
    /// Map a decision to an audit action; public routes are not audited
    pub fn from_decision(decision: &AccessDecision) -> Option<Self> {
        match decision {
            AccessDecision::Public => None,
            AccessDecision::Unauthenticated { .. } => Some(AuditAction::Unauthenticated),
            AccessDecision::AdminBypass { .. } => Some(AuditAction::Bypassed),
            AccessDecision::Granted { .. } => Some(AuditAction::Allowed),
            AccessDecision::Denied { .. } => Some(AuditAction::Denied),
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditAction::Allowed => write!(f, "allowed"),
            AuditAction::Denied => write!(f, "denied"),
            AuditAction::Bypassed => write!(f, "bypassed"),
            AuditAction::Unauthenticated => write!(f, "unauthenticated"),
        }
    }
}

/// Entry in the audit log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Unique identifier for this log entry
    pub id: String,
    /// Timestamp of the decision
    pub timestamp: DateTime<Utc>,
    /// Authenticated user, if any
    pub user_id: Option<UserId>,
    pub method: String,
    pub path: String,
    /// Permission guarding the route
    pub required_permission: String,
    pub action: AuditAction,
}

impl AuditLogEntry {
    /// Create a new audit log entry
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        required_permission: impl Into<String>,
        action: AuditAction,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            user_id: None,
            method: method.into(),
            path: path.into(),
            required_permission: required_permission.into(),
            action,
        }
    }

    /// Attach the requesting user
    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }
}
