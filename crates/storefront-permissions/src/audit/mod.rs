//! Audit trail of authorization decisions

pub mod logger;
pub mod models;

pub use logger::AuditLogger;
pub use models::{AuditAction, AuditLogEntry};
