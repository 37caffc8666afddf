//! In-memory audit logger

use std::{
    collections::VecDeque,
    sync::{Arc, RwLock},
};

use super::models::AuditLogEntry;
use crate::{
    error::{Error, Result},
    permission::UserId,
};

/// Audit logger for authorization decisions.
///
/// With a capacity set, the oldest entries are dropped first.
#[derive(Debug, Clone, Default)]
pub struct AuditLogger {
    entries: Arc<RwLock<VecDeque<AuditLogEntry>>>,
    capacity: Option<usize>,
}

impl AuditLogger {
    /// Create an unbounded audit logger
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a logger that keeps at most `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity: Some(capacity),
        }
    }

    pub fn record(&self, entry: AuditLogEntry) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| Error::Internal(format!("Failed to acquire write lock: {}", e)))?;

        if let Some(capacity) = self.capacity {
            if capacity == 0 {
                return Ok(());
            }
            while entries.len() >= capacity {
                entries.pop_front();
            }
        }
        entries.push_back(entry);
        Ok(())
    }

    /// All entries, oldest first
    pub fn entries(&self) -> Result<Vec<AuditLogEntry>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| Error::Internal(format!("Failed to acquire read lock: {}", e)))?;
        Ok(entries.iter().cloned().collect())
    }

    pub fn entries_for_user(&self, user_id: UserId) -> Result<Vec<AuditLogEntry>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|entry| entry.user_id == Some(user_id))
            .collect())
    }

    pub fn len(&self) -> Result<usize> {
        let entries = self
            .entries
            .read()
            .map_err(|e| Error::Internal(format!("Failed to acquire read lock: {}", e)))?;
        Ok(entries.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn clear(&self) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| Error::Internal(format!("Failed to acquire write lock: {}", e)))?;
        entries.clear();
        Ok(())
    }
}
