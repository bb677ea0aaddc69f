//! Lifecycle columns shared by every soft-delete capable record
//!
//! A model opts in by carrying a `#[lifecycle]` field of type [`Lifecycle`];
//! `#[model]` flattens it so the four columns sit next to the model's own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const IS_ACTIVE: &str = "is_active";
pub const DELETED_AT: &str = "deleted_at";
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

/// Column names in DDL order
pub const LIFECYCLE_COLUMNS: [&str; 4] = [IS_ACTIVE, DELETED_AT, CREATED_AT, UPDATED_AT];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifecycle {
    pub is_active: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Lifecycle {
    /// Active, never persisted. `Repository::create` stamps the timestamps.
    fn default() -> Self {
        Self {
            is_active: true,
            deleted_at: None,
            created_at: DateTime::<Utc>::default(),
            updated_at: DateTime::<Utc>::default(),
        }
    }
}

impl Lifecycle {
    /// Fresh lifecycle created at `now`
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            is_active: true,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_deleted(&self) -> bool {
        !self.is_active
    }

    pub(crate) fn mark_created(&mut self, now: DateTime<Utc>) {
        *self = Self::new(now);
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    /// Check the flag/timestamp invariants
    pub fn check(&self) -> Result<(), &'static str> {
        match (self.is_active, self.deleted_at) {
            (true, Some(_)) => return Err("active record must not have deleted_at"),
            (false, None) => return Err("deleted record must have deleted_at"),
            _ => {}
        }
        if self.updated_at < self.created_at {
            return Err("updated_at precedes created_at");
        }
        Ok(())
    }
}
