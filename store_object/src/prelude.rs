//! Convenience re-exports for common store-object usage

pub use crate::traits::{SoftDelete, StorageBackend, TableMetadata, TableRef};

pub use crate::errors::StoreError;

pub use crate::backend::{MemoryBackend, PgBackend};
pub use crate::cascade::Dependents;
pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::lifecycle::Lifecycle;
pub use crate::relation::{Cardinality, JoinTable, Relation};
pub use crate::repository::{Page, PageMeta, PageParams, Repository};
pub use crate::scope::Scope;

pub use crate::query_builder::{QueryBuilder, QueryFilter, SortOrder};

// Common external dependencies that are frequently used
pub use async_trait::async_trait;
pub use serde::{Deserialize, Serialize};
pub use sqlx::PgPool;
pub use uuid::Uuid;
