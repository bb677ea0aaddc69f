//! Store Object - soft-delete data layer core
//!
//! Models describe themselves through [`TableMetadata`]; [`Repository`]
//! reads and writes them through a [`StorageBackend`], filtering by
//! [`Scope`] and cascading soft deletes along declared [`Relation`]s.

// Crate-local copies of the feature-gated logging macros
#[cfg(feature = "debug-logging")]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

// Generated code names paths as `store_object::...`
extern crate self as store_object;

pub mod backend;
pub mod cascade;
pub mod clock;
pub mod errors;
pub mod lifecycle;
pub mod prelude;
pub mod query_builder;
pub mod relation;
pub mod repository;
pub mod scope;
pub mod traits;
pub mod validation;

pub use backend::{MemoryBackend, PgBackend};
pub use cascade::{Cascade, DependentRelation, Dependents};
pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::StoreError;
pub use lifecycle::Lifecycle;
pub use query_builder::{QueryBuilder, QueryFilter, QueryOperator, SortOrder};
pub use relation::{Cardinality, JoinTable, Relation};
pub use repository::{Page, PageMeta, PageParams, Repository};
pub use scope::Scope;
pub use traits::*;
pub use validation::{ValidatedFieldName, ValidatedTableName, ValidationError};

use sqlx::PgPool;

pub type DbPool = PgPool;
