//! Trait definitions
//!
//! The storage seam. Repositories talk to storage only through
//! [`StorageBackend`], with rows carried as JSON objects keyed by column name.

use crate::errors::StoreError;
use crate::query_builder::QueryBuilder;
use crate::relation::JoinTable;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt::Debug;

/// Table name, primary key column and the other unique columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub name: &'static str,
    pub primary_key: &'static str,
    pub unique: &'static [&'static str],
}

impl TableRef {
    pub const fn new(name: &'static str, primary_key: &'static str) -> Self {
        Self {
            name,
            primary_key,
            unique: &[],
        }
    }

    /// Columns besides the primary key that no two rows may share
    pub const fn with_unique(self, unique: &'static [&'static str]) -> Self {
        Self { unique, ..self }
    }
}

#[async_trait]
pub trait StorageBackend: Send + Sync + Debug {
    /// Insert a full row and return it as stored.
    /// A duplicate primary key or unique column is a [`StoreError::Conflict`].
    async fn insert(&self, table: &TableRef, row: Value) -> Result<Value, StoreError>;

    /// Rows matching the query's filters, ordered and paged as requested.
    /// Without ordering, rows come back in the backend's natural order.
    async fn select(&self, table: &TableRef, query: &QueryBuilder)
        -> Result<Vec<Value>, StoreError>;

    /// Number of rows matching the query's filters
    async fn count(&self, table: &TableRef, query: &QueryBuilder) -> Result<i64, StoreError>;

    /// Write exactly the columns in `changes` on every matching row; other
    /// columns are left untouched. Returns the updated rows. Writing a value
    /// another row holds in a unique column is a [`StoreError::Conflict`].
    async fn update_where(
        &self,
        table: &TableRef,
        query: &QueryBuilder,
        changes: Map<String, Value>,
    ) -> Result<Vec<Value>, StoreError>;

    /// Physically delete matching rows, returning how many were removed
    async fn delete_where(&self, table: &TableRef, query: &QueryBuilder) -> Result<u64, StoreError>;

    /// Target ids linked to `owner_id` through a join table
    async fn linked(&self, join: &JoinTable, owner_id: &Value) -> Result<Vec<Value>, StoreError>;

    /// Link two records; linking an existing pair is a no-op
    async fn link(
        &self,
        join: &JoinTable,
        owner_id: &Value,
        target_id: &Value,
    ) -> Result<(), StoreError>;

    /// Remove a link, returning whether it existed
    async fn unlink(
        &self,
        join: &JoinTable,
        owner_id: &Value,
        target_id: &Value,
    ) -> Result<bool, StoreError>;
}
