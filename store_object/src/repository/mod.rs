//! Scoped repositories
//!
//! A [`Repository`] binds a model type to a storage backend, a clock and a
//! visibility [`Scope`]. Every read goes through the scope; the escape hatches
//! are explicit (`including_deleted()`, `only_deleted()`).

mod crud;
mod pagination;
mod soft_delete;

pub use pagination::{Page, PageMeta, PageParams};

use crate::clock::Clock;
use crate::errors::StoreError;
use crate::query_builder::QueryBuilder;
use crate::scope::Scope;
use crate::traits::{StorageBackend, TableMetadata};
use config::SoftDeleteConfig;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

pub struct Repository<T: TableMetadata> {
    pub(crate) backend: Arc<dyn StorageBackend>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) config: SoftDeleteConfig,
    pub(crate) scope: Scope,
    pub(crate) _phantom: PhantomData<fn() -> T>,
}

impl<T: TableMetadata> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            clock: Arc::clone(&self.clock),
            config: self.config.clone(),
            scope: self.scope,
            _phantom: PhantomData,
        }
    }
}

impl<T: TableMetadata> std::fmt::Debug for Repository<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("table", &T::table_name())
            .field("scope", &self.scope)
            .field("backend", &self.backend)
            .field("config", &self.config)
            .finish()
    }
}

impl<T: TableMetadata> Repository<T> {
    /// Repository in the default (`Active`) scope
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        clock: Arc<dyn Clock>,
        config: SoftDeleteConfig,
    ) -> Self {
        Self {
            backend,
            clock,
            config,
            scope: Scope::Active,
            _phantom: PhantomData,
        }
    }

    /// Same backend, clock and config, different scope
    pub fn with_scope(&self, scope: Scope) -> Self {
        Self {
            scope,
            ..self.clone()
        }
    }

    /// Only records with `is_active = true`
    pub fn active(&self) -> Self {
        self.with_scope(Scope::Active)
    }

    /// Every record, deleted or not
    pub fn including_deleted(&self) -> Self {
        self.with_scope(Scope::IncludingDeleted)
    }

    /// Only soft-deleted records
    pub fn only_deleted(&self) -> Self {
        self.with_scope(Scope::OnlyDeleted)
    }

    /// Repository for another model sharing this one's backend, clock and config
    pub fn sibling<U: TableMetadata>(&self, scope: Scope) -> Repository<U> {
        Repository {
            backend: Arc::clone(&self.backend),
            clock: Arc::clone(&self.clock),
            config: self.config.clone(),
            scope,
            _phantom: PhantomData,
        }
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn config(&self) -> &SoftDeleteConfig {
        &self.config
    }

    /// `query` restricted to this repository's scope
    pub(crate) fn scoped(&self, query: QueryBuilder) -> QueryBuilder {
        self.scope.apply::<T>(query)
    }

    pub(crate) fn encode(record: &T) -> Result<Value, StoreError> {
        serde_json::to_value(record).map_err(|e| StoreError::serialization(T::table_name(), e))
    }

    pub(crate) fn decode(row: Value) -> Result<T, StoreError> {
        serde_json::from_value(row).map_err(|e| StoreError::serialization(T::table_name(), e))
    }

    pub(crate) fn decode_all(rows: Vec<Value>) -> Result<Vec<T>, StoreError> {
        rows.into_iter().map(Self::decode).collect()
    }

    pub(crate) fn encode_id(id: &T::Id) -> Result<Value, StoreError> {
        serde_json::to_value(id).map_err(|e| StoreError::serialization(T::table_name(), e))
    }
}
