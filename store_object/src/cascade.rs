//! Cascading soft delete
//!
//! Dependents are declared up front per type ([`SoftDelete::dependents`]);
//! a delete walks them depth first, in declaration order, before stamping the
//! record itself. Only dependents that are still active are visited, so an
//! already-deleted subtree is never walked again.

use crate::clock::Clock;
use crate::errors::{id_label, StoreError};
use crate::lifecycle::{DELETED_AT, IS_ACTIVE, UPDATED_AT};
use crate::query_builder::{QueryBuilder, QueryFilter};
use crate::relation::{Cardinality, Relation};
use crate::repository::Repository;
use crate::scope::Scope;
use crate::traits::{SoftDelete, StorageBackend, TableMetadata};
use config::SoftDeleteConfig;
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A relation a delete of `P` cascades through
pub trait DependentRelation<P>: Send + Sync {
    fn name(&self) -> &'static str;

    /// Soft-delete every active record related to `parent`
    fn cascade<'a>(
        &'a self,
        parent: &'a P,
        cascade: &'a Cascade,
        depth: u32,
    ) -> BoxFuture<'a, Result<(), StoreError>>;
}

impl<P, C> DependentRelation<P> for Relation<P, C>
where
    P: TableMetadata,
    C: SoftDelete,
{
    fn name(&self) -> &'static str {
        Relation::name(self)
    }

    fn cascade<'a>(
        &'a self,
        parent: &'a P,
        cascade: &'a Cascade,
        depth: u32,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            let children = cascade.repository::<C>(Scope::Active);

            let targets: Vec<C> = match self.cardinality() {
                Cardinality::OneToOne => self.fetch_one(parent, &children).await?.into_iter().collect(),
                Cardinality::OneToMany | Cardinality::ManyToMany => {
                    self.fetch(parent, &children).await?
                }
            };

            tracing::debug!(
                table = P::table_name(),
                relation = self.name(),
                dependents = targets.len(),
                "cascading soft delete"
            );

            for child in targets {
                cascade.delete_record(child, depth).await?;
            }
            Ok(())
        })
    }
}

/// Ordered list of relations a delete of `P` cascades through
pub struct Dependents<P> {
    relations: Vec<Box<dyn DependentRelation<P>>>,
    _marker: PhantomData<fn() -> P>,
}

impl<P: TableMetadata> Default for Dependents<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for Dependents<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.relations.iter().map(|r| r.name()))
            .finish()
    }
}

impl<P: TableMetadata> Dependents<P> {
    pub fn new() -> Self {
        Self {
            relations: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Cascade deletes of `P` into `relation`'s targets
    pub fn cascade<C: SoftDelete>(mut self, relation: Relation<P, C>) -> Self {
        self.relations.push(Box::new(relation));
        self
    }

    /// Cascade through a hand-written dependent
    pub fn cascade_with(mut self, relation: impl DependentRelation<P> + 'static) -> Self {
        self.relations.push(Box::new(relation));
        self
    }

    /// Relation names in walk order
    pub fn names(&self) -> Vec<&'static str> {
        self.relations.iter().map(|r| r.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

/// State of one cascading delete
pub struct Cascade {
    backend: Arc<dyn StorageBackend>,
    clock: Arc<dyn Clock>,
    config: SoftDeleteConfig,
    visited: Mutex<HashSet<(&'static str, String)>>,
    stamped: AtomicUsize,
}

impl fmt::Debug for Cascade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cascade")
            .field("config", &self.config)
            .field("stamped", &self.stamped())
            .finish()
    }
}

impl Cascade {
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        clock: Arc<dyn Clock>,
        config: SoftDeleteConfig,
    ) -> Self {
        Self {
            backend,
            clock,
            config,
            visited: Mutex::new(HashSet::new()),
            stamped: AtomicUsize::new(0),
        }
    }

    /// Records flagged deleted so far
    pub fn stamped(&self) -> usize {
        self.stamped.load(Ordering::Relaxed)
    }

    pub(crate) fn repository<C: TableMetadata>(&self, scope: Scope) -> Repository<C> {
        Repository::new(
            Arc::clone(&self.backend),
            Arc::clone(&self.clock),
            self.config.clone(),
        )
        .with_scope(scope)
    }

    /// Returns false if this record was already entered during this cascade
    fn enter(&self, table: &'static str, id: &Value) -> bool {
        self.visited
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert((table, id.to_string()))
    }

    /// Soft-delete `record` and everything it owns
    pub fn delete_record<T: SoftDelete>(
        &self,
        record: T,
        depth: u32,
    ) -> BoxFuture<'_, Result<T, StoreError>> {
        Box::pin(async move {
            let is_active = match record.lifecycle() {
                Some(lifecycle) => lifecycle.is_active,
                None => {
                    return Err(StoreError::InvalidConfiguration {
                        message: format!(
                            "{} implements SoftDelete but has no #[lifecycle] field",
                            T::table_name()
                        ),
                    })
                }
            };

            let id = Repository::<T>::encode_id(&record.extract_id())?;

            if !is_active {
                tracing::debug!(
                    table = T::table_name(),
                    id = %id_label(&id),
                    "already deleted, skipping"
                );
                return Ok(record);
            }

            if depth > self.config.max_cascade_depth {
                return Err(StoreError::CascadeTooDeep {
                    table: T::table_name().to_string(),
                    max_depth: self.config.max_cascade_depth,
                });
            }

            if !self.enter(T::table_name(), &id) {
                return Ok(record);
            }

            for relation in &T::dependents().relations {
                relation.cascade(&record, self, depth + 1).await?;
            }

            self.stamp::<T>(id).await
        })
    }

    /// Flip the flag and set `deleted_at`, guarded so a record is stamped once
    async fn stamp<T: SoftDelete>(&self, id: Value) -> Result<T, StoreError> {
        let now = self.clock.now();
        let now_value = serde_json::to_value(now)
            .map_err(|e| StoreError::serialization(T::table_name(), e))?;

        let mut changes = Map::new();
        changes.insert(IS_ACTIVE.to_string(), Value::Bool(false));
        changes.insert(DELETED_AT.to_string(), now_value.clone());
        if self.config.touch_updated_at_on_delete {
            changes.insert(UPDATED_AT.to_string(), now_value);
        }

        let query = QueryBuilder::new()
            .filter(QueryFilter::eq(T::primary_key_field(), id.clone()))
            .filter(QueryFilter::eq(IS_ACTIVE, Value::Bool(true)));

        let mut rows = self
            .backend
            .update_where(&T::table_ref(), &query, changes)
            .await?;

        if let Some(row) = rows.pop() {
            self.stamped.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(table = T::table_name(), id = %id_label(&id), "soft deleted");
            return Repository::<T>::decode(row);
        }

        // Deleted (or removed) by someone else since we read it
        tracing::warn!(
            table = T::table_name(),
            id = %id_label(&id),
            "record was no longer active when stamping, reloading"
        );
        self.repository::<T>(Scope::IncludingDeleted)
            .find_by_id_value(id.clone())
            .await?
            .ok_or_else(|| StoreError::not_found(T::table_name(), &id))
    }
}
