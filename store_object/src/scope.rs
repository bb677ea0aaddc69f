//! Visibility scopes for repository reads

use crate::lifecycle::{Lifecycle, IS_ACTIVE};
use crate::query_builder::{QueryBuilder, QueryFilter};
use crate::traits::TableMetadata;
use serde_json::Value;

/// Which records a repository can see
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    /// `is_active = true` only
    #[default]
    Active,
    /// Every record regardless of the flag
    IncludingDeleted,
    /// `is_active = false` only
    OnlyDeleted,
}

impl Scope {
    /// Visibility filter for `T`, if any.
    ///
    /// Types without lifecycle columns are never deleted: `Active` and
    /// `IncludingDeleted` see everything, `OnlyDeleted` sees nothing.
    pub fn filter<T: TableMetadata>(self) -> Option<QueryFilter> {
        if !T::supports_soft_delete() {
            return match self {
                Scope::OnlyDeleted => Some(QueryFilter::in_values(T::primary_key_field(), vec![])),
                Scope::Active | Scope::IncludingDeleted => None,
            };
        }

        match self {
            Scope::Active => Some(QueryFilter::eq(IS_ACTIVE, Value::Bool(true))),
            Scope::IncludingDeleted => None,
            Scope::OnlyDeleted => Some(QueryFilter::eq(IS_ACTIVE, Value::Bool(false))),
        }
    }

    /// Add this scope's filter to `query`
    pub fn apply<T: TableMetadata>(self, query: QueryBuilder) -> QueryBuilder {
        match self.filter::<T>() {
            Some(filter) => query.filter(filter),
            None => query,
        }
    }

    /// Whether a record with this lifecycle is visible in the scope
    pub fn admits(self, lifecycle: Option<&Lifecycle>) -> bool {
        match (self, lifecycle) {
            (Scope::IncludingDeleted, _) => true,
            (Scope::Active, None) => true,
            (Scope::OnlyDeleted, None) => false,
            (Scope::Active, Some(lifecycle)) => lifecycle.is_active,
            (Scope::OnlyDeleted, Some(lifecycle)) => !lifecycle.is_active,
        }
    }
}
