//! Trait definitions
//!
//! Static description of a model's table, generated by `#[model]`.

use crate::lifecycle::Lifecycle;
use crate::traits::core::TableRef;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;

/// Metadata about database table structure
///
/// Derive it through the `#[model]` attribute macro, which also adds the
/// serde derives the repositories need:
/// ```ignore
/// use softhaus::prelude::*;
///
/// #[model]
/// #[table(name = "posts")]
/// #[index(is_active, title)]
/// pub struct Post {
///     #[primary_key]
///     pub id: Uuid,
///
///     #[field(update, search)]
///     pub title: String,
///
///     #[lifecycle]
///     pub lifecycle: Lifecycle,
/// }
/// ```
pub trait TableMetadata:
    Clone + Send + Sync + Debug + Serialize + DeserializeOwned + 'static
{
    /// The type used for the primary key
    type Id: Clone + Send + Sync + Debug + PartialEq + Serialize + DeserializeOwned + 'static;

    /// The table name in the database
    fn table_name() -> &'static str;

    /// Get the primary key field name
    fn primary_key_field() -> &'static str;

    /// PostgreSQL type of the primary key column
    fn primary_key_sql_type() -> &'static str;

    /// Extract ID from model instance
    fn extract_id(&self) -> Self::Id;

    /// Every persisted column, lifecycle columns included
    fn columns() -> Vec<&'static str>;

    /// Columns written by an ordinary save
    fn update_fields() -> Vec<&'static str>;

    /// Columns matched by free-text search
    fn search_fields() -> Vec<&'static str> {
        vec![]
    }

    /// Columns declared `#[field(unique)]`
    fn unique_fields() -> &'static [&'static str] {
        &[]
    }

    /// Whether this entity carries lifecycle columns
    fn supports_soft_delete() -> bool {
        false
    }

    fn lifecycle(&self) -> Option<&Lifecycle> {
        None
    }

    fn lifecycle_mut(&mut self) -> Option<&mut Lifecycle> {
        None
    }

    /// Generate CREATE TABLE SQL statement
    fn create_table_sql() -> String;

    /// Generate CREATE INDEX SQL statements
    fn create_indexes_sql() -> Vec<String> {
        vec![]
    }

    /// Generate DROP TABLE SQL statement
    fn drop_table_sql() -> String {
        format!("DROP TABLE IF EXISTS {} CASCADE", Self::table_name())
    }

    fn table_ref() -> TableRef {
        TableRef::new(Self::table_name(), Self::primary_key_field())
            .with_unique(Self::unique_fields())
    }
}
