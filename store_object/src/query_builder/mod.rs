//! Query builder utilities
//!
//! Filters are plain data: the Postgres backend renders them to SQL through
//! [`SqlGenerator`], the memory backend evaluates them against JSON rows.

pub mod builder;
pub mod evaluate;
pub mod filter;
pub mod ordering;
pub mod sql_generation;


#[cfg(test)]
mod integration_tests;

pub use builder::QueryBuilder;
pub use filter::{LogicalOperator, QueryCondition, QueryFilter, QueryOperator};
pub use ordering::SortOrder;
pub use sql_generation::SqlGenerator;
