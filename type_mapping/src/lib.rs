//! Type mapping between Rust field types and PostgreSQL column types
//!
//! Used by `table-derive` when generating DDL for `#[model]` structs.

pub mod sql;

pub use sql::{is_optional_type, normalize_type, rust_type_to_pg_type};
