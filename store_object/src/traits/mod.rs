//! Traits for database operations
//!
//! This module contains all the traits that define the interface between
//! models, repositories and storage.

pub mod core;
pub mod soft_deletable;
pub mod table_metadata;

// Re-export all public items for convenience
pub use core::{StorageBackend, TableRef};
pub use soft_deletable::SoftDelete;
pub use table_metadata::TableMetadata;
