//! Convenience re-exports for common SoftHaus usage
//!
//! ```rust
//! use softhaus::prelude::*;
//! ```

pub use crate::api::{ApiResponse, ViewSet, WriteHook};
pub use crate::core::SoftHaus;
pub use crate::errors::SoftHausError;

pub use config::{AppConfig, DatabaseConfig, SoftDeleteConfig};

pub use store_object::prelude::*;

// Re-export store_object module for macro-generated code
pub use store_object;

// Re-export table derive for model creation
pub use table_derive::{TableMetadata, model};

// Common external dependencies
pub use anyhow;
pub use async_trait;
pub use sqlx;
pub use tokio;
