//! # SoftHaus
//!
//! A soft-delete data layer for PostgreSQL: records are flagged instead of
//! removed, deletes cascade along declared relationships, and repositories
//! hide deleted rows unless asked for them.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use softhaus::prelude::*;
//!
//! #[model]
//! #[table(name = "articles")]
//! pub struct Article {
//!     #[primary_key]
//!     pub id: Uuid,
//!
//!     #[field(update, search)]
//!     pub title: String,
//!
//!     #[lifecycle]
//!     pub lifecycle: Lifecycle,
//! }
//!
//! impl SoftDelete for Article {}
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let softhaus = SoftHaus::connect(&config).await?;
//!     softhaus.auto_migrate::<Article>(false).await?;
//!
//!     let articles = softhaus.repository::<Article>();
//!     let article = articles
//!         .create(Article {
//!             id: Uuid::new_v4(),
//!             title: "Hello".to_string(),
//!             lifecycle: Lifecycle::default(),
//!         })
//!         .await?;
//!
//!     articles.delete(article.clone()).await?;
//!     assert!(articles.find_by_id(&article.id).await?.is_none());
//!     assert!(articles.including_deleted().find_by_id(&article.id).await?.is_some());
//!
//!     Ok(())
//! }
//! ```

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

pub mod api;
pub mod blog;
pub mod core;
pub mod errors;
pub mod migration;
pub mod prelude;

// Re-export the main public types for convenience
pub use api::{ApiResponse, ViewSet, WriteHook};
pub use core::SoftHaus;
pub use errors::SoftHausError;

pub use config::{AppConfig, DatabaseConfig, SoftDeleteConfig};

// Re-export internal crates used by macros and public API
// These MUST be public for the generated macro code to work correctly
pub use store_object;
pub use table_derive;
pub use type_mapping;

// Re-export external dependencies used in public API
pub use async_trait;
pub use sqlx;
