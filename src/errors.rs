//! Error types for the SoftHaus crate

use config::ConfigError;
use store_object::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SoftHausError {
    #[error("Database connection error: {0}")]
    DatabaseConnection(#[from] sqlx::Error),

    #[error("Migration of '{table}' failed: {source}")]
    Migration {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("{0} needs a PostgreSQL connection, but this SoftHaus is in-memory")]
    NoDatabase(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
