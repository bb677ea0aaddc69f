//! Core SoftHaus functionality
//!
//! [`SoftHaus`] owns the storage backend, the clock and the soft-delete
//! settings, and hands out repositories that share them.

use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use store_object::{
    Clock, MemoryBackend, PgBackend, Repository, StorageBackend, SystemClock, TableMetadata,
};

use crate::errors::SoftHausError;
use config::{AppConfig, DatabaseConfig, SoftDeleteConfig};

/// Entry point: storage, clock and soft-delete settings
#[derive(Debug, Clone)]
pub struct SoftHaus {
    backend: Arc<dyn StorageBackend>,
    pool: Option<PgPool>,
    clock: Arc<dyn Clock>,
    config: SoftDeleteConfig,
}

impl SoftHaus {
    /// Connect to PostgreSQL with the pool settings from `config.database`
    pub async fn connect(config: &AppConfig) -> Result<Self, SoftHausError> {
        let pool = Self::connect_pool(&config.database).await?;
        tracing::info!(
            host = %config.database.host,
            database = %config.database.database,
            "connected to PostgreSQL"
        );
        Ok(Self::from_pool(pool, config.soft_delete.clone()))
    }

    async fn connect_pool(config: &DatabaseConfig) -> Result<PgPool, SoftHausError> {
        let mut pool_options = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds));

        if config.max_lifetime_seconds > 0 {
            pool_options =
                pool_options.max_lifetime(Duration::from_secs(config.max_lifetime_seconds));
        }

        Ok(pool_options.connect(&config.connection_string()).await?)
    }

    /// Use an existing pool
    pub fn from_pool(pool: PgPool, config: SoftDeleteConfig) -> Self {
        Self {
            backend: Arc::new(PgBackend::new(pool.clone())),
            pool: Some(pool),
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Keep everything in process memory
    pub fn in_memory(config: SoftDeleteConfig) -> Self {
        Self::with_backend(Arc::new(MemoryBackend::new()), config)
    }

    /// Any storage backend; migrations are unavailable without a pool
    pub fn with_backend(backend: Arc<dyn StorageBackend>, config: SoftDeleteConfig) -> Self {
        Self {
            backend,
            pool: None,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Replace the timestamp source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Repository for `T` in the default (active-only) scope
    pub fn repository<T: TableMetadata>(&self) -> Repository<T> {
        Repository::new(
            Arc::clone(&self.backend),
            Arc::clone(&self.clock),
            self.config.clone(),
        )
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    /// PostgreSQL pool, if connected
    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn config(&self) -> &SoftDeleteConfig {
        &self.config
    }

    /// Check database connection health; always healthy in memory
    pub async fn health_check(&self) -> Result<(), SoftHausError> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").fetch_one(pool).await?;
        }
        Ok(())
    }
}
