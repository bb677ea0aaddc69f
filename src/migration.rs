//! Database migration functionality
//!
//! Creates model tables, their indexes and many-to-many join tables from the
//! DDL generated by `#[model]`.

use crate::core::SoftHaus;
use crate::errors::SoftHausError;
use store_object::{JoinTable, TableMetadata};

impl SoftHaus {
    fn require_pool(&self, operation: &'static str) -> Result<&sqlx::PgPool, SoftHausError> {
        self.pool().ok_or(SoftHausError::NoDatabase(operation))
    }

    async fn execute_ddl(&self, table: &str, sql: &str) -> Result<(), SoftHausError> {
        let pool = self.require_pool("auto_migrate")?;
        debug_log!("migration SQL: {}", sql);
        sqlx::query(sql)
            .execute(pool)
            .await
            .map_err(|source| SoftHausError::Migration {
                table: table.to_string(),
                source,
            })?;
        Ok(())
    }

    /// Create the table and indexes for a model.
    /// If `recreate` is true, drops the existing table first.
    pub async fn auto_migrate<T: TableMetadata>(&self, recreate: bool) -> Result<(), SoftHausError> {
        let table_name = T::table_name();

        if recreate {
            tracing::warn!(table = table_name, "dropping table before migration");
            self.execute_ddl(table_name, &T::drop_table_sql()).await?;
        }

        self.execute_ddl(table_name, &T::create_table_sql()).await?;

        for index_sql in T::create_indexes_sql() {
            self.execute_ddl(table_name, &index_sql).await?;
        }

        tracing::info!(table = table_name, "table migrated");
        Ok(())
    }

    /// Create the join table linking `O` to `T`; both tables must exist
    pub async fn migrate_join_table<O, T>(&self, join: &JoinTable) -> Result<(), SoftHausError>
    where
        O: TableMetadata,
        T: TableMetadata,
    {
        let sql = join.create_table_sql::<O, T>()?;
        self.execute_ddl(join.table, &sql).await?;
        tracing::info!(table = join.table, "join table migrated");
        Ok(())
    }
}
