//! PostgreSQL storage
//!
//! Rows cross the boundary as `jsonb`: writes go through
//! `jsonb_populate_record(NULL::table, $1)` so Postgres casts every column to
//! its declared type, reads come back as `to_jsonb(table.*)`.

use crate::errors::StoreError;
use crate::query_builder::{QueryBuilder, SqlGenerator};
use crate::relation::JoinTable;
use crate::traits::{StorageBackend, TableRef};
use crate::validation::{ValidatedFieldName, ValidatedTableName};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::PgPool;

/// Bind a JSON value with the closest Postgres type
macro_rules! bind_json_param {
    ($query:expr, $param:expr) => {
        match $param {
            Value::String(s) => {
                if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(&s) {
                    $query.bind(dt.with_timezone(&chrono::Utc))
                } else if let Ok(uuid) = uuid::Uuid::parse_str(&s) {
                    $query.bind(uuid)
                } else {
                    $query.bind(s)
                }
            }
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    if i >= i32::MIN as i64 && i <= i32::MAX as i64 {
                        $query.bind(i as i32)
                    } else {
                        $query.bind(i)
                    }
                } else if let Some(f) = n.as_f64() {
                    $query.bind(f)
                } else {
                    $query.bind(n.to_string())
                }
            }
            Value::Bool(b) => $query.bind(b),
            Value::Null => $query.bind(Option::<String>::None),
            other => $query.bind(other.to_string()),
        }
    };
}

#[derive(Debug, Clone)]
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn table_name(table: &TableRef) -> Result<ValidatedTableName, StoreError> {
        ValidatedTableName::new(table.name)
            .map_err(|e| StoreError::validation(table.name, "table", e.to_string()))
    }

    /// Every column a query mentions must be a plain identifier
    fn check_fields(table: &TableRef, query: &QueryBuilder) -> Result<(), StoreError> {
        for field in query.field_names() {
            ValidatedFieldName::new(field)
                .map_err(|e| StoreError::validation(table.name, field, e.to_string()))?;
        }
        Ok(())
    }

    fn join_names(
        join: &JoinTable,
    ) -> Result<(ValidatedTableName, ValidatedFieldName, ValidatedFieldName), StoreError> {
        let invalid = |field: &str, e: crate::validation::ValidationError| {
            StoreError::validation(join.table, field, e.to_string())
        };
        Ok((
            ValidatedTableName::new(join.table).map_err(|e| invalid("table", e))?,
            ValidatedFieldName::new(join.owner_column).map_err(|e| invalid(join.owner_column, e))?,
            ValidatedFieldName::new(join.target_column)
                .map_err(|e| invalid(join.target_column, e))?,
        ))
    }
}

#[async_trait]
impl StorageBackend for PgBackend {
    async fn insert(&self, table: &TableRef, row: Value) -> Result<Value, StoreError> {
        let name = Self::table_name(table)?;
        let id = row.get(table.primary_key).cloned().unwrap_or(Value::Null);

        let sql = format!(
            "INSERT INTO {name} SELECT * FROM jsonb_populate_record(NULL::{name}, $1) \
             RETURNING to_jsonb({name}.*)"
        );
        debug_log!("insert SQL: {}", sql);

        sqlx::query_scalar::<_, Value>(&sql)
            .bind(Json(row))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    StoreError::conflict(table.name, &id)
                }
                e => StoreError::database_operation(table.name, "insert", e),
            })
    }

    async fn select(
        &self,
        table: &TableRef,
        query: &QueryBuilder,
    ) -> Result<Vec<Value>, StoreError> {
        let name = Self::table_name(table)?;
        Self::check_fields(table, query)?;

        let (where_clause, order_clause, limit_clause, params) = query.build();
        let sql = format!(
            "SELECT to_jsonb({name}.*) FROM {name} {where_clause} {order_clause} {limit_clause}"
        );
        debug_log!("select SQL: {} params: {:?}", sql, params);

        let mut sql_query = sqlx::query_scalar::<_, Value>(&sql);
        for param in params {
            sql_query = bind_json_param!(sql_query, param);
        }

        sql_query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::database_operation(table.name, "select", e))
    }

    async fn count(&self, table: &TableRef, query: &QueryBuilder) -> Result<i64, StoreError> {
        let name = Self::table_name(table)?;
        Self::check_fields(table, query)?;

        let (where_clause, params) = query.build_where_clause();
        let sql = format!("SELECT COUNT(*) FROM {name} {where_clause}");
        debug_log!("count SQL: {} params: {:?}", sql, params);

        let mut sql_query = sqlx::query_scalar::<_, i64>(&sql);
        for param in params {
            sql_query = bind_json_param!(sql_query, param);
        }

        sql_query
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::database_operation(table.name, "count", e))
    }

    async fn update_where(
        &self,
        table: &TableRef,
        query: &QueryBuilder,
        changes: Map<String, Value>,
    ) -> Result<Vec<Value>, StoreError> {
        let name = Self::table_name(table)?;
        Self::check_fields(table, query)?;

        if changes.is_empty() {
            return Err(StoreError::validation(
                table.name,
                table.primary_key,
                "update needs at least one column",
            ));
        }

        let mut assignments = Vec::with_capacity(changes.len());
        for column in changes.keys() {
            let column = ValidatedFieldName::new(column)
                .map_err(|e| StoreError::validation(table.name, column, e.to_string()))?;
            assignments.push(format!(
                "{column} = (SELECT {column} FROM jsonb_populate_record(NULL::{name}, $1))"
            ));
        }

        // $1 carries the new values, filter params start at $2
        let (where_clause, params) = SqlGenerator::build_where_clause_from(query.conditions(), 2);
        let sql = format!(
            "UPDATE {name} SET {} {where_clause} RETURNING to_jsonb({name}.*)",
            assignments.join(", ")
        );
        debug_log!("update SQL: {} params: {:?}", sql, params);

        let mut sql_query = sqlx::query_scalar::<_, Value>(&sql).bind(Json(Value::Object(changes)));
        for param in params {
            sql_query = bind_json_param!(sql_query, param);
        }

        sql_query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    let constraint = db.constraint().unwrap_or(table.name).to_string();
                    StoreError::conflict(table.name, &Value::String(constraint))
                }
                e => StoreError::database_operation(table.name, "update", e),
            })
    }

    async fn delete_where(&self, table: &TableRef, query: &QueryBuilder) -> Result<u64, StoreError> {
        let name = Self::table_name(table)?;
        Self::check_fields(table, query)?;

        let (where_clause, params) = query.build_where_clause();
        let sql = format!("DELETE FROM {name} {where_clause}");
        debug_log!("delete SQL: {} params: {:?}", sql, params);

        let mut sql_query = sqlx::query(&sql);
        for param in params {
            sql_query = bind_json_param!(sql_query, param);
        }

        let result = sql_query
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::database_operation(table.name, "delete", e))?;

        Ok(result.rows_affected())
    }

    async fn linked(&self, join: &JoinTable, owner_id: &Value) -> Result<Vec<Value>, StoreError> {
        let (name, owner, target) = Self::join_names(join)?;
        let sql = format!("SELECT to_jsonb({target}) FROM {name} WHERE {owner} = $1");
        debug_log!("linked SQL: {}", sql);

        let sql_query = sqlx::query_scalar::<_, Value>(&sql);
        let sql_query = bind_json_param!(sql_query, owner_id.clone());

        sql_query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::database_operation(join.table, "linked", e))
    }

    async fn link(
        &self,
        join: &JoinTable,
        owner_id: &Value,
        target_id: &Value,
    ) -> Result<(), StoreError> {
        let (name, owner, target) = Self::join_names(join)?;
        let sql = format!(
            "INSERT INTO {name} ({owner}, {target}) VALUES ($1, $2) ON CONFLICT DO NOTHING"
        );
        debug_log!("link SQL: {}", sql);

        let sql_query = sqlx::query(&sql);
        let sql_query = bind_json_param!(sql_query, owner_id.clone());
        let sql_query = bind_json_param!(sql_query, target_id.clone());

        sql_query
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::database_operation(join.table, "link", e))?;
        Ok(())
    }

    async fn unlink(
        &self,
        join: &JoinTable,
        owner_id: &Value,
        target_id: &Value,
    ) -> Result<bool, StoreError> {
        let (name, owner, target) = Self::join_names(join)?;
        let sql = format!("DELETE FROM {name} WHERE {owner} = $1 AND {target} = $2");
        debug_log!("unlink SQL: {}", sql);

        let sql_query = sqlx::query(&sql);
        let sql_query = bind_json_param!(sql_query, owner_id.clone());
        let sql_query = bind_json_param!(sql_query, target_id.clone());

        let result = sql_query
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::database_operation(join.table, "unlink", e))?;

        Ok(result.rows_affected() > 0)
    }
}
