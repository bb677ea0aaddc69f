//! In-process storage
//!
//! Tables are vectors of JSON rows kept in insertion order, which is the
//! natural retrieval order for unordered queries.

use crate::errors::{id_label, StoreError};
use crate::query_builder::QueryBuilder;
use crate::relation::JoinTable;
use crate::traits::{StorageBackend, TableRef};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct MemoryState {
    tables: HashMap<&'static str, Vec<Value>>,
    /// Join rows keyed by join table name, each row keyed by column name
    links: HashMap<&'static str, Vec<Map<String, Value>>>,
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: RwLock<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw rows of a table, bypassing any scope
    pub async fn rows(&self, table: &str) -> Vec<Value> {
        self.state
            .read()
            .await
            .tables
            .get(table)
            .cloned()
            .unwrap_or_default()
    }
}

fn link_row(join: &JoinTable, owner_id: &Value, target_id: &Value) -> Map<String, Value> {
    let mut row = Map::new();
    row.insert(join.owner_column.to_string(), owner_id.clone());
    row.insert(join.target_column.to_string(), target_id.clone());
    row
}

/// Conflict when `row` would share a unique column value with one of `others`
fn check_unique<'a>(
    table: &TableRef,
    row: &Map<String, Value>,
    mut others: impl Iterator<Item = &'a Value>,
) -> Result<(), StoreError> {
    let clash = others.find_map(|other| {
        table.unique.iter().find(|column| match row.get(**column) {
            Some(value) if !value.is_null() => other.get(**column) == Some(value),
            _ => false,
        })
    });

    match clash {
        Some(column) => {
            let value = row.get(*column).map(id_label).unwrap_or_default();
            Err(StoreError::conflict(
                table.name,
                &Value::String(format!("{}={}", column, value)),
            ))
        }
        None => Ok(()),
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn insert(&self, table: &TableRef, row: Value) -> Result<Value, StoreError> {
        let id = match row.get(table.primary_key) {
            Some(id) if row.is_object() && !id.is_null() => id.clone(),
            _ => {
                return Err(StoreError::validation(
                    table.name,
                    table.primary_key,
                    "row must be an object with a primary key",
                ))
            }
        };

        let mut state = self.state.write().await;
        let rows = state.tables.entry(table.name).or_default();

        if rows.iter().any(|existing| existing.get(table.primary_key) == Some(&id)) {
            return Err(StoreError::conflict(table.name, &id));
        }
        if let Value::Object(columns) = &row {
            check_unique(table, columns, rows.iter())?;
        }

        rows.push(row.clone());
        Ok(row)
    }

    async fn select(
        &self,
        table: &TableRef,
        query: &QueryBuilder,
    ) -> Result<Vec<Value>, StoreError> {
        let state = self.state.read().await;
        let rows = state.tables.get(table.name).cloned().unwrap_or_default();
        Ok(query.apply(rows))
    }

    async fn count(&self, table: &TableRef, query: &QueryBuilder) -> Result<i64, StoreError> {
        let state = self.state.read().await;
        let count = state
            .tables
            .get(table.name)
            .map(|rows| rows.iter().filter(|row| query.matches(row)).count())
            .unwrap_or(0);
        Ok(count as i64)
    }

    async fn update_where(
        &self,
        table: &TableRef,
        query: &QueryBuilder,
        changes: Map<String, Value>,
    ) -> Result<Vec<Value>, StoreError> {
        if changes.is_empty() {
            return Err(StoreError::validation(
                table.name,
                table.primary_key,
                "update needs at least one column",
            ));
        }

        let mut state = self.state.write().await;
        let Some(rows) = state.tables.get_mut(table.name) else {
            return Ok(Vec::new());
        };

        let (matched, unmatched): (Vec<&Value>, Vec<&Value>) =
            rows.iter().partition(|row| query.matches(row));
        if matched.len() > 1 {
            // The same unique value written to several rows collides with itself
            check_unique(table, &changes, std::iter::once(&Value::Object(changes.clone())))?;
        }
        check_unique(table, &changes, unmatched.into_iter())?;

        let mut updated = Vec::new();
        for row in rows.iter_mut().filter(|row| query.matches(row)) {
            if let Value::Object(columns) = row {
                for (column, value) in &changes {
                    columns.insert(column.clone(), value.clone());
                }
            }
            updated.push(row.clone());
        }

        Ok(updated)
    }

    async fn delete_where(&self, table: &TableRef, query: &QueryBuilder) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        let Some(rows) = state.tables.get_mut(table.name) else {
            return Ok(0);
        };

        let before = rows.len();
        rows.retain(|row| !query.matches(row));
        Ok((before - rows.len()) as u64)
    }

    async fn linked(&self, join: &JoinTable, owner_id: &Value) -> Result<Vec<Value>, StoreError> {
        let state = self.state.read().await;
        let ids = state
            .links
            .get(join.table)
            .map(|links| {
                links
                    .iter()
                    .filter(|link| link.get(join.owner_column) == Some(owner_id))
                    .filter_map(|link| link.get(join.target_column).cloned())
                    .collect()
            })
            .unwrap_or_default();
        Ok(ids)
    }

    async fn link(
        &self,
        join: &JoinTable,
        owner_id: &Value,
        target_id: &Value,
    ) -> Result<(), StoreError> {
        let row = link_row(join, owner_id, target_id);
        let mut state = self.state.write().await;
        let links = state.links.entry(join.table).or_default();
        if !links.contains(&row) {
            links.push(row);
        }
        Ok(())
    }

    async fn unlink(
        &self,
        join: &JoinTable,
        owner_id: &Value,
        target_id: &Value,
    ) -> Result<bool, StoreError> {
        let row = link_row(join, owner_id, target_id);
        let mut state = self.state.write().await;
        let Some(links) = state.links.get_mut(join.table) else {
            return Ok(false);
        };

        let before = links.len();
        links.retain(|link| link != &row);
        Ok(links.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_builder::QueryFilter;
    use serde_json::json;

    const POSTS: TableRef = TableRef::new("posts", "id");
    const POST_TAGS: JoinTable = JoinTable::new("post_tags", "post_id", "tag_id");

    #[tokio::test]
    async fn test_insert_rejects_duplicate_primary_key() {
        let backend = MemoryBackend::new();
        backend.insert(&POSTS, json!({"id": 1, "title": "a"})).await.unwrap();

        let err = backend
            .insert(&POSTS, json!({"id": 1, "title": "b"}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        assert_eq!(backend.rows("posts").await.len(), 1);
    }

    #[tokio::test]
    async fn test_insert_requires_primary_key() {
        let backend = MemoryBackend::new();
        let err = backend.insert(&POSTS, json!({"title": "a"})).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_update_where_touches_only_named_columns() {
        let backend = MemoryBackend::new();
        backend
            .insert(&POSTS, json!({"id": 1, "title": "a", "is_active": true}))
            .await
            .unwrap();
        backend
            .insert(&POSTS, json!({"id": 2, "title": "b", "is_active": true}))
            .await
            .unwrap();

        let mut changes = Map::new();
        changes.insert("is_active".to_string(), json!(false));
        let query = QueryBuilder::new().filter(QueryFilter::eq("id", json!(2)));

        let updated = backend.update_where(&POSTS, &query, changes).await.unwrap();
        assert_eq!(updated, vec![json!({"id": 2, "title": "b", "is_active": false})]);

        let rows = backend.rows("posts").await;
        assert_eq!(rows[0]["is_active"], json!(true));
        assert_eq!(rows[1]["title"], json!("b"));
    }

    #[tokio::test]
    async fn test_unique_columns_conflict() {
        const TAGS: TableRef = TableRef::new("tags", "id").with_unique(&["name"]);
        let backend = MemoryBackend::new();
        backend.insert(&TAGS, json!({"id": 1, "name": "rust"})).await.unwrap();
        backend.insert(&TAGS, json!({"id": 2, "name": "sql"})).await.unwrap();

        let err = backend
            .insert(&TAGS, json!({"id": 3, "name": "rust"}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { ref id, .. } if id == "name=rust"));

        let rename = |name: &str| {
            let mut changes = Map::new();
            changes.insert("name".to_string(), json!(name));
            changes
        };
        let second = QueryBuilder::new().filter(QueryFilter::eq("id", json!(2)));
        let err = backend
            .update_where(&TAGS, &second, rename("rust"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        assert_eq!(backend.rows("tags").await[1]["name"], json!("sql"));

        // Rewriting a row's own value is fine
        backend.update_where(&TAGS, &second, rename("sql")).await.unwrap();

        let every = QueryBuilder::new();
        assert!(backend.update_where(&TAGS, &every, rename("go")).await.is_err());
        assert_eq!(backend.count(&TAGS, &every).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete_where_counts_removed_rows() {
        let backend = MemoryBackend::new();
        for id in 1..=3 {
            backend.insert(&POSTS, json!({"id": id})).await.unwrap();
        }

        let query = QueryBuilder::new().filter(QueryFilter::gte("id", json!(2)));
        assert_eq!(backend.delete_where(&POSTS, &query).await.unwrap(), 2);
        assert_eq!(backend.count(&POSTS, &QueryBuilder::new()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_links_are_visible_from_both_sides() {
        let backend = MemoryBackend::new();
        backend.link(&POST_TAGS, &json!("p1"), &json!("t1")).await.unwrap();
        backend.link(&POST_TAGS, &json!("p1"), &json!("t1")).await.unwrap();
        backend.link(&POST_TAGS, &json!("p2"), &json!("t1")).await.unwrap();

        assert_eq!(
            backend.linked(&POST_TAGS, &json!("p1")).await.unwrap(),
            vec![json!("t1")]
        );
        assert_eq!(
            backend.linked(&POST_TAGS.reversed(), &json!("t1")).await.unwrap(),
            vec![json!("p1"), json!("p2")]
        );

        assert!(backend.unlink(&POST_TAGS, &json!("p1"), &json!("t1")).await.unwrap());
        assert!(!backend.unlink(&POST_TAGS, &json!("p1"), &json!("t1")).await.unwrap());
    }
}
