use super::Repository;
use crate::errors::StoreError;
use crate::lifecycle::UPDATED_AT;
use crate::query_builder::{QueryBuilder, QueryFilter};
use crate::traits::TableMetadata;
use serde_json::{Map, Value};

impl<T: TableMetadata> Repository<T> {
    fn by_id(id: Value) -> QueryBuilder {
        QueryBuilder::new().filter(QueryFilter::eq(T::primary_key_field(), id))
    }

    /// Record with this primary key, if visible in the current scope
    pub async fn find_by_id(&self, id: &T::Id) -> Result<Option<T>, StoreError> {
        self.find_by_id_value(Self::encode_id(id)?).await
    }

    pub(crate) async fn find_by_id_value(&self, id: Value) -> Result<Option<T>, StoreError> {
        let query = self.scoped(Self::by_id(id)).limit(1);
        let mut rows = self.backend.select(&T::table_ref(), &query).await?;

        rows.pop().map(Self::decode).transpose()
    }

    /// Like [`find_by_id`](Self::find_by_id) but a missing record is [`StoreError::NotFound`]
    pub async fn get(&self, id: &T::Id) -> Result<T, StoreError> {
        match self.find_by_id(id).await? {
            Some(record) => Ok(record),
            None => Err(StoreError::not_found(T::table_name(), &Self::encode_id(id)?)),
        }
    }

    /// Find records matching query conditions
    pub async fn find(&self, query: QueryBuilder) -> Result<Vec<T>, StoreError> {
        let rows = self
            .backend
            .select(&T::table_ref(), &self.scoped(query))
            .await?;
        Self::decode_all(rows)
    }

    /// Find first record matching query conditions
    pub async fn find_one(&self, query: QueryBuilder) -> Result<Option<T>, StoreError> {
        let mut results = self.find(query.limit(1)).await?;
        Ok(results.pop())
    }

    /// Every record visible in the current scope, in natural order
    pub async fn list(&self) -> Result<Vec<T>, StoreError> {
        self.find(QueryBuilder::new()).await
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        self.count_where(QueryBuilder::new()).await
    }

    /// Count records matching query conditions
    pub async fn count_where(&self, query: QueryBuilder) -> Result<i64, StoreError> {
        self.backend
            .count(&T::table_ref(), &self.scoped(query.without_paging()))
            .await
    }

    /// Insert a new record. Lifecycle columns are reset: active, no
    /// `deleted_at`, `created_at = updated_at = now`.
    pub async fn create(&self, mut record: T) -> Result<T, StoreError> {
        if let Some(lifecycle) = record.lifecycle_mut() {
            lifecycle.mark_created(self.clock.now());
        }

        let row = self
            .backend
            .insert(&T::table_ref(), Self::encode(&record)?)
            .await?;

        tracing::debug!(table = T::table_name(), "created record");
        Self::decode(row)
    }

    /// Persist the model's update fields and refresh `updated_at`.
    ///
    /// `created_at` and the soft-delete columns are never written here. The
    /// record must be visible in the current scope.
    pub async fn save(&self, mut record: T) -> Result<T, StoreError> {
        if let Some(lifecycle) = record.lifecycle_mut() {
            lifecycle.touch(self.clock.now());
        }

        let id = Self::encode_id(&record.extract_id())?;
        let row = Self::encode(&record)?;

        let mut fields = T::update_fields();
        if T::supports_soft_delete() {
            fields.push(UPDATED_AT);
        }

        let changes: Map<String, Value> = fields
            .into_iter()
            .map(|field| (field.to_string(), row.get(field).cloned().unwrap_or(Value::Null)))
            .collect();

        if changes.is_empty() {
            return Err(StoreError::validation(
                T::table_name(),
                T::primary_key_field(),
                "model has no updatable fields",
            ));
        }

        let query = self.scoped(Self::by_id(id.clone()));
        let mut rows = self
            .backend
            .update_where(&T::table_ref(), &query, changes)
            .await?;

        match rows.pop() {
            Some(row) => Self::decode(row),
            None => Err(StoreError::not_found(T::table_name(), &id)),
        }
    }

    /// Physically remove the record. No scope, no cascade, irreversible.
    pub async fn hard_delete(&self, id: &T::Id) -> Result<bool, StoreError> {
        let id = Self::encode_id(id)?;
        let removed = self
            .backend
            .delete_where(&T::table_ref(), &Self::by_id(id.clone()))
            .await?;

        if removed > 0 {
            tracing::info!(
                table = T::table_name(),
                id = %crate::errors::id_label(&id),
                "hard deleted record"
            );
        }

        Ok(removed > 0)
    }
}
