use super::Repository;
use crate::cascade::Cascade;
use crate::errors::StoreError;
use crate::scope::Scope;
use crate::traits::SoftDelete;
use std::sync::Arc;

impl<T: SoftDelete> Repository<T> {
    /// Soft-delete `record` and, depth first, every active dependent it owns.
    ///
    /// The record is re-read first, so the walk starts from what is stored
    /// rather than from the caller's copy. Deleting a record that is already
    /// inactive there is a no-op that returns the stored row. A failure part way through leaves the already stamped dependents
    /// deleted; wrap the call in a transaction if that matters.
    pub async fn delete(&self, record: T) -> Result<T, StoreError> {
        let cascade = Cascade::new(
            Arc::clone(&self.backend),
            Arc::clone(&self.clock),
            self.config.clone(),
        );

        let id = Self::encode_id(&record.extract_id())?;
        let current = self
            .with_scope(Scope::IncludingDeleted)
            .find_by_id_value(id.clone())
            .await?
            .ok_or_else(|| StoreError::not_found(T::table_name(), &id))?;

        let deleted = cascade.delete_record(current, 0).await?;

        if cascade.stamped() > 0 {
            tracing::info!(
                table = T::table_name(),
                records = cascade.stamped(),
                "soft delete completed"
            );
        }

        Ok(deleted)
    }

    /// Resolve `id` in the current scope, then [`delete`](Self::delete) it
    pub async fn delete_by_id(&self, id: &T::Id) -> Result<T, StoreError> {
        let record = self.get(id).await?;
        self.delete(record).await
    }
}
