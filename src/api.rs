//! Resource handlers for an HTTP layer
//!
//! A [`ViewSet`] turns repository calls into status codes and JSON bodies.
//! Routing and transport belong to whatever server embeds it.

use async_trait::async_trait;
use http::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::fmt::Debug;
use std::sync::Arc;
use store_object::{PageParams, Repository, SoftDelete, StoreError, TableMetadata};

/// Status plus optional JSON body
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Option<Value>,
}

impl ApiResponse {
    fn success(status: StatusCode, data: impl Serialize) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Self {
                status,
                body: Some(json!({ "success": true, "data": data })),
            },
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize response");
                Self::internal_error()
            }
        }
    }

    fn no_content() -> Self {
        Self {
            status: StatusCode::NO_CONTENT,
            body: None,
        }
    }

    fn error(status: StatusCode, message: impl Into<String>, error_code: &str) -> Self {
        Self {
            status,
            body: Some(json!({
                "success": false,
                "error": { "message": message.into(), "errorCode": error_code },
            })),
        }
    }

    fn internal_error() -> Self {
        Self::error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "An unexpected error occurred",
            "INTERNAL_SERVER_ERROR",
        )
    }

    /// Map a store error to its client-facing response
    pub fn from_error(error: &StoreError) -> Self {
        match error {
            StoreError::NotFound { .. } => {
                Self::error(StatusCode::NOT_FOUND, "Resource not found", "NOT_FOUND")
            }
            StoreError::Conflict { .. } => {
                Self::error(StatusCode::CONFLICT, "Resource already exists", "DUPLICATE")
            }
            StoreError::Validation { field, message, .. } => Self::error(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("{}: {}", field, message),
                "VALIDATION_ERROR",
            ),
            other => {
                tracing::error!(error = %other, "request failed");
                Self::internal_error()
            }
        }
    }

    /// Convert to an `http::Response` with a JSON body (empty for 204)
    pub fn into_http(self) -> Result<http::Response<String>, http::Error> {
        let builder = http::Response::builder().status(self.status);
        match self.body {
            Some(body) => builder
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(body.to_string()),
            None => builder.body(String::new()),
        }
    }
}

fn respond<R>(result: Result<R, StoreError>, on_success: impl FnOnce(R) -> ApiResponse) -> ApiResponse {
    match result {
        Ok(value) => on_success(value),
        Err(e) => ApiResponse::from_error(&e),
    }
}

/// Adjusts a record before a view set creates or saves it
#[async_trait]
pub trait WriteHook<T: TableMetadata>: Send + Sync + Debug {
    async fn prepare(&self, repository: &Repository<T>, record: T) -> Result<T, StoreError>;
}

/// CRUD handlers for one model
#[derive(Debug, Clone)]
pub struct ViewSet<T: TableMetadata> {
    repository: Repository<T>,
    hook: Option<Arc<dyn WriteHook<T>>>,
}

impl<T: TableMetadata> ViewSet<T> {
    pub fn new(repository: Repository<T>) -> Self {
        Self {
            repository,
            hook: None,
        }
    }

    /// Run `hook` on every record before it is created or updated
    pub fn with_hook(mut self, hook: impl WriteHook<T> + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    async fn prepare(&self, record: T) -> Result<T, StoreError> {
        match &self.hook {
            Some(hook) => hook.prepare(&self.repository, record).await,
            None => Ok(record),
        }
    }

    pub fn repository(&self) -> &Repository<T> {
        &self.repository
    }

    pub async fn retrieve(&self, id: &T::Id) -> ApiResponse {
        respond(self.repository.get(id).await, |record| {
            ApiResponse::success(StatusCode::OK, record)
        })
    }

    pub async fn list(&self, params: &PageParams) -> ApiResponse {
        respond(self.repository.paginate(params).await, |page| {
            ApiResponse::success(StatusCode::OK, page)
        })
    }

    pub async fn create(&self, record: T) -> ApiResponse {
        let result = match self.prepare(record).await {
            Ok(record) => self.repository.create(record).await,
            Err(e) => Err(e),
        };
        respond(result, |record| ApiResponse::success(StatusCode::CREATED, record))
    }

    /// Apply a partial update. Only the model's update fields are accepted,
    /// and at least one must be present.
    pub async fn update(&self, id: &T::Id, changes: Map<String, Value>) -> ApiResponse {
        respond(self.apply_changes(id, changes).await, |record| {
            ApiResponse::success(StatusCode::OK, record)
        })
    }

    async fn apply_changes(&self, id: &T::Id, changes: Map<String, Value>) -> Result<T, StoreError> {
        if changes.is_empty() {
            return Err(StoreError::validation(
                T::table_name(),
                "body",
                "At least one field must be provided for update",
            ));
        }

        let updatable = T::update_fields();
        if let Some(field) = changes.keys().find(|k| !updatable.contains(&k.as_str())) {
            return Err(StoreError::validation(
                T::table_name(),
                field,
                "field cannot be updated",
            ));
        }

        let record = self.repository.get(id).await?;
        let mut row = serde_json::to_value(&record)
            .map_err(|e| StoreError::serialization(T::table_name(), e))?;
        if let Value::Object(columns) = &mut row {
            columns.extend(changes);
        }

        let updated: T = serde_json::from_value(row).map_err(|e| {
            StoreError::validation(T::table_name(), "body", e.to_string())
        })?;
        let updated = self.prepare(updated).await?;
        self.repository.save(updated).await
    }
}

impl<T: SoftDelete> ViewSet<T> {
    /// Cascading soft delete; answers 204 with no body
    pub async fn destroy(&self, id: &T::Id) -> ApiResponse {
        respond(self.repository.delete_by_id(id).await, |_| {
            ApiResponse::no_content()
        })
    }
}
