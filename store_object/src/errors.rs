use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error on '{table}' during {operation}: {source}")]
    DatabaseOperation {
        table: String,
        operation: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Storage error on '{table}' during {operation}: {message}")]
    Storage {
        table: String,
        operation: String,
        message: String,
    },

    #[error("Serialization error for '{table}': {source}")]
    Serialization {
        table: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Record not found in '{table}': {id}")]
    NotFound { table: String, id: String },

    #[error("Record already exists in '{table}': {id}")]
    Conflict { table: String, id: String },

    #[error("Validation error on '{table}.{field}': {message}")]
    Validation {
        table: String,
        field: String,
        message: String,
    },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Cascade starting at '{table}' exceeded the maximum depth of {max_depth}")]
    CascadeTooDeep { table: String, max_depth: u32 },
}

impl StoreError {
    pub fn database_operation(table: &str, operation: &str, source: sqlx::Error) -> Self {
        Self::DatabaseOperation {
            table: table.to_string(),
            operation: operation.to_string(),
            source,
        }
    }

    pub fn storage(table: &str, operation: &str, message: impl Into<String>) -> Self {
        Self::Storage {
            table: table.to_string(),
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    pub fn serialization(table: &str, source: serde_json::Error) -> Self {
        Self::Serialization {
            table: table.to_string(),
            source,
        }
    }

    pub fn not_found(table: &str, id: &Value) -> Self {
        Self::NotFound {
            table: table.to_string(),
            id: id_label(id),
        }
    }

    pub fn conflict(table: &str, id: &Value) -> Self {
        Self::Conflict {
            table: table.to_string(),
            id: id_label(id),
        }
    }

    pub fn validation(table: &str, field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            table: table.to_string(),
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Render a primary key for messages: strings without JSON quotes
pub(crate) fn id_label(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
