//! SQL identifier validation
//!
//! Table and column names are interpolated into generated SQL, so every one
//! passes through [`ValidatedTableName`] or [`ValidatedFieldName`] first.

use std::fmt;
use thiserror::Error;

/// Validation errors for database identifiers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid characters in name '{0}': only alphanumeric characters and underscores are allowed")]
    InvalidCharacters(String),
    /// PostgreSQL caps identifiers at 63 bytes
    #[error("Name '{name}' is too long: {length} characters (max {max_length})")]
    TooLong {
        name: String,
        length: usize,
        max_length: usize,
    },
    #[error("Name cannot be empty")]
    Empty,
    #[error("Name '{0}' must start with a letter or underscore")]
    InvalidStartCharacter(String),
    #[error("Name '{0}' is a reserved SQL keyword")]
    ReservedKeyword(String),
}

/// A validated table name that is safe to use in SQL queries
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedTableName(String);

impl ValidatedTableName {
    /// PostgreSQL identifier length limit
    const MAX_LENGTH: usize = 63;

    pub fn new(name: &str) -> Result<Self, ValidationError> {
        Self::validate_identifier(name)?;
        Ok(Self(name.to_string()))
    }

    /// Get the validated name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shared rules for every SQL identifier
    fn validate_identifier(name: &str) -> Result<(), ValidationError> {
        if name.is_empty() {
            return Err(ValidationError::Empty);
        }

        if name.len() > Self::MAX_LENGTH {
            return Err(ValidationError::TooLong {
                name: name.to_string(),
                length: name.len(),
                max_length: Self::MAX_LENGTH,
            });
        }

        let first_char = name.chars().next().ok_or(ValidationError::Empty)?;
        if !(first_char.is_ascii_alphabetic() || first_char == '_') {
            return Err(ValidationError::InvalidStartCharacter(name.to_string()));
        }

        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ValidationError::InvalidCharacters(name.to_string()));
        }

        if Self::is_reserved_keyword(name) {
            return Err(ValidationError::ReservedKeyword(name.to_string()));
        }

        Ok(())
    }

    /// Check if a name is a reserved SQL keyword
    fn is_reserved_keyword(name: &str) -> bool {
        const RESERVED_KEYWORDS: &[&str] = &[
            "ALL", "ALTER", "AND", "AS", "BETWEEN", "BY", "CASE", "CHECK", "COLUMN",
            "CONSTRAINT", "CREATE", "DEFAULT", "DELETE", "DISTINCT", "DROP", "ELSE",
            "END", "EXISTS", "FALSE", "FOREIGN", "FROM", "GROUP", "HAVING", "IN",
            "INDEX", "INSERT", "JOIN", "KEY", "LIKE", "LIMIT", "NOT", "NULL",
            "OFFSET", "ON", "OR", "ORDER", "PRIMARY", "REFERENCES", "RETURNING",
            "SELECT", "TABLE", "THEN", "TRUE", "UNION", "UNIQUE", "UPDATE", "USER",
            "WHEN", "WHERE",
        ];

        RESERVED_KEYWORDS.contains(&name.to_ascii_uppercase().as_str())
    }
}

impl fmt::Display for ValidatedTableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated field name that is safe to use in SQL queries
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedFieldName(String);

impl ValidatedFieldName {
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        ValidatedTableName::validate_identifier(name)?;
        Ok(Self(name.to_string()))
    }

    /// Get the validated name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ValidatedFieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_table_names() {
        let valid_names = [
            "posts",
            "post_tags",
            "BlogPosts",
            "_archive",
            "comments2",
            "a",
            &"a".repeat(63),
        ];

        for name in valid_names {
            assert!(
                ValidatedTableName::new(name).is_ok(),
                "Should accept valid name: {}",
                name
            );
        }
    }

    #[test]
    fn test_invalid_table_names() {
        let test_cases = [
            ("", ValidationError::Empty),
            (
                "2posts",
                ValidationError::InvalidStartCharacter("2posts".to_string()),
            ),
            (
                "post-tags",
                ValidationError::InvalidCharacters("post-tags".to_string()),
            ),
            (
                "posts; DROP TABLE posts",
                ValidationError::InvalidCharacters("posts; DROP TABLE posts".to_string()),
            ),
            (
                "SELECT",
                ValidationError::ReservedKeyword("SELECT".to_string()),
            ),
            (
                "order",
                ValidationError::ReservedKeyword("order".to_string()),
            ),
        ];

        for (name, expected_error) in test_cases {
            let result = ValidatedTableName::new(name);
            assert_eq!(result.unwrap_err(), expected_error, "name: {}", name);
        }
    }

    #[test]
    fn test_too_long_name() {
        match ValidatedTableName::new(&"a".repeat(64)).unwrap_err() {
            ValidationError::TooLong {
                length, max_length, ..
            } => {
                assert_eq!(length, 64);
                assert_eq!(max_length, 63);
            }
            other => panic!("Expected TooLong error, got {:?}", other),
        }
    }

    #[test]
    fn test_lifecycle_columns_are_valid_fields() {
        for column in crate::lifecycle::LIFECYCLE_COLUMNS {
            assert!(ValidatedFieldName::new(column).is_ok(), "{}", column);
        }
        assert!(ValidatedFieldName::new("post_id").is_ok());
        assert!(ValidatedFieldName::new("user id").is_err());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ValidationError::ReservedKeyword("table".to_string()).to_string(),
            "Name 'table' is a reserved SQL keyword"
        );
        assert_eq!(ValidationError::Empty.to_string(), "Name cannot be empty");
    }

    #[test]
    fn test_display_traits() {
        assert_eq!(ValidatedTableName::new("posts").unwrap().to_string(), "posts");
        assert_eq!(ValidatedFieldName::new("id").unwrap().as_str(), "id");
    }
}
