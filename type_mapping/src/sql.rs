//! SQL type conversion utilities
//!
//! This module handles conversion between Rust types
//! and their SQL equivalents.

/// Strip whitespace so `Option < String >` and `Option<String>` match the same arm
pub fn normalize_type(rust_type: &str) -> String {
    rust_type.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Check if a Rust type is Optional (nullable in SQL)
pub fn is_optional_type(rust_type: &str) -> bool {
    let normalized = normalize_type(rust_type);
    normalized.starts_with("Option<") || normalized.starts_with("std::option::Option<")
}

/// Map Rust type names to PostgreSQL types for DDL generation
pub fn rust_type_to_pg_type(rust_type: &str) -> &'static str {
    let normalized = normalize_type(rust_type);
    let inner = unwrap_option(&normalized);

    match inner {
        "Uuid" | "uuid::Uuid" => "UUID",
        "String" => "VARCHAR",
        "i8" | "i16" => "SMALLINT",
        "i32" | "u16" => "INTEGER",
        "i64" | "u32" => "BIGINT",
        "u64" => "NUMERIC(20,0)",
        "f32" => "REAL",
        "f64" => "DOUBLE PRECISION",
        "bool" => "BOOLEAN",
        "DateTime<Utc>" | "chrono::DateTime<chrono::Utc>" | "chrono::DateTime<Utc>" => {
            "TIMESTAMP WITH TIME ZONE"
        }
        "NaiveDateTime" | "chrono::NaiveDateTime" => "TIMESTAMP",
        "NaiveDate" | "chrono::NaiveDate" => "DATE",
        "serde_json::Value" | "Value" => "JSONB",
        "Vec<String>" => "TEXT[]",
        _ => "VARCHAR",
    }
}

fn unwrap_option(normalized: &str) -> &str {
    for prefix in ["std::option::Option<", "Option<"] {
        if let Some(rest) = normalized.strip_prefix(prefix) {
            return rest.strip_suffix('>').unwrap_or(rest);
        }
    }
    normalized
}
