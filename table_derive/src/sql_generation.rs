//! SQL and code generation for the `TableMetadata` derive
//!
//! DDL is rendered while the macro expands, so the generated methods return
//! string literals.

use proc_macro2::TokenStream;
use quote::quote;
use syn::Ident;
use type_mapping::{is_optional_type, rust_type_to_pg_type};

use crate::parsing::{FieldInfo, TableInfo};

const TIMESTAMPTZ: &str = "TIMESTAMP WITH TIME ZONE";

fn primary_key_sql_type(field_info: &FieldInfo) -> &'static str {
    field_info
        .primary_key_column()
        .map(|c| rust_type_to_pg_type(&c.rust_type))
        .unwrap_or("VARCHAR")
}

/// `CREATE TABLE IF NOT EXISTS ...` for the model
pub fn create_table_sql(table_info: &TableInfo, field_info: &FieldInfo) -> String {
    let table = &table_info.name;
    let primary_key = field_info.primary_key_field.to_string();
    let mut definitions = Vec::new();

    for column in &field_info.columns {
        let pg_type = rust_type_to_pg_type(&column.rust_type);

        if column.name == primary_key {
            let default = match pg_type {
                "UUID" => " DEFAULT gen_random_uuid()",
                _ => "",
            };
            definitions.push(format!("{} {} PRIMARY KEY{}", column.name, pg_type, default));
        } else {
            let null = if is_optional_type(&column.rust_type) {
                ""
            } else {
                " NOT NULL"
            };
            let unique = if field_info.unique_fields.contains(&column.name) {
                " UNIQUE"
            } else {
                ""
            };
            definitions.push(format!("{} {}{}{}", column.name, pg_type, null, unique));
        }
    }

    if field_info.lifecycle_field.is_some() {
        definitions.push("is_active BOOLEAN NOT NULL DEFAULT TRUE".to_string());
        definitions.push(format!("deleted_at {}", TIMESTAMPTZ));
        definitions.push(format!("created_at {} NOT NULL DEFAULT NOW()", TIMESTAMPTZ));
        definitions.push(format!("updated_at {} NOT NULL DEFAULT NOW()", TIMESTAMPTZ));
        // Active rows carry no deletion time, deleted rows always do
        definitions.push(format!(
            "CONSTRAINT {}_lifecycle_check CHECK ((is_active AND deleted_at IS NULL) \
             OR (NOT is_active AND deleted_at IS NOT NULL))",
            table
        ));
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        table,
        definitions.join(", ")
    )
}

/// Indexes: `is_active` for soft-delete tables plus every `#[index(..)]`
pub fn create_indexes_sql(table_info: &TableInfo, field_info: &FieldInfo) -> Vec<String> {
    let table = &table_info.name;
    let mut indexes = Vec::new();

    if field_info.lifecycle_field.is_some() {
        indexes.push(format!(
            "CREATE INDEX IF NOT EXISTS idx_{}_is_active ON {} (is_active)",
            table, table
        ));
    }

    for columns in &table_info.composite_indexes {
        indexes.push(format!(
            "CREATE INDEX IF NOT EXISTS idx_{}_{} ON {} ({})",
            table,
            columns.join("_"),
            table,
            columns.join(", ")
        ));
    }

    indexes
}

pub fn generate_table_metadata_impl(
    name: &Ident,
    table_info: &TableInfo,
    field_info: &FieldInfo,
) -> TokenStream {
    let table_name = &table_info.name;
    let primary_key_field = &field_info.primary_key_field;
    let primary_key_name = primary_key_field.to_string();
    let primary_key_type = &field_info.primary_key_type;
    let primary_key_sql_type = primary_key_sql_type(field_info);

    let columns = field_info.column_names();
    let update_fields = &field_info.update_fields;
    let search_fields = &field_info.search_fields;
    let unique_fields = &field_info.unique_fields;

    let create_table_sql = create_table_sql(table_info, field_info);
    let create_indexes_sql = create_indexes_sql(table_info, field_info);

    let lifecycle_impl = match &field_info.lifecycle_field {
        Some(field) => quote! {
            fn supports_soft_delete() -> bool {
                true
            }

            fn lifecycle(&self) -> Option<&store_object::Lifecycle> {
                Some(&self.#field)
            }

            fn lifecycle_mut(&mut self) -> Option<&mut store_object::Lifecycle> {
                Some(&mut self.#field)
            }
        },
        None => quote! {},
    };

    quote! {
        impl store_object::TableMetadata for #name {
            type Id = #primary_key_type;

            fn table_name() -> &'static str {
                #table_name
            }

            fn primary_key_field() -> &'static str {
                #primary_key_name
            }

            fn primary_key_sql_type() -> &'static str {
                #primary_key_sql_type
            }

            fn extract_id(&self) -> Self::Id {
                ::std::clone::Clone::clone(&self.#primary_key_field)
            }

            fn columns() -> Vec<&'static str> {
                vec![#(#columns),*]
            }

            fn update_fields() -> Vec<&'static str> {
                vec![#(#update_fields),*]
            }

            fn search_fields() -> Vec<&'static str> {
                vec![#(#search_fields),*]
            }

            fn unique_fields() -> &'static [&'static str] {
                &[#(#unique_fields),*]
            }

            #lifecycle_impl

            fn create_table_sql() -> String {
                #create_table_sql.to_string()
            }

            fn create_indexes_sql() -> Vec<String> {
                vec![#(#create_indexes_sql.to_string()),*]
            }
        }
    }
}
