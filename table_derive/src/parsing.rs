//! Parsing utilities for table and field attributes
//!
//! Reads `#[table]`, `#[index]`, `#[primary_key]`, `#[field]` and
//! `#[lifecycle]` into [`TableInfo`] / [`FieldInfo`], validating every
//! identifier that will end up in generated SQL.

use quote::quote;
use syn::{
    parse::Parse, parse::ParseStream, Attribute, Data, Error, Fields, Ident, Meta, Result, Token,
};

/// Columns contributed by a `#[lifecycle]` field, in table order
pub const LIFECYCLE_COLUMNS: [&str; 4] = ["is_active", "deleted_at", "created_at", "updated_at"];

/// Validate table name and return syn::Error for better proc macro error handling
pub fn validate_table_name_syn(name: &str, span: proc_macro2::Span) -> Result<()> {
    validate_identifier(name)
        .map_err(|e| Error::new(span, format!("Invalid table name '{}': {}", name, e)))
}

/// Validate field name and return syn::Error for better proc macro error handling
pub fn validate_field_name_syn(name: &str, span: proc_macro2::Span) -> Result<()> {
    validate_identifier(name)
        .map_err(|e| Error::new(span, format!("Invalid field name '{}': {}", name, e)))
}

/// Same rules as `store_object::validation`, applied at compile time
fn validate_identifier(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("Name cannot be empty".to_string());
    }

    if name.len() > 63 {
        return Err(format!(
            "Name '{}' is too long: {} characters (max 63)",
            name,
            name.len()
        ));
    }

    let first_char = name
        .chars()
        .next()
        .ok_or_else(|| "Name cannot be empty".to_string())?;
    if !(first_char.is_ascii_alphabetic() || first_char == '_') {
        return Err(format!(
            "Name '{}' must start with a letter or underscore",
            name
        ));
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!("Name '{}' contains invalid characters: only alphanumeric characters and underscores are allowed", name));
    }

    if is_reserved_keyword(name) {
        return Err(format!("Name '{}' is a reserved SQL keyword", name));
    }

    Ok(())
}

fn is_reserved_keyword(name: &str) -> bool {
    const RESERVED_KEYWORDS: &[&str] = &[
        "SELECT", "INSERT", "UPDATE", "DELETE", "FROM", "WHERE", "JOIN", "INNER", "LEFT",
        "RIGHT", "FULL", "OUTER", "ON", "AS", "AND", "OR", "NOT", "NULL", "TRUE", "FALSE",
        "CASE", "WHEN", "THEN", "ELSE", "END", "IF", "EXISTS", "IN", "LIKE", "BETWEEN",
        "ORDER", "BY", "GROUP", "HAVING", "LIMIT", "OFFSET", "UNION", "ALL", "DISTINCT",
        "CREATE", "DROP", "ALTER", "TABLE", "INDEX", "VIEW", "DATABASE", "SCHEMA", "PRIMARY",
        "KEY", "FOREIGN", "REFERENCES", "UNIQUE", "CHECK", "DEFAULT", "CONSTRAINT", "COLUMN",
        "ADD", "RENAME", "TO",
        // PostgreSQL
        "SERIAL", "BIGSERIAL", "SMALLSERIAL", "TEXT", "VARCHAR", "CHAR", "INTEGER", "BIGINT",
        "SMALLINT", "DECIMAL", "NUMERIC", "REAL", "DOUBLE", "PRECISION", "BOOLEAN", "DATE",
        "TIME", "TIMESTAMP", "TIMESTAMPTZ", "INTERVAL", "UUID", "JSON", "JSONB", "ARRAY",
        "RETURNING", "CONFLICT", "NOTHING", "EXCLUDED", "GENERATED", "ALWAYS", "STORED",
        "IDENTITY", "SEQUENCE",
    ];

    RESERVED_KEYWORDS.contains(&name.to_ascii_uppercase().as_str())
}

#[derive(Debug)]
struct FieldOperations {
    operations: Vec<Ident>,
}

impl Parse for FieldOperations {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut operations = Vec::new();

        while !input.is_empty() {
            let op: Ident = input.parse()?;
            operations.push(op);

            if input.peek(Token![,]) {
                let _: Token![,] = input.parse()?;
            }
        }

        Ok(FieldOperations { operations })
    }
}

#[derive(Debug)]
pub struct TableInfo {
    pub name: String,
    /// `#[index(col_a, col_b)]` on the struct
    pub composite_indexes: Vec<Vec<String>>,
}

#[derive(Debug)]
pub struct ColumnInfo {
    pub name: String,
    /// Whitespace-free Rust type, as written
    pub rust_type: String,
}

#[derive(Debug)]
pub struct FieldInfo {
    pub primary_key_field: Ident,
    pub primary_key_type: proc_macro2::TokenStream,
    /// Plain columns in declaration order, primary key included
    pub columns: Vec<ColumnInfo>,
    pub update_fields: Vec<String>,
    pub search_fields: Vec<String>,
    /// Columns declared `#[field(unique)]`
    pub unique_fields: Vec<String>,
    pub lifecycle_field: Option<Ident>,
}

impl FieldInfo {
    pub fn primary_key_column(&self) -> Option<&ColumnInfo> {
        let name = self.primary_key_field.to_string();
        self.columns.iter().find(|c| c.name == name)
    }

    /// Every column name, lifecycle columns last
    pub fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.columns.iter().map(|c| c.name.clone()).collect();
        if self.lifecycle_field.is_some() {
            names.extend(LIFECYCLE_COLUMNS.iter().map(|c| c.to_string()));
        }
        names
    }
}

pub fn parse_table_attributes(attrs: &[Attribute]) -> Result<TableInfo> {
    let mut table_name = None;
    let mut composite_indexes = Vec::new();

    for attr in attrs {
        if attr.path().is_ident("table") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value: syn::LitStr = meta.value()?.parse()?;
                    validate_table_name_syn(&value.value(), value.span())?;
                    table_name = Some(value.value());
                    Ok(())
                } else {
                    Err(meta.error("unsupported table attribute, expected `name = \"...\"`"))
                }
            })?;
        } else if attr.path().is_ident("index") {
            if let Meta::List(meta_list) = &attr.meta {
                composite_indexes.push(parse_field_list(&meta_list.tokens)?);
            } else {
                return Err(Error::new_spanned(attr, "expected #[index(column, ...)]"));
            }
        }
    }

    let name = table_name.ok_or_else(|| {
        Error::new(
            proc_macro2::Span::call_site(),
            "table attribute is required: add #[table(name = \"table_name\")] to your struct",
        )
    })?;

    Ok(TableInfo {
        name,
        composite_indexes,
    })
}

/// Parse a list of field names from tokens like (field1, field2, field3)
fn parse_field_list(tokens: &proc_macro2::TokenStream) -> Result<Vec<String>> {
    let mut fields = Vec::new();
    let mut tokens_iter = tokens.clone().into_iter().peekable();

    while let Some(token) = tokens_iter.next() {
        if let proc_macro2::TokenTree::Ident(ident) = token {
            fields.push(ident.to_string());
        }

        if let Some(proc_macro2::TokenTree::Punct(punct)) = tokens_iter.peek() {
            if punct.as_char() == ',' {
                tokens_iter.next();
            }
        }
    }

    if fields.is_empty() {
        return Err(Error::new(
            proc_macro2::Span::call_site(),
            "index attribute requires at least one column name",
        ));
    }

    Ok(fields)
}

pub fn parse_field_attributes(data: &Data, table_info: &TableInfo) -> Result<FieldInfo> {
    let fields_named = match data {
        Data::Struct(data_struct) => match &data_struct.fields {
            Fields::Named(fields_named) => fields_named,
            _ => {
                return Err(Error::new(
                    proc_macro2::Span::call_site(),
                    "TableMetadata can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new(
                proc_macro2::Span::call_site(),
                "TableMetadata can only be derived for structs with named fields",
            ))
        }
    };

    let mut primary_key = None;
    let mut columns = Vec::new();
    let mut update_fields = Vec::new();
    let mut search_fields = Vec::new();
    let mut unique_fields = Vec::new();
    let mut lifecycle_field: Option<Ident> = None;

    for field in &fields_named.named {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new_spanned(field, "Field must have a name"))?;
        let field_name_str = field_name.to_string();

        if has_attribute(&field.attrs, "lifecycle") {
            if lifecycle_field.is_some() {
                return Err(Error::new_spanned(
                    field_name,
                    "only one #[lifecycle] field is allowed",
                ));
            }
            lifecycle_field = Some(field_name.clone());
            continue;
        }

        validate_field_name_syn(&field_name_str, field_name.span())?;

        let ty = &field.ty;
        columns.push(ColumnInfo {
            name: field_name_str.clone(),
            rust_type: quote!(#ty).to_string().replace(' ', ""),
        });

        if has_attribute(&field.attrs, "primary_key") {
            if primary_key.is_some() {
                return Err(Error::new_spanned(
                    field_name,
                    "only one #[primary_key] field is allowed",
                ));
            }
            primary_key = Some((field_name.clone(), quote!(#ty)));
        }

        if let Some(operations) = parse_field_operations(&field.attrs)? {
            for op in operations {
                match op.to_string().as_str() {
                    "update" => update_fields.push(field_name_str.clone()),
                    "search" => search_fields.push(field_name_str.clone()),
                    "unique" => unique_fields.push(field_name_str.clone()),
                    "readonly" => {}
                    other => {
                        return Err(Error::new_spanned(
                            &op,
                            format!(
                                "unknown field option '{}', expected update, search, unique or readonly",
                                other
                            ),
                        ))
                    }
                }
            }
        }
    }

    let (primary_key_field, primary_key_type) = primary_key.ok_or_else(|| {
        Error::new(
            proc_macro2::Span::call_site(),
            "a #[primary_key] field is required",
        )
    })?;

    if update_fields.contains(&primary_key_field.to_string()) {
        return Err(Error::new_spanned(
            &primary_key_field,
            "the primary key cannot be an update field",
        ));
    }

    if lifecycle_field.is_some() {
        if let Some(clash) = columns
            .iter()
            .find(|c| LIFECYCLE_COLUMNS.contains(&c.name.as_str()))
        {
            return Err(Error::new(
                proc_macro2::Span::call_site(),
                format!(
                    "field '{}' collides with a column of the #[lifecycle] field",
                    clash.name
                ),
            ));
        }
    }

    let info = FieldInfo {
        primary_key_field,
        primary_key_type,
        columns,
        update_fields,
        search_fields,
        unique_fields,
        lifecycle_field,
    };

    let known = info.column_names();
    for index in &table_info.composite_indexes {
        for column in index {
            if !known.contains(column) {
                return Err(Error::new(
                    proc_macro2::Span::call_site(),
                    format!("#[index] names unknown column '{}'", column),
                ));
            }
        }
    }

    Ok(info)
}

pub fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}

/// Options of the `#[field(...)]` attribute; a bare `#[field]` means `update`
pub fn parse_field_operations(attrs: &[Attribute]) -> Result<Option<Vec<Ident>>> {
    for attr in attrs {
        if attr.path().is_ident("field") {
            return match &attr.meta {
                Meta::List(meta_list) => {
                    let field_ops = meta_list.parse_args::<FieldOperations>()?;
                    Ok(Some(field_ops.operations))
                }
                Meta::Path(path) => Ok(Some(vec![Ident::new("update", path_span(path))])),
                Meta::NameValue(_) => Err(Error::new_spanned(
                    attr,
                    "expected #[field] or #[field(update, search)]",
                )),
            };
        }
    }

    Ok(None)
}

fn path_span(path: &syn::Path) -> proc_macro2::Span {
    path.segments
        .first()
        .map(|s| s.ident.span())
        .unwrap_or_else(proc_macro2::Span::call_site)
}
