//! SQL identifier quoting utilities
//!
//! Used wherever strata builds SQL from configured names, such as the version
//! table and code package schema.

/// Quote a SQL identifier.
///
/// Wraps the identifier in double quotes and doubles any embedded double
/// quotes.
///
/// # Examples
/// ```
/// use strata_core::sql_utils::quote_ident;
/// assert_eq!(quote_ident("schema_version"), r#""schema_version""#);
/// assert_eq!(quote_ident(r#"my"table"#), r#""my""table""#);
/// ```
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a potentially schema-qualified name (e.g. `public.schema_version`).
///
/// Each `.` separated component is quoted on its own.
///
/// # Examples
/// ```
/// use strata_core::sql_utils::quote_qualified;
/// assert_eq!(quote_qualified("schema_version"), r#""schema_version""#);
/// assert_eq!(quote_qualified("public.schema_version"), r#""public"."schema_version""#);
/// ```
pub fn quote_qualified(name: &str) -> String {
    name.split('.')
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(".")
}

/// Split a potentially schema-qualified name into `(schema, table)`.
///
/// Uses the last `.` as the separator. An unqualified name has no schema; the
/// database resolves it through its search path.
///
/// # Examples
/// ```
/// use strata_core::sql_utils::split_qualified_name;
/// assert_eq!(split_qualified_name("schema_version"), (None, "schema_version"));
/// assert_eq!(split_qualified_name("ops.schema_version"), (Some("ops"), "schema_version"));
/// ```
pub fn split_qualified_name(name: &str) -> (Option<&str>, &str) {
    match name.rfind('.') {
        Some(pos) => (Some(&name[..pos]), &name[pos + 1..]),
        None => (None, name),
    }
}

/// Escape a value for use inside a single-quoted SQL string literal.
pub fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}

/// Quote a value as a SQL string literal, including the surrounding quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", escape_sql_string(value))
}

#[cfg(test)]
#[path = "sql_utils_test.rs"]
mod tests;
