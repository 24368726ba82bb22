//! SQL identifier and literal quoting.
//!
//! Values always travel as bound parameters. These helpers cover the pieces
//! DuckDB cannot parameterize: table/column identifiers and the file paths
//! in `ATTACH` and `COPY ... TO`.

/// Quote a SQL identifier to prevent injection.
///
/// Wraps the identifier in double quotes and escapes any embedded double quotes
/// by doubling them, following the SQL standard.
///
/// # Examples
/// ```
/// use ll_core::sql_utils::quote_ident;
/// assert_eq!(quote_ident("payments"), r#""payments""#);
/// assert_eq!(quote_ident(r#"my"table"#), r#""my""table""#);
/// ```
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a potentially schema-qualified name (e.g. `schema.table`).
///
/// Splits on `.` and individually quotes each component.
///
/// # Examples
/// ```
/// use ll_core::sql_utils::quote_qualified;
/// assert_eq!(quote_qualified("payments"), r#""payments""#);
/// assert_eq!(quote_qualified("sales.payments"), r#""sales"."payments""#);
/// ```
pub fn quote_qualified(name: &str) -> String {
    name.split('.')
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(".")
}

/// Render a string as a single-quoted SQL literal, doubling embedded quotes.
///
/// # Examples
/// ```
/// use ll_core::sql_utils::quote_literal;
/// assert_eq!(quote_literal("/data/lake"), "'/data/lake'");
/// assert_eq!(quote_literal("it's"), "'it''s'");
/// ```
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
