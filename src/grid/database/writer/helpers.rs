// src/grid/database/writer/helpers.rs
// Helper functions for SQL generation and parameter preparation

use super::super::values::json_to_sql;
use crate::grid::definitions::{CellValue, RowValues};
use rusqlite::types::Value;

/// Quote a SQL identifier by wrapping it in double quotes.
/// Embedded double quotes are doubled, so any name is safe to splice into SQL.
///
/// # Example
/// ```text
/// quote_identifier("User Name")  => "\"User Name\""
/// quote_identifier("a\"b")       => "\"a\"\"b\""
/// ```
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `"schema"."table"`
pub fn quote_qualified(schema_name: &str, table_name: &str) -> String {
    format!("{}.{}", quote_identifier(schema_name), quote_identifier(table_name))
}

/// Build a comma-separated list of quoted column names.
///
/// # Example
/// ```text
/// quote_column_list(&["Name", "Age"])  => "\"Name\", \"Age\""
/// ```
pub fn quote_column_list(columns: &[String]) -> String {
    columns
        .iter()
        .map(|name| quote_identifier(name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build a string of SQL placeholders (?, ?, ?, ...).
pub fn build_placeholders(count: usize) -> String {
    (0..count).map(|_| "?").collect::<Vec<_>>().join(", ")
}

/// `RETURNING *`, with `rowid` in front when the table is addressed by rowid.
pub fn returning_clause(with_rowid: bool) -> &'static str {
    if with_rowid {
        "RETURNING rowid, *"
    } else {
        "RETURNING *"
    }
}

/// Build an INSERT statement. No columns means `DEFAULT VALUES`.
///
/// # Example
/// ```text
/// build_insert_sql("main", "Users", &["Name", "Age"], "RETURNING *")
///   => INSERT INTO "main"."Users" ("Name", "Age") VALUES (?, ?) RETURNING *
/// ```
pub fn build_insert_sql(schema_name: &str, table_name: &str, columns: &[String], returning: &str) -> String {
    let target = quote_qualified(schema_name, table_name);
    if columns.is_empty() {
        return format!("INSERT INTO {} DEFAULT VALUES {}", target, returning);
    }
    format!(
        "INSERT INTO {} ({}) VALUES ({}) {}",
        target,
        quote_column_list(columns),
        build_placeholders(columns.len()),
        returning
    )
}

/// Build an UPDATE statement setting several columns.
///
/// # Example
/// ```text
/// build_update_sql("main", "Users", &["Name"], "\"id\" = ?", "RETURNING *")
///   => UPDATE "main"."Users" SET "Name" = ? WHERE "id" = ? RETURNING *
/// ```
pub fn build_update_sql(
    schema_name: &str,
    table_name: &str,
    columns: &[String],
    where_clause: &str,
    returning: &str,
) -> String {
    let assignments = columns
        .iter()
        .map(|c| format!("{} = ?", quote_identifier(c)))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "UPDATE {} SET {} WHERE {} {}",
        quote_qualified(schema_name, table_name),
        assignments,
        where_clause,
        returning
    )
}

/// Build a DELETE statement.
pub fn build_delete_sql(schema_name: &str, table_name: &str, where_clause: &str) -> String {
    format!(
        "DELETE FROM {} WHERE {}",
        quote_qualified(schema_name, table_name),
        where_clause
    )
}

/// Equality conditions joined with AND. NULL keys compare with `IS NULL` and bind nothing.
///
/// # Example
/// ```text
/// {"a": 1, "b": null}  => ("\"a\" = ? AND \"b\" IS NULL", [Integer(1)])
/// ```
pub fn build_where_clause(conditions: &RowValues) -> (String, Vec<Value>) {
    let mut params = Vec::new();
    let clause = conditions
        .iter()
        .map(|(column, value)| {
            if value.is_null() {
                format!("{} IS NULL", quote_identifier(column))
            } else {
                params.push(json_to_sql(value));
                format!("{} = ?", quote_identifier(column))
            }
        })
        .collect::<Vec<_>>()
        .join(" AND ");
    (clause, params)
}

/// Splits a value map into its column names and bound parameters, in the same order.
pub fn split_values(values: &RowValues) -> (Vec<String>, Vec<Value>) {
    values
        .iter()
        .map(|(column, value): (&String, &CellValue)| (column.clone(), json_to_sql(value)))
        .unzip()
}
