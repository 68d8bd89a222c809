// src/grid/database/values.rs
// Mapping between grid cell values and SQLite storage classes.

use crate::grid::definitions::{CellValue, ColumnTypeHint, RowValues};
use rusqlite::types::{Value, ValueRef};
use rusqlite::Row;

/// Display hint for a declared SQLite column type. Affinity-style substring matching.
pub fn column_type_hint(column_type: Option<&str>) -> Option<ColumnTypeHint> {
    let declared = column_type?.trim();
    if declared.is_empty() {
        return None;
    }
    let upper = declared.to_ascii_uppercase();

    if ["TEXT", "CHAR", "CLOB", "STRING"].iter().any(|t| upper.contains(t)) {
        return Some(ColumnTypeHint::Text);
    }
    if ["INT", "NUMBER", "REAL", "DOUBLE", "FLOAT"].iter().any(|t| upper.contains(t)) {
        return Some(ColumnTypeHint::Number);
    }
    if upper.contains("BLOB") {
        return Some(ColumnTypeHint::Blob);
    }
    Some(ColumnTypeHint::Text)
}

fn as_byte_array(items: &[CellValue]) -> Option<Vec<u8>> {
    items
        .iter()
        .map(|item| item.as_u64().and_then(|n| u8::try_from(n).ok()))
        .collect()
}

/// Booleans become 0/1, arrays of bytes become blobs, other arrays and objects are stored as
/// JSON text.
pub fn json_to_sql(value: &CellValue) -> Value {
    match value {
        CellValue::Null => Value::Null,
        CellValue::Bool(b) => Value::Integer(i64::from(*b)),
        CellValue::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => n.as_f64().map(Value::Real).unwrap_or(Value::Null),
        },
        CellValue::String(s) => Value::Text(s.clone()),
        CellValue::Array(items) => match as_byte_array(items) {
            Some(bytes) if !items.is_empty() => Value::Blob(bytes),
            _ => Value::Text(value.to_string()),
        },
        CellValue::Object(_) => Value::Text(value.to_string()),
    }
}

pub fn sql_to_json(value: ValueRef<'_>) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Null,
        ValueRef::Integer(i) => CellValue::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(CellValue::Number)
            .unwrap_or(CellValue::Null),
        ValueRef::Text(bytes) => CellValue::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => CellValue::Array(bytes.iter().map(|b| CellValue::from(*b)).collect()),
    }
}

/// Reads a row into a column map. Later duplicate names overwrite earlier ones.
pub fn row_to_values(row: &Row<'_>, columns: &[String]) -> rusqlite::Result<RowValues> {
    let mut values = RowValues::new();
    for (idx, name) in columns.iter().enumerate() {
        values.insert(name.clone(), sql_to_json(row.get_ref(idx)?));
    }
    Ok(values)
}
