// src/grid/definitions.rs
// Result-set and table-schema types shared by the grid, the header builder and drivers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single cell value. `Null` is a real value; a column missing from a row map is "unset".
pub type CellValue = serde_json::Value;

/// Column name -> value. Ordered so plans and driver payloads are deterministic.
pub type RowValues = BTreeMap<String, CellValue>;

/// Schema name -> tables in that schema.
pub type SchemaCatalog = BTreeMap<String, Vec<TableSchema>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnTypeHint {
    Text,
    Number,
    Blob,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultHeader {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub original_type: Option<String>,
    #[serde(default)]
    pub type_hint: Option<ColumnTypeHint>,
    /// Width chosen by whoever produced the result (e.g. a saved layout). Synthesized headers
    /// never carry one.
    #[serde(default)]
    pub initial_width: Option<u32>,
}

impl ResultHeader {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultStat {
    pub rows_read: u64,
    pub rows_written: u64,
    pub rows_affected: u64,
    pub query_duration_ms: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultSet {
    pub headers: Vec<ResultHeader>,
    pub rows: Vec<RowValues>,
    #[serde(default)]
    pub stat: ResultStat,
    #[serde(default)]
    pub last_insert_rowid: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ForeignKeyConstraint {
    #[serde(default)]
    pub foreign_schema_name: Option<String>,
    pub foreign_table_name: String,
    /// Local columns. Empty for a column-level constraint (the owning column is implied).
    #[serde(default)]
    pub columns: Vec<String>,
    /// Referenced columns. Empty means "the parent table's primary key".
    #[serde(default)]
    pub foreign_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColumnConstraint {
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default)]
    pub not_null: bool,
    #[serde(default)]
    pub default_expression: Option<String>,
    #[serde(default)]
    pub foreign_key: Option<ForeignKeyConstraint>,
    #[serde(default)]
    pub generated_expression: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableColumn {
    pub name: String,
    #[serde(default)]
    pub column_type: String,
    #[serde(default)]
    pub constraint: Option<ColumnConstraint>,
}

impl TableColumn {
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            constraint: None,
        }
    }

    pub fn is_generated(&self) -> bool {
        self.constraint
            .as_ref()
            .is_some_and(|c| c.generated_expression.is_some())
    }
}

/// Table-level constraint (composite primary key or composite foreign key).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableConstraint {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub primary_key: Option<Vec<String>>,
    #[serde(default)]
    pub foreign_key: Option<ForeignKeyConstraint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexType {
    Key,
    Unique,
    Primary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableIndex {
    pub name: String,
    pub columns: Vec<String>,
    pub index_type: IndexType,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableSchema {
    pub schema_name: String,
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default)]
    pub pk: Vec<String>,
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default)]
    pub columns: Vec<TableColumn>,
    #[serde(default)]
    pub constraints: Vec<TableConstraint>,
    #[serde(default)]
    pub indexes: Vec<TableIndex>,
    #[serde(default)]
    pub without_row_id: bool,
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&TableColumn> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn is_primary_key(&self, name: &str) -> bool {
        self.pk.iter().any(|pk| pk.eq_ignore_ascii_case(name))
    }

    /// Declared primary key, or `rowid` for a rowid table without one.
    pub fn effective_primary_key(&self) -> Vec<String> {
        if self.pk.is_empty() && !self.without_row_id {
            vec!["rowid".to_string()]
        } else {
            self.pk.clone()
        }
    }

    /// First primary key column when the key is auto-incremented by the database.
    pub fn auto_increment_column(&self) -> Option<&str> {
        if self.auto_increment {
            self.pk.first().map(String::as_str)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> TableSchema {
        TableSchema {
            schema_name: "main".into(),
            table_name: Some("users".into()),
            pk: vec!["Id".into()],
            auto_increment: true,
            columns: vec![TableColumn::new("Id", "INTEGER"), TableColumn::new("name", "TEXT")],
            ..Default::default()
        }
    }

    #[test]
    fn primary_key_lookup_ignores_case() {
        let s = schema();
        assert!(s.is_primary_key("id"));
        assert!(!s.is_primary_key("name"));
        assert_eq!(s.column("NAME").map(|c| c.name.as_str()), Some("name"));
    }

    #[test]
    fn effective_primary_key_falls_back_to_rowid() {
        let mut s = schema();
        assert_eq!(s.effective_primary_key(), vec!["Id".to_string()]);
        s.pk.clear();
        assert_eq!(s.effective_primary_key(), vec!["rowid".to_string()]);
        s.without_row_id = true;
        assert!(s.effective_primary_key().is_empty());
    }

    #[test]
    fn auto_increment_column_requires_flag() {
        let mut s = schema();
        assert_eq!(s.auto_increment_column(), Some("Id"));
        s.auto_increment = false;
        assert_eq!(s.auto_increment_column(), None);
    }

    #[test]
    fn schema_deserializes_with_defaults() {
        let s: TableSchema = serde_json::from_str(
            r#"{"schema_name":"main","pk":["id"],"columns":[{"name":"id","column_type":"INTEGER"}]}"#,
        )
        .unwrap();
        assert!(!s.auto_increment);
        assert!(s.indexes.is_empty());
        assert_eq!(s.columns[0].name, "id");
    }
}
