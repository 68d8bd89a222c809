// src/grid/headers.rs
// Builds display/edit headers from a result set and the schema of the table it was read from.

use super::definitions::{
    ColumnTypeHint, ForeignKeyConstraint, ResultHeader, ResultSet, SchemaCatalog, TableColumn,
    TableIndex, TableSchema,
};
use super::driver::ColumnTypeHinter;
use super::state::TableGridState;
use crate::settings::GridSettings;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header<M> {
    pub name: String,
    pub display_text: String,
    #[serde(default)]
    pub tooltip: Option<String>,
    pub readonly: bool,
    pub resizable: bool,
    pub initial_width: u32,
    pub metadata: M,
}

impl<M: Default> Header<M> {
    /// Read-only, resizable header with default metadata.
    pub fn plain(name: impl Into<String>, initial_width: u32) -> Self {
        let name = name.into();
        Self {
            display_text: name.clone(),
            name,
            tooltip: None,
            readonly: true,
            resizable: true,
            initial_width,
            metadata: M::default(),
        }
    }
}

/// Physical column a header was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSource {
    pub schema_name: String,
    pub table_name: String,
    pub column_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyTarget {
    pub schema_name: String,
    pub table_name: String,
    /// `None` when the parent table's key could not be resolved.
    pub column_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HeaderMetadata {
    pub from: Option<ColumnSource>,
    pub is_primary_key: bool,
    pub foreign_key: Option<ForeignKeyTarget>,
    pub indexes: Vec<TableIndex>,
    pub type_hint: Option<ColumnTypeHint>,
    pub original_type: Option<String>,
    pub is_generated: bool,
}

pub struct HeaderBuildInput<'a> {
    pub driver: Option<&'a dyn ColumnTypeHinter>,
    pub result: &'a ResultSet,
    /// Every table known to the data source, used to resolve implicit foreign key targets.
    pub catalog: Option<&'a SchemaCatalog>,
    pub table_schema: Option<&'a TableSchema>,
    pub settings: &'a GridSettings,
}

/// Result headers, or one header per schema column when the result is completely empty.
pub fn effective_result_headers(
    result: &ResultSet,
    table_schema: Option<&TableSchema>,
) -> Vec<ResultHeader> {
    match table_schema {
        Some(schema)
            if result.headers.is_empty() && result.rows.is_empty() && !schema.columns.is_empty() =>
        {
            schema
                .columns
                .iter()
                .map(|column| ResultHeader {
                    original_type: Some(column.column_type.clone())
                        .filter(|t| !t.is_empty()),
                    ..ResultHeader::new(column.name.clone())
                })
                .collect()
        }
        _ => result.headers.clone(),
    }
}

fn parent_primary_key(
    catalog: Option<&SchemaCatalog>,
    schema_name: &str,
    table_name: &str,
) -> Option<Vec<String>> {
    catalog?
        .get(schema_name)?
        .iter()
        .find(|t| {
            t.table_name
                .as_deref()
                .is_some_and(|name| name.eq_ignore_ascii_case(table_name))
        })
        .map(|t| t.pk.clone())
}

fn resolve_foreign_key(
    fk: &ForeignKeyConstraint,
    position: usize,
    own_schema: &str,
    catalog: Option<&SchemaCatalog>,
) -> ForeignKeyTarget {
    let schema_name = fk
        .foreign_schema_name
        .clone()
        .unwrap_or_else(|| own_schema.to_string());

    let column_name = match fk.foreign_columns.get(position) {
        Some(column) => Some(column.clone()),
        None if fk.foreign_columns.is_empty() => {
            parent_primary_key(catalog, &schema_name, &fk.foreign_table_name)
                .and_then(|pk| pk.get(position).cloned())
        }
        None => None,
    };

    ForeignKeyTarget {
        schema_name,
        table_name: fk.foreign_table_name.clone(),
        column_name,
    }
}

/// Column-level constraint first, then the first table-level constraint listing the column.
fn foreign_key_for(
    column: &TableColumn,
    schema: &TableSchema,
    catalog: Option<&SchemaCatalog>,
) -> Option<ForeignKeyTarget> {
    if let Some(fk) = column.constraint.as_ref().and_then(|c| c.foreign_key.as_ref()) {
        return Some(resolve_foreign_key(fk, 0, &schema.schema_name, catalog));
    }

    schema
        .constraints
        .iter()
        .filter_map(|c| c.foreign_key.as_ref())
        .find_map(|fk| {
            fk.columns
                .iter()
                .position(|c| c.eq_ignore_ascii_case(&column.name))
                .map(|position| resolve_foreign_key(fk, position, &schema.schema_name, catalog))
        })
}

fn max_sampled_chars(result: &ResultSet, column: &str, sample_rows: usize) -> usize {
    result
        .rows
        .iter()
        .take(sample_rows)
        .filter_map(|row| row.get(column).and_then(|v| v.as_str()))
        .map(|s| s.chars().count())
        .max()
        .unwrap_or(0)
}

fn metadata_for(
    header: &ResultHeader,
    input: &HeaderBuildInput<'_>,
) -> HeaderMetadata {
    let mut metadata = HeaderMetadata {
        original_type: header.original_type.clone(),
        type_hint: header.type_hint,
        ..Default::default()
    };

    if let Some(schema) = input.table_schema {
        metadata.is_primary_key = schema.is_primary_key(&header.name);
        metadata.indexes = schema
            .indexes
            .iter()
            .filter(|idx| idx.columns.iter().any(|c| c.eq_ignore_ascii_case(&header.name)))
            .cloned()
            .collect();

        if let Some(column) = schema.column(&header.name) {
            if let Some(table_name) = &schema.table_name {
                metadata.from = Some(ColumnSource {
                    schema_name: schema.schema_name.clone(),
                    table_name: table_name.clone(),
                    column_name: column.name.clone(),
                });
            }
            metadata.foreign_key = foreign_key_for(column, schema, input.catalog);
            metadata.is_generated = column.is_generated();
            if metadata.original_type.is_none() && !column.column_type.is_empty() {
                metadata.original_type = Some(column.column_type.clone());
            }
        }
    }

    if metadata.type_hint.is_none() {
        if let Some(driver) = input.driver {
            metadata.type_hint = driver.column_type_hint(metadata.original_type.as_deref());
        }
    }

    metadata
}

/// Every declared key column is present among the key-flagged headers, or the table has no
/// declared key and the result carries exactly one `rowid` column.
fn is_table_editable(schema: Option<&TableSchema>, headers: &[Header<HeaderMetadata>]) -> bool {
    let Some(schema) = schema else {
        return false;
    };

    if schema.pk.is_empty() {
        return headers
            .iter()
            .filter(|h| h.name.eq_ignore_ascii_case("rowid"))
            .count()
            == 1;
    }

    schema.pk.iter().all(|pk| {
        headers
            .iter()
            .any(|h| h.metadata.is_primary_key && h.name.eq_ignore_ascii_case(pk))
    })
}

pub fn build_table_headers(input: &HeaderBuildInput<'_>) -> Vec<Header<HeaderMetadata>> {
    let settings = input.settings;

    let mut headers: Vec<Header<HeaderMetadata>> =
        effective_result_headers(input.result, input.table_schema)
            .iter()
            .map(|rh| {
                let metadata = metadata_for(rh, input);
                let initial_width = match (rh.initial_width, metadata.type_hint) {
                    (Some(width), _) => width,
                    (None, Some(ColumnTypeHint::Number)) => settings.numeric_column_width,
                    (None, _) => settings.text_column_width(max_sampled_chars(
                        input.result,
                        &rh.name,
                        settings.width_sample_rows,
                    )),
                };

                Header {
                    name: rh.name.clone(),
                    display_text: rh.display_name.clone(),
                    tooltip: metadata.original_type.clone(),
                    readonly: true,
                    resizable: true,
                    initial_width,
                    metadata,
                }
            })
            .collect();

    let editable = is_table_editable(input.table_schema, &headers);
    for header in &mut headers {
        if editable && header.metadata.from.is_some() {
            header.readonly = false;
        }
        if header.metadata.is_generated {
            header.readonly = true;
        }
    }

    debug!(
        "HeaderBuilder: {} headers, editable={}",
        headers.len(),
        editable
    );
    headers
}

/// Builds headers and wraps the result rows in a fresh grid.
pub fn create_table_state_from_result(
    input: &HeaderBuildInput<'_>,
    row_number_offset: usize,
) -> TableGridState<HeaderMetadata> {
    let headers = build_table_headers(input);
    let mut state = TableGridState::new(headers, input.result.rows.clone(), input.settings.clone());
    state.set_row_number_offset(row_number_offset);
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::definitions::{
        ColumnConstraint, IndexType, RowValues, TableConstraint,
    };
    use serde_json::json;
    use std::collections::BTreeMap;

    struct SimpleHinter;

    impl ColumnTypeHinter for SimpleHinter {
        fn column_type_hint(&self, column_type: Option<&str>) -> Option<ColumnTypeHint> {
            match column_type?.to_ascii_uppercase().as_str() {
                "INTEGER" | "REAL" => Some(ColumnTypeHint::Number),
                _ => Some(ColumnTypeHint::Text),
            }
        }
    }

    fn orders_schema() -> TableSchema {
        TableSchema {
            schema_name: "main".into(),
            table_name: Some("orders".into()),
            pk: vec!["a".into(), "b".into()],
            columns: vec![
                TableColumn::new("a", "INTEGER"),
                TableColumn::new("b", "INTEGER"),
                TableColumn::new("note", "TEXT"),
            ],
            ..Default::default()
        }
    }

    fn result(headers: &[&str], rows: Vec<RowValues>) -> ResultSet {
        ResultSet {
            headers: headers.iter().map(|h| ResultHeader::new(*h)).collect(),
            rows,
            ..Default::default()
        }
    }

    fn build(result: &ResultSet, schema: Option<&TableSchema>) -> Vec<Header<HeaderMetadata>> {
        let settings = GridSettings::default();
        build_table_headers(&HeaderBuildInput {
            driver: Some(&SimpleHinter),
            result,
            catalog: None,
            table_schema: schema,
            settings: &settings,
        })
    }

    #[test]
    fn empty_result_synthesizes_schema_columns() {
        let schema = orders_schema();
        let empty = ResultSet::default();
        let synthesized = effective_result_headers(&empty, Some(&schema));
        assert_eq!(synthesized.len(), 3);
        assert!(synthesized.iter().all(|h| h.initial_width.is_none()));

        let headers = build(&empty, Some(&schema));
        let names: Vec<&str> = headers.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "note"]);
        assert_eq!(headers[0].initial_width, 100);
        assert_eq!(headers[2].initial_width, 150);
    }

    #[test]
    fn partial_composite_key_is_not_editable() {
        let schema = orders_schema();
        let headers = build(&result(&["a", "note"], vec![]), Some(&schema));
        assert!(headers.iter().all(|h| h.readonly));
    }

    #[test]
    fn full_composite_key_is_editable() {
        let schema = orders_schema();
        let headers = build(&result(&["A", "b", "note", "computed"], vec![]), Some(&schema));
        assert!(headers[0].metadata.is_primary_key);
        assert!(!headers[0].readonly);
        assert!(!headers[2].readonly);
        // Not a column of the table.
        assert!(headers[3].readonly);
    }

    #[test]
    fn single_rowid_without_key_is_editable() {
        let schema = TableSchema {
            schema_name: "main".into(),
            table_name: Some("logs".into()),
            columns: vec![TableColumn::new("msg", "TEXT")],
            ..Default::default()
        };
        let headers = build(&result(&["rowid", "msg"], vec![]), Some(&schema));
        assert!(!headers[1].readonly);

        let without_rowid = build(&result(&["msg"], vec![]), Some(&schema));
        assert!(without_rowid[0].readonly);
    }

    #[test]
    fn generated_columns_stay_readonly() {
        let mut schema = orders_schema();
        schema.columns[2].constraint = Some(ColumnConstraint {
            generated_expression: Some("a + b".into()),
            ..Default::default()
        });
        let headers = build(&result(&["a", "b", "note"], vec![]), Some(&schema));
        assert!(!headers[0].readonly);
        assert!(headers[2].readonly);
        assert!(headers[2].metadata.is_generated);
    }

    #[test]
    fn text_width_uses_longest_sampled_value() {
        let rows = vec![
            RowValues::from([("note".to_string(), json!("x".repeat(30)))]),
            RowValues::from([("note".to_string(), json!(12))]),
        ];
        let headers = build(&result(&["note"], rows), None);
        assert_eq!(headers[0].initial_width, 240);
    }

    #[test]
    fn text_width_samples_first_hundred_rows_only() {
        let mut rows: Vec<RowValues> = (0..100)
            .map(|_| RowValues::from([("note".to_string(), json!("ab"))]))
            .collect();
        rows.push(RowValues::from([("note".to_string(), json!("y".repeat(200)))]));
        assert_eq!(build(&result(&["note"], rows.clone()), None)[0].initial_width, 150);

        rows.swap(99, 100);
        assert_eq!(build(&result(&["note"], rows), None)[0].initial_width, 500);
    }

    #[test]
    fn preset_width_wins() {
        let mut rs = result(&["note"], vec![]);
        rs.headers[0].initial_width = Some(321);
        assert_eq!(build(&rs, None)[0].initial_width, 321);
    }

    #[test]
    fn foreign_keys_resolve_column_and_table_level() {
        let mut schema = orders_schema();
        schema.columns.push(TableColumn {
            name: "customer_id".into(),
            column_type: "INTEGER".into(),
            constraint: Some(ColumnConstraint {
                foreign_key: Some(ForeignKeyConstraint {
                    foreign_table_name: "customers".into(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
        });
        schema.constraints.push(TableConstraint {
            foreign_key: Some(ForeignKeyConstraint {
                foreign_schema_name: None,
                foreign_table_name: "pairs".into(),
                columns: vec!["a".into(), "b".into()],
                foreign_columns: vec!["left".into(), "right".into()],
            }),
            ..Default::default()
        });
        schema.indexes.push(TableIndex {
            name: "orders_b".into(),
            columns: vec!["b".into()],
            index_type: IndexType::Key,
        });

        let catalog: SchemaCatalog = BTreeMap::from([(
            "main".to_string(),
            vec![TableSchema {
                schema_name: "main".into(),
                table_name: Some("customers".into()),
                pk: vec!["cid".into()],
                ..Default::default()
            }],
        )]);
        let settings = GridSettings::default();
        let rs = result(&["a", "b", "customer_id"], vec![]);
        let headers = build_table_headers(&HeaderBuildInput {
            driver: None,
            result: &rs,
            catalog: Some(&catalog),
            table_schema: Some(&schema),
            settings: &settings,
        });

        let b_fk = headers[1].metadata.foreign_key.as_ref().unwrap();
        assert_eq!(b_fk.table_name, "pairs");
        assert_eq!(b_fk.column_name.as_deref(), Some("right"));
        assert_eq!(headers[1].metadata.indexes.len(), 1);

        let c_fk = headers[2].metadata.foreign_key.as_ref().unwrap();
        assert_eq!(c_fk.table_name, "customers");
        assert_eq!(c_fk.column_name.as_deref(), Some("cid"));
    }

    #[test]
    fn created_state_keeps_rows_and_offset() {
        let schema = orders_schema();
        let rs = result(
            &["a", "b"],
            vec![RowValues::from([
                ("a".to_string(), json!(1)),
                ("b".to_string(), json!(2)),
            ])],
        );
        let settings = GridSettings::default();
        let state = create_table_state_from_result(
            &HeaderBuildInput {
                driver: None,
                result: &rs,
                catalog: None,
                table_schema: Some(&schema),
                settings: &settings,
            },
            50,
        );
        assert_eq!(state.row_count(), 1);
        assert_eq!(state.row_number_offset(), 50);
        assert!(state.header_metadata(0).is_primary_key);
    }
}
