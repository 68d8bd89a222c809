// src/grid/mutation.rs
// Turns the grid's dirty rows into primary-key-addressed row mutations.

use super::definitions::{RowValues, TableSchema};
use super::row_store::{ChangeId, ChangeKind};
use super::state::TableGridState;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "UPPERCASE")]
pub enum RowMutation {
    Insert {
        values: RowValues,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        auto_increment_pk_column: Option<String>,
        /// Key columns, so a driver without `RETURNING` can read the row back.
        #[serde(default)]
        primary_key: Vec<String>,
    },
    Update {
        #[serde(rename = "where")]
        where_clause: RowValues,
        values: RowValues,
    },
    Delete {
        #[serde(rename = "where")]
        where_clause: RowValues,
    },
}

impl RowMutation {
    pub fn operation_name(&self) -> &'static str {
        match self {
            RowMutation::Insert { .. } => "INSERT",
            RowMutation::Update { .. } => "UPDATE",
            RowMutation::Delete { .. } => "DELETE",
        }
    }
}

/// A mutation tied back to the row change that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationPlan {
    pub change_id: ChangeId,
    #[serde(flatten)]
    pub mutation: RowMutation,
}

#[derive(Debug, Error, PartialEq)]
pub enum MutationError {
    #[error("Primary key column '{column}' is missing from row (change {change_id}).")]
    MissingPrimaryKey { column: String, change_id: ChangeId },
    #[error("Table '{0}' has no primary key and no rowid; rows cannot be addressed.")]
    NoPrimaryKey(String),
}

fn where_from_raw(
    raw: &RowValues,
    key: &[String],
    change_id: ChangeId,
) -> Result<RowValues, MutationError> {
    key.iter()
        .map(|column| {
            raw.get(column)
                .map(|value| (column.clone(), value.clone()))
                .ok_or_else(|| MutationError::MissingPrimaryKey {
                    column: column.clone(),
                    change_id,
                })
        })
        .collect()
}

/// One plan per dirty row, in ascending change id order. `where` is always built from the
/// values the row was read with.
pub fn build_mutation_plans<M>(
    table_schema: &TableSchema,
    data: &TableGridState<M>,
) -> Result<Vec<MutationPlan>, MutationError> {
    let key = table_schema.effective_primary_key();
    let changed = data.changed_rows();
    let needs_key = changed.iter().any(|(_, row)| !row.is_new_row());
    if needs_key && key.is_empty() {
        return Err(MutationError::NoPrimaryKey(
            table_schema.table_name.clone().unwrap_or_default(),
        ));
    }

    let mut plans = Vec::with_capacity(changed.len());
    for (_, row) in changed {
        let Some(change) = row.change() else {
            continue;
        };

        let mutation = match change.kind {
            ChangeKind::Inserted => RowMutation::Insert {
                values: change.diff.clone(),
                auto_increment_pk_column: table_schema.auto_increment_column().map(str::to_string),
                primary_key: table_schema.pk.clone(),
            },
            ChangeKind::Removed => RowMutation::Delete {
                where_clause: where_from_raw(row.raw(), &key, change.change_id)?,
            },
            ChangeKind::Updated => RowMutation::Update {
                where_clause: where_from_raw(row.raw(), &key, change.change_id)?,
                values: change.diff.clone(),
            },
        };

        plans.push(MutationPlan {
            change_id: change.change_id,
            mutation,
        });
    }

    debug!("MutationPlanner: built {} plans", plans.len());
    Ok(plans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::definitions::TableColumn;
    use crate::grid::headers::Header;
    use crate::settings::GridSettings;
    use serde_json::json;

    fn schema() -> TableSchema {
        TableSchema {
            schema_name: "main".into(),
            table_name: Some("items".into()),
            pk: vec!["id".into()],
            columns: vec![
                TableColumn::new("id", "INTEGER"),
                TableColumn::new("name", "TEXT"),
                TableColumn::new("y", "TEXT"),
            ],
            ..Default::default()
        }
    }

    fn grid() -> TableGridState<()> {
        let headers: Vec<Header<()>> = ["id", "name", "y"]
            .iter()
            .map(|n| Header {
                readonly: false,
                ..Header::plain(*n, 150)
            })
            .collect();
        let rows = (1..=3)
            .map(|i| {
                RowValues::from([
                    ("id".to_string(), json!(i)),
                    ("name".to_string(), json!(format!("n{}", i))),
                    ("y".to_string(), json!("old")),
                ])
            })
            .collect();
        TableGridState::new(headers, rows, GridSettings::default())
    }

    #[test]
    fn plans_follow_edit_order() {
        let mut g = grid();
        g.insert_new_row(Some(3), RowValues::from([("name".to_string(), json!("x"))]));
        g.change_value(0, 2, json!("new"));
        g.remove_row(Some(1));

        let plans = build_mutation_plans(&schema(), &g).unwrap();
        let mutations: Vec<RowMutation> = plans.into_iter().map(|p| p.mutation).collect();
        assert_eq!(
            mutations,
            vec![
                RowMutation::Insert {
                    values: RowValues::from([("name".to_string(), json!("x"))]),
                    auto_increment_pk_column: None,
                    primary_key: vec!["id".into()],
                },
                RowMutation::Update {
                    where_clause: RowValues::from([("id".to_string(), json!(1))]),
                    values: RowValues::from([("y".to_string(), json!("new"))]),
                },
                RowMutation::Delete {
                    where_clause: RowValues::from([("id".to_string(), json!(2))]),
                },
            ]
        );
    }

    #[test]
    fn where_uses_original_key_after_key_edit() {
        let mut g = grid();
        g.change_value(2, 0, json!(30));
        let plans = build_mutation_plans(&schema(), &g).unwrap();
        assert_eq!(
            plans[0].mutation,
            RowMutation::Update {
                where_clause: RowValues::from([("id".to_string(), json!(3))]),
                values: RowValues::from([("id".to_string(), json!(30))]),
            }
        );
    }

    #[test]
    fn auto_increment_column_is_reported_on_insert() {
        let mut s = schema();
        s.auto_increment = true;
        let mut g = grid();
        g.insert_new_row(None, RowValues::new());
        let plans = build_mutation_plans(&s, &g).unwrap();
        match &plans[0].mutation {
            RowMutation::Insert { auto_increment_pk_column, .. } => {
                assert_eq!(auto_increment_pk_column.as_deref(), Some("id"));
            }
            other => panic!("unexpected mutation {:?}", other),
        }
    }

    #[test]
    fn key_missing_from_row_is_an_error() {
        let mut s = schema();
        s.pk = vec!["uuid".into()];
        let mut g = grid();
        g.change_value(0, 1, json!("z"));
        let err = build_mutation_plans(&s, &g).unwrap_err();
        assert!(matches!(err, MutationError::MissingPrimaryKey { ref column, .. } if column == "uuid"));
    }

    #[test]
    fn keyless_without_rowid_table_cannot_update() {
        let mut s = schema();
        s.pk.clear();
        s.without_row_id = true;
        let mut g = grid();
        g.remove_row(Some(0));
        assert_eq!(
            build_mutation_plans(&s, &g),
            Err(MutationError::NoPrimaryKey("items".into()))
        );
    }

    #[test]
    fn clean_grid_has_no_plans() {
        assert!(build_mutation_plans(&schema(), &grid()).unwrap().is_empty());
    }

    #[test]
    fn plan_serializes_with_operation_tag() {
        let plan = MutationPlan {
            change_id: 4,
            mutation: RowMutation::Delete {
                where_clause: RowValues::from([("id".to_string(), json!(2))]),
            },
        };
        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(value, json!({"change_id": 4, "operation": "DELETE", "where": {"id": 2}}));
    }
}
