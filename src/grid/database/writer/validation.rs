// src/grid/database/writer/validation.rs

use super::super::error::{DbError, DbResult};
use crate::grid::definitions::{RowValues, TableSchema};
use crate::grid::mutation::RowMutation;

fn is_null_or_missing(values: &RowValues, key: &str) -> bool {
    values.get(key).map_or(true, |v| v.is_null())
}

pub fn validate_mutation(mutation: &RowMutation, table_schema: &TableSchema) -> DbResult<()> {
    let pk = &table_schema.pk;
    if pk.is_empty() {
        return Err(DbError::UnsafeMutation(
            "This table has no primary key. Unsafe to perform insert, update, or delete operations.".into(),
        ));
    }

    match mutation {
        RowMutation::Delete { where_clause } => {
            if pk.iter().any(|k| is_null_or_missing(where_clause, k)) {
                return Err(DbError::UnsafeMutation(
                    "Cannot delete a row with NULL in primary key columns.".into(),
                ));
            }
        }
        RowMutation::Update { where_clause, values } => {
            if pk.iter().any(|k| is_null_or_missing(where_clause, k)) {
                return Err(DbError::UnsafeMutation(
                    "Cannot update a row with NULL in primary key columns.".into(),
                ));
            }
            let null_after_update = pk.iter().any(|k| match values.get(k) {
                Some(v) => v.is_null(),
                None => is_null_or_missing(where_clause, k),
            });
            if null_after_update {
                return Err(DbError::UnsafeMutation(
                    "Cannot update a row causing NULL in primary key columns.".into(),
                ));
            }
        }
        RowMutation::Insert { values, .. } => {
            if table_schema.auto_increment {
                if pk.first().and_then(|k| values.get(k)).is_some_and(|v| v.is_null()) {
                    return Err(DbError::UnsafeMutation(
                        "Cannot insert a row with NULL in the auto-increment primary key column.".into(),
                    ));
                }
            } else if pk.iter().any(|k| is_null_or_missing(values, k)) {
                return Err(DbError::UnsafeMutation(
                    "Cannot insert a row with NULL in primary key columns.".into(),
                ));
            }
        }
    }
    Ok(())
}
