// src/grid/database/writer/mutations.rs
// Runs a mutation batch in one transaction, reading each row back with RETURNING.

use super::super::error::{DbError, DbResult};
use super::super::values::row_to_values;
use super::helpers::{
    build_delete_sql, build_insert_sql, build_update_sql, build_where_clause, quote_qualified,
    returning_clause, split_values,
};
use super::validation::validate_mutation;
use crate::grid::definitions::{RowValues, TableSchema};
use crate::grid::driver::MutationResult;
use crate::grid::mutation::{MutationPlan, RowMutation};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Transaction};
use tracing::{debug, info};

fn query_returning(tx: &Transaction, sql: &str, params: Vec<Value>) -> DbResult<Option<RowValues>> {
    let mut stmt = tx.prepare(sql)?;
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query(params_from_iter(params))?;
    match rows.next()? {
        Some(row) => Ok(Some(row_to_values(row, &names)?)),
        None => Ok(None),
    }
}

fn execute_one(
    tx: &Transaction,
    schema_name: &str,
    table_name: &str,
    mutation: &RowMutation,
    with_rowid: bool,
) -> DbResult<MutationResult> {
    let returning = returning_clause(with_rowid);

    match mutation {
        RowMutation::Insert { values, .. } => {
            let (columns, params) = split_values(values);
            let sql = build_insert_sql(schema_name, table_name, &columns, returning);
            let record = query_returning(tx, &sql, params)?;
            Ok(MutationResult {
                record,
                last_insert_id: Some(tx.last_insert_rowid()),
            })
        }
        RowMutation::Update { where_clause, values } => {
            let (where_sql, where_params) = build_where_clause(where_clause);
            let record = if values.is_empty() {
                // Nothing to set; read the row back so the caller still gets a record.
                let sql = format!(
                    "SELECT {} FROM {} WHERE {} LIMIT 1",
                    if with_rowid { "rowid, *" } else { "*" },
                    quote_qualified(schema_name, table_name),
                    where_sql
                );
                query_returning(tx, &sql, where_params)?
            } else {
                let (columns, mut params) = split_values(values);
                params.extend(where_params);
                let sql = build_update_sql(schema_name, table_name, &columns, &where_sql, returning);
                query_returning(tx, &sql, params)?
            };

            match record {
                Some(record) => Ok(MutationResult {
                    record: Some(record),
                    last_insert_id: None,
                }),
                None => Err(DbError::Other(format!(
                    "UPDATE on {}.{} matched no row",
                    schema_name, table_name
                ))),
            }
        }
        RowMutation::Delete { where_clause } => {
            let (where_sql, params) = build_where_clause(where_clause);
            let sql = build_delete_sql(schema_name, table_name, &where_sql);
            let affected = tx.execute(&sql, params_from_iter(params))?;
            debug!("DbWriter: DELETE removed {} rows from {}", affected, table_name);
            Ok(MutationResult::default())
        }
    }
}

pub fn apply_mutations(
    conn: &mut Connection,
    schema_name: &str,
    table_name: &str,
    plans: &[MutationPlan],
    table_schema: &TableSchema,
) -> DbResult<Vec<MutationResult>> {
    for plan in plans {
        validate_mutation(&plan.mutation, table_schema)?;
    }

    let with_rowid = !table_schema.without_row_id
        && table_schema.pk.iter().any(|k| k.eq_ignore_ascii_case("rowid"));

    // Dropping the transaction without commit rolls the whole batch back.
    let tx = conn.transaction()?;
    let mut results = Vec::with_capacity(plans.len());
    for plan in plans {
        results.push(execute_one(&tx, schema_name, table_name, &plan.mutation, with_rowid)?);
    }
    tx.commit()?;

    info!(
        "DbWriter: applied {} mutations to {}.{}",
        results.len(),
        schema_name,
        table_name
    );
    Ok(results)
}
