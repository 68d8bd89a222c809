// src/grid/database/writer/mod.rs
// Main writer module - every write against a user table goes through here

pub mod helpers;
mod mutations;
mod validation;
#[cfg(test)]
pub(crate) mod test_helpers;

use super::error::DbResult;
use crate::grid::definitions::TableSchema;
use crate::grid::driver::MutationResult;
use crate::grid::mutation::{MutationPlan, RowMutation};
use rusqlite::Connection;

/// Database writer - provides all write operations
///
/// This struct delegates to specialized modules:
/// - `validation`: key safety checks run before anything is written
/// - `mutations`: the transactional INSERT/UPDATE/DELETE batch
pub struct DbWriter;

impl DbWriter {
    /// Rejects mutations that could not address exactly the intended row.
    pub fn validate_mutation(mutation: &RowMutation, table_schema: &TableSchema) -> DbResult<()> {
        validation::validate_mutation(mutation, table_schema)
    }

    /// Validates every plan, then runs them in one transaction. Returns one result per plan.
    /// Nothing is written when any plan fails.
    pub fn apply_mutations(
        conn: &mut Connection,
        schema_name: &str,
        table_name: &str,
        plans: &[MutationPlan],
        table_schema: &TableSchema,
    ) -> DbResult<Vec<MutationResult>> {
        mutations::apply_mutations(conn, schema_name, table_name, plans, table_schema)
    }
}
