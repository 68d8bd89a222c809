// src/grid/commit.rs
// Sends a mutation batch to a driver and folds the results back into the grid.

use super::definitions::TableSchema;
use super::driver::{DataDriver, DriverError};
use super::mutation::{build_mutation_plans, MutationError, MutationPlan, RowMutation};
use super::state::TableGridState;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum CommitError {
    #[error("Failed to build mutation plans: {0}")]
    Plan(#[from] MutationError),
    #[error("Driver rejected the batch: {0}")]
    Driver(#[source] DriverError),
    #[error("Driver returned {actual} results for {expected} mutations")]
    ResultCountMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CommitSummary {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl CommitSummary {
    pub fn from_plans(plans: &[MutationPlan]) -> Self {
        plans.iter().fold(Self::default(), |mut summary, plan| {
            match plan.mutation {
                RowMutation::Insert { .. } => summary.inserted += 1,
                RowMutation::Update { .. } => summary.updated += 1,
                RowMutation::Delete { .. } => summary.deleted += 1,
            }
            summary
        })
    }

    pub fn total(&self) -> usize {
        self.inserted + self.updated + self.deleted
    }
}

/// Commits against one table. Callers serialize commits per grid.
pub struct CommitExecutor<'a> {
    driver: &'a dyn DataDriver,
    schema_name: &'a str,
    table_name: &'a str,
}

impl<'a> CommitExecutor<'a> {
    pub fn new(driver: &'a dyn DataDriver, schema_name: &'a str, table_name: &'a str) -> Self {
        Self {
            driver,
            schema_name,
            table_name,
        }
    }

    /// Sends every plan in one driver call. The grid is only touched when the driver succeeds
    /// with exactly one result per plan.
    pub async fn commit<M>(
        &self,
        plans: Vec<MutationPlan>,
        table_schema: &TableSchema,
        data: &mut TableGridState<M>,
    ) -> Result<CommitSummary, CommitError> {
        let summary = CommitSummary::from_plans(&plans);
        debug!(
            "CommitExecutor: sending {} mutations to {}.{}",
            plans.len(),
            self.schema_name,
            self.table_name
        );

        let results = self
            .driver
            .mutate_rows(self.schema_name, self.table_name, &plans, table_schema)
            .await
            .map_err(|e| {
                error!(
                    "CommitExecutor: driver failed for {}.{}: {}",
                    self.schema_name, self.table_name, e
                );
                CommitError::Driver(e)
            })?;

        if results.len() != plans.len() {
            warn!(
                "CommitExecutor: expected {} results, driver returned {}",
                plans.len(),
                results.len()
            );
            return Err(CommitError::ResultCountMismatch {
                expected: plans.len(),
                actual: results.len(),
            });
        }

        data.apply_changes(
            plans
                .iter()
                .zip(results)
                .map(|(plan, result)| (plan.change_id, result.record))
                .collect(),
        );

        info!(
            "CommitExecutor: committed {} inserts, {} updates, {} deletes to {}.{}",
            summary.inserted, summary.updated, summary.deleted, self.schema_name, self.table_name
        );
        Ok(summary)
    }
}

/// Plans and commits every pending change of `data`. Nothing is sent when nothing is dirty.
pub async fn commit_table_changes<M>(
    driver: &dyn DataDriver,
    table_name: &str,
    table_schema: &TableSchema,
    data: &mut TableGridState<M>,
) -> Result<CommitSummary, CommitError> {
    let plans = build_mutation_plans(table_schema, data)?;
    if plans.is_empty() {
        debug!("CommitExecutor: nothing to commit for {}", table_name);
        return Ok(CommitSummary::default());
    }

    CommitExecutor::new(driver, &table_schema.schema_name, table_name)
        .commit(plans, table_schema, data)
        .await
}
