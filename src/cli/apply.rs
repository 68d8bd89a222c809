// src/cli/apply.rs
// Replays a JSON edit script on a loaded grid, then plans and commits the changes.
//
// Script format:
// ```text
// [
//   {"op": "set", "row": 0, "column": "name", "value": "pear"},
//   {"op": "insert", "at": 0, "values": {"name": "plum"}},
//   {"op": "remove", "row": 3}
// ]
// ```

use super::show::load_grid;
use super::{CliError, CliResult};
use crate::grid::database::SqliteDriver;
use crate::grid::{
    build_mutation_plans, commit_table_changes, CellValue, HeaderMetadata, RowValues,
    SelectTableOptions, TableGridState,
};
use crate::settings::GridSettings;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Edit {
    Set {
        row: usize,
        column: String,
        value: CellValue,
    },
    Insert {
        #[serde(default)]
        at: Option<usize>,
        #[serde(default)]
        values: RowValues,
    },
    Remove {
        row: usize,
    },
}

pub fn parse_edits(text: &str) -> CliResult<Vec<Edit>> {
    Ok(serde_json::from_str(text)?)
}

/// Applies the edits in order. Returns how many took effect; the rest are logged and skipped.
/// Unknown column names are an error.
pub fn replay_edits(grid: &mut TableGridState<HeaderMetadata>, edits: &[Edit]) -> CliResult<usize> {
    let mut applied = 0;
    for (index, edit) in edits.iter().enumerate() {
        let took_effect = match edit {
            Edit::Set { row, column, value } => {
                let col = grid.column_index(column).ok_or_else(|| CliError::InvalidEdit {
                    index,
                    message: format!("unknown column '{}'", column),
                })?;
                grid.change_value(*row, col, value.clone())
            }
            Edit::Insert { at, values } => {
                if let Some(unknown) = values.keys().find(|k| grid.column_index(k).is_none()) {
                    return Err(CliError::InvalidEdit {
                        index,
                        message: format!("unknown column '{}'", unknown),
                    });
                }
                let at = at.unwrap_or(grid.row_count());
                grid.insert_new_row(Some(at), values.clone());
                true
            }
            Edit::Remove { row } => grid.remove_row(Some(*row)),
        };

        if took_effect {
            applied += 1;
        } else {
            warn!("Edit {} had no effect: {:?}", index, edit);
        }
    }
    Ok(applied)
}

pub async fn run(
    db: &Path,
    schema: &str,
    table: &str,
    edits_path: &Path,
    dry_run: bool,
    settings: &GridSettings,
) -> CliResult<()> {
    let edits = parse_edits(&fs::read_to_string(edits_path)?)?;

    let driver = SqliteDriver::open(db)?;
    let options = SelectTableOptions {
        limit: settings.page_size,
        ..Default::default()
    };
    let (mut grid, table_schema) = load_grid(&driver, schema, table, &options, settings).await?;

    let applied = replay_edits(&mut grid, &edits)?;
    info!("Applied {} of {} edits to {}.{}", applied, edits.len(), schema, table);

    let plans = build_mutation_plans(&table_schema, &grid)?;
    println!("{}", serde_json::to_string_pretty(&plans)?);

    if dry_run {
        println!("Dry run: {} mutations not committed", plans.len());
        return Ok(());
    }

    let summary = commit_table_changes(&driver, table, &table_schema, &mut grid).await?;
    println!(
        "Committed {} inserts, {} updates, {} deletes",
        summary.inserted, summary.updated, summary.deleted
    );
    Ok(())
}
