// src/cli/show.rs
// Prints one page of a table: headers with their metadata, then the rows.

use super::CliResult;
use crate::grid::database::SqliteDriver;
use crate::grid::{
    create_table_state_from_result, DataDriver, HeaderBuildInput, HeaderMetadata,
    SelectTableOptions, TableGridState, TableSchema,
};
use crate::settings::GridSettings;
use serde_json::json;
use std::path::Path;
use tracing::info;

/// Reads a page and wraps it in a grid, with headers resolved against the whole schema.
pub async fn load_grid(
    driver: &SqliteDriver,
    schema: &str,
    table: &str,
    options: &SelectTableOptions,
    settings: &GridSettings,
) -> CliResult<(TableGridState<HeaderMetadata>, TableSchema)> {
    let output = driver.select_table(schema, table, options).await?;
    let catalog = driver.schema_catalog(schema).await?;

    let grid = create_table_state_from_result(
        &HeaderBuildInput {
            driver: Some(driver),
            result: &output.result,
            catalog: Some(&catalog),
            table_schema: Some(&output.schema),
            settings,
        },
        options.offset,
    );
    Ok((grid, output.schema))
}

pub async fn run(
    db: &Path,
    schema: &str,
    table: &str,
    options: SelectTableOptions,
    settings: &GridSettings,
) -> CliResult<()> {
    let driver = SqliteDriver::open(db)?;
    let (grid, table_schema) = load_grid(&driver, schema, table, &options, settings).await?;
    info!(
        "Loaded {} rows of {}.{} (offset {})",
        grid.row_count(),
        schema,
        table,
        options.offset
    );

    println!("Table: {}.{}", schema, table);
    if table_schema.pk.is_empty() {
        println!("Primary key: (none)");
    } else {
        println!("Primary key: {}", table_schema.pk.join(", "));
    }
    let editable = grid.headers().iter().any(|h| !h.readonly);
    println!("Mode: {}", if editable { "editable" } else { "read-only" });
    println!();

    println!("{:<4} {:<24} {:<6} {:<4} {:>6}  FK", "#", "Column", "Edit", "PK", "Width");
    println!("{}", "-".repeat(60));
    for (idx, header) in grid.headers().iter().enumerate() {
        let fk = header
            .metadata
            .foreign_key
            .as_ref()
            .map(|fk| {
                format!(
                    "{}.{}({})",
                    fk.schema_name,
                    fk.table_name,
                    fk.column_name.as_deref().unwrap_or("?")
                )
            })
            .unwrap_or_default();
        println!(
            "{:<4} {:<24} {:<6} {:<4} {:>6}  {}",
            idx,
            header.display_text,
            if header.readonly { "no" } else { "yes" },
            if header.metadata.is_primary_key { "yes" } else { "" },
            header.initial_width,
            fk
        );
    }
    println!();

    for (idx, row) in grid.rows().iter().enumerate() {
        let line = json!({
            "row": grid.row_number_offset() + idx + 1,
            "values": row.current_values(),
        });
        println!("{}", line);
    }

    Ok(())
}
