// src/main.rs

use clap::Parser;
use gridstudio::cli::{self, Cli, CliResult, Commands};
use gridstudio::grid::{OrderBy, SelectTableOptions, SortDirection};
use gridstudio::settings::io::{
    load_settings_from_file, load_settings_from_path, save_settings_to_file, save_settings_to_path,
};
use gridstudio::settings::GridSettings;
use std::process::ExitCode;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

fn load_settings(cli: &Cli) -> GridSettings {
    let loaded = match &cli.config {
        Some(path) => load_settings_from_path(path),
        None => load_settings_from_file(),
    };
    loaded.unwrap_or_else(|e| {
        warn!("Falling back to default grid settings: {}", e);
        GridSettings::default()
    })
}

async fn dispatch(cli: &Cli, settings: &GridSettings) -> CliResult<()> {
    match &cli.command {
        Commands::Show {
            db,
            table,
            schema,
            limit,
            offset,
            order_by,
            desc,
            where_raw,
        } => {
            let options = SelectTableOptions {
                limit: limit.unwrap_or(settings.page_size),
                offset: *offset,
                order_by: order_by.as_ref().map(|column| OrderBy {
                    column: column.clone(),
                    direction: if *desc { SortDirection::Desc } else { SortDirection::Asc },
                }),
                where_raw: where_raw.clone(),
            };
            cli::show::run(db, schema, table, options, settings).await
        }
        Commands::Apply {
            db,
            table,
            edits,
            schema,
            dry_run,
        } => cli::apply::run(db, schema, table, edits, *dry_run, settings).await,
        Commands::Config { write } => {
            println!("{}", serde_json::to_string_pretty(settings)?);
            if *write {
                match &cli.config {
                    Some(path) => save_settings_to_path(settings, path)?,
                    None => save_settings_to_file(settings)?,
                }
            }
            Ok(())
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("gridstudio=info,warn")),
        )
        .init();

    let settings = load_settings(&cli);
    match dispatch(&cli, &settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
