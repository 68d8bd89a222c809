// src/cli/mod.rs
// Command-line front end: inspect a table page or replay an edit script against it.

pub mod apply;
pub mod show;

use crate::grid::database::DbError;
use crate::grid::{CommitError, DriverError, MutationError};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Parser)]
#[command(name = "gridstudio")]
#[command(about = "GridStudio - edit SQLite tables through a change-tracking grid", long_about = None)]
pub struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print a page of a table with its header metadata
    Show {
        /// Path to the database file
        db: PathBuf,
        /// Table to read
        table: String,
        #[arg(long, default_value = "main")]
        schema: String,
        /// Rows per page (defaults to the configured page size)
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        /// Column to sort by
        #[arg(long)]
        order_by: Option<String>,
        /// Sort descending
        #[arg(long)]
        desc: bool,
        /// Raw SQL filter, appended after WHERE
        #[arg(long = "where")]
        where_raw: Option<String>,
    },

    /// Replay an edit script against a table and commit the resulting mutations
    Apply {
        /// Path to the database file
        db: PathBuf,
        /// Table to edit
        table: String,
        /// JSON edit script
        edits: PathBuf,
        #[arg(long, default_value = "main")]
        schema: String,
        /// Print the mutation plan without committing it
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the effective grid settings
    Config {
        /// Also write them to the settings file
        #[arg(long)]
        write: bool,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Database(#[from] DbError),
    #[error("Driver error: {0}")]
    Driver(DriverError),
    #[error(transparent)]
    Plan(#[from] MutationError),
    #[error(transparent)]
    Commit(#[from] CommitError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Edit {index}: {message}")]
    InvalidEdit { index: usize, message: String },
}

impl From<DriverError> for CliError {
    fn from(e: DriverError) -> Self {
        CliError::Driver(e)
    }
}

pub type CliResult<T> = Result<T, CliError>;
