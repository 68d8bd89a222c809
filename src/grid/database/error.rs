// src/grid/database/error.rs

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("Table not found: {0}")]
    TableNotFound(String),
    #[error("Unsafe mutation: {0}")]
    UnsafeMutation(String),
    #[error("Database connection lock poisoned")]
    LockPoisoned,
    #[error("Background database task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("{0}")]
    Other(String),
}

pub type DbResult<T> = Result<T, DbError>;
