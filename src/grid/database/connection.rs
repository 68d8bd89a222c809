// src/grid/database/connection.rs

use super::error::DbResult;
use rusqlite::Connection;
use std::path::Path;
use tracing::{debug, warn};

pub struct DbConnection;

impl DbConnection {
    /// Opens an existing database and ensures WAL mode is enabled.
    /// Always use this instead of `Connection::open()`: pragmas are per connection.
    pub fn open_existing(path: &Path) -> DbResult<Connection> {
        let conn = Connection::open(path)?;

        // PRAGMA journal_mode=WAL returns the mode that is actually in effect.
        let journal_mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;

        if journal_mode.to_uppercase() != "WAL" {
            warn!(
                "Failed to set WAL mode on database {:?}. Current mode: {}. This may indicate the database is in use by another connection.",
                path.file_name(),
                journal_mode
            );
        } else {
            debug!("WAL mode activated for database {:?}", path.file_name());
        }

        Self::apply_pragmas(&conn)?;
        Ok(conn)
    }

    /// In-memory database with the same pragmas (journal mode stays `memory`).
    pub fn open_in_memory() -> DbResult<Connection> {
        let conn = Connection::open_in_memory()?;
        Self::apply_pragmas(&conn)?;
        Ok(conn)
    }

    fn apply_pragmas(conn: &Connection) -> DbResult<()> {
        conn.execute_batch(
            "PRAGMA synchronous=NORMAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )?;
        Ok(())
    }
}
