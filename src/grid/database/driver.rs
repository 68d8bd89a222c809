// src/grid/database/driver.rs
// `DataDriver` over a single SQLite connection. Blocking rusqlite work runs on tokio's
// blocking pool.

use super::connection::DbConnection;
use super::error::{DbError, DbResult};
use super::reader::DbReader;
use super::values::column_type_hint;
use super::writer::DbWriter;
use crate::grid::definitions::{ColumnTypeHint, SchemaCatalog, TableSchema};
use crate::grid::driver::{
    ColumnTypeHinter, DataDriver, DriverError, MutationResult, SelectTableOptions,
    SelectTableOutput,
};
use crate::grid::mutation::MutationPlan;
use async_trait::async_trait;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct SqliteDriver {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDriver {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    pub fn open(path: &Path) -> DbResult<Self> {
        Ok(Self::new(DbConnection::open_existing(path)?))
    }

    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::new(DbConnection::open_in_memory()?))
    }

    /// Runs `f` against the connection on the blocking pool.
    async fn with_connection<T, F>(&self, f: F) -> DbResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> DbResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| DbError::LockPoisoned)?;
            f(&mut guard)
        })
        .await?
    }

    pub async fn table_schema(&self, schema_name: &str, table_name: &str) -> DbResult<TableSchema> {
        let (schema_name, table_name) = (schema_name.to_string(), table_name.to_string());
        self.with_connection(move |conn| DbReader::table_schema(conn, &schema_name, &table_name))
            .await
    }

    pub async fn schema_catalog(&self, schema_name: &str) -> DbResult<SchemaCatalog> {
        let schema_name = schema_name.to_string();
        self.with_connection(move |conn| DbReader::schema_catalog(conn, &schema_name))
            .await
    }
}

impl ColumnTypeHinter for SqliteDriver {
    fn column_type_hint(&self, column_type: Option<&str>) -> Option<ColumnTypeHint> {
        column_type_hint(column_type)
    }
}

#[async_trait]
impl DataDriver for SqliteDriver {
    async fn select_table(
        &self,
        schema_name: &str,
        table_name: &str,
        options: &SelectTableOptions,
    ) -> Result<SelectTableOutput, DriverError> {
        let (schema_name, table_name, options) =
            (schema_name.to_string(), table_name.to_string(), options.clone());
        let (result, schema) = self
            .with_connection(move |conn| DbReader::select_table(conn, &schema_name, &table_name, &options))
            .await?;
        Ok(SelectTableOutput { result, schema })
    }

    async fn mutate_rows(
        &self,
        schema_name: &str,
        table_name: &str,
        plans: &[MutationPlan],
        table_schema: &TableSchema,
    ) -> Result<Vec<MutationResult>, DriverError> {
        let (schema_name, table_name) = (schema_name.to_string(), table_name.to_string());
        let (plans, table_schema) = (plans.to_vec(), table_schema.clone());
        let results = self
            .with_connection(move |conn| {
                DbWriter::apply_mutations(conn, &schema_name, &table_name, &plans, &table_schema)
            })
            .await?;
        Ok(results)
    }
}
