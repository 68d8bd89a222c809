// src/grid/database/reader/queries.rs
// Raw catalog queries. Every function here is read-only.

use super::super::error::DbResult;
use super::super::writer::helpers::quote_identifier;
use rusqlite::{params, Connection, OptionalExtension};

/// One row of `PRAGMA table_xinfo`.
#[derive(Debug, Clone)]
pub struct ColumnInfoRow {
    pub name: String,
    pub column_type: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    /// Position in the primary key, 1-based. 0 when not part of it.
    pub pk_position: i64,
    /// 0 normal, 1 hidden (virtual tables), 2 generated virtual, 3 generated stored.
    pub hidden: i64,
}

/// One row of `PRAGMA foreign_key_list`.
#[derive(Debug, Clone)]
pub struct ForeignKeyRow {
    pub id: i64,
    pub seq: i64,
    pub table: String,
    pub from: String,
    pub to: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IndexRow {
    pub name: String,
    pub unique: bool,
    /// `c` (CREATE INDEX), `u` (UNIQUE constraint) or `pk`.
    pub origin: String,
}

/// `CREATE TABLE` statement for a table, `None` when the table does not exist.
pub fn get_table_sql(conn: &Connection, schema_name: &str, table_name: &str) -> DbResult<Option<String>> {
    let sql = format!(
        "SELECT sql FROM {}.sqlite_master WHERE type = 'table' AND name = ?1",
        quote_identifier(schema_name)
    );
    let found = conn
        .query_row(&sql, params![table_name], |row| row.get::<_, Option<String>>(0))
        .optional()?;
    Ok(found.flatten())
}

pub fn list_table_names(conn: &Connection, schema_name: &str) -> DbResult<Vec<String>> {
    let sql = format!(
        "SELECT name FROM {}.sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        quote_identifier(schema_name)
    );
    let mut stmt = conn.prepare(&sql)?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

pub fn get_table_columns(conn: &Connection, schema_name: &str, table_name: &str) -> DbResult<Vec<ColumnInfoRow>> {
    let sql = format!(
        "PRAGMA {}.table_xinfo({})",
        quote_identifier(schema_name),
        quote_identifier(table_name)
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |r| {
            Ok(ColumnInfoRow {
                name: r.get(1)?,
                column_type: r.get::<_, Option<String>>(2)?.unwrap_or_default(),
                not_null: r.get::<_, i64>(3)? != 0,
                default_value: r.get(4)?,
                pk_position: r.get(5)?,
                hidden: r.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_foreign_keys(conn: &Connection, schema_name: &str, table_name: &str) -> DbResult<Vec<ForeignKeyRow>> {
    let sql = format!(
        "PRAGMA {}.foreign_key_list({})",
        quote_identifier(schema_name),
        quote_identifier(table_name)
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |r| {
            Ok(ForeignKeyRow {
                id: r.get(0)?,
                seq: r.get(1)?,
                table: r.get(2)?,
                from: r.get(3)?,
                to: r.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_indexes(conn: &Connection, schema_name: &str, table_name: &str) -> DbResult<Vec<IndexRow>> {
    let sql = format!(
        "PRAGMA {}.index_list({})",
        quote_identifier(schema_name),
        quote_identifier(table_name)
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |r| {
            Ok(IndexRow {
                name: r.get(1)?,
                unique: r.get::<_, i64>(2)? != 0,
                origin: r.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Indexed column names in key order. Expression columns have no name and are skipped.
pub fn get_index_columns(conn: &Connection, schema_name: &str, index_name: &str) -> DbResult<Vec<String>> {
    let sql = format!(
        "PRAGMA {}.index_info({})",
        quote_identifier(schema_name),
        quote_identifier(index_name)
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |r| r.get::<_, Option<String>>(2))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows.into_iter().flatten().collect())
}
