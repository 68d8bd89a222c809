// src/grid/database/writer/test_helpers.rs
// Test utilities for database reader and writer tests

#![cfg(test)]

use crate::grid::database::connection::DbConnection;
use rusqlite::Connection;

/// In-memory database with an `items` table (autoincrement key, two rows) and a keyless
/// `notes` table (one row).
pub fn setup_items_table() -> Connection {
    let conn = DbConnection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            qty INTEGER NOT NULL DEFAULT 0
        );
        INSERT INTO items (name, qty) VALUES ('apple', 3), ('pear', 5);
        CREATE TABLE notes (body TEXT);
        INSERT INTO notes (body) VALUES ('first');",
    )
    .unwrap();
    conn
}

/// In-memory database exercising every catalog feature the reader understands:
/// - `customers`: single text key
/// - `orders`: autoincrement key, implicit foreign key, generated column, secondary index
/// - `pairs`: composite key, `WITHOUT ROWID`
/// - `logs`: no declared key
pub fn setup_catalog_tables() -> Connection {
    let conn = DbConnection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE customers (cid TEXT PRIMARY KEY, name TEXT);
        INSERT INTO customers VALUES ('c1', 'ann'), ('c2', 'bob');
        CREATE TABLE orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_id TEXT REFERENCES customers,
            qty INTEGER,
            price REAL,
            total REAL GENERATED ALWAYS AS (qty * price) VIRTUAL
        );
        CREATE INDEX idx_orders_customer ON orders(customer_id);
        CREATE TABLE pairs (a TEXT, b TEXT, v TEXT, PRIMARY KEY (a, b)) WITHOUT ROWID;
        CREATE TABLE logs (msg TEXT);
        INSERT INTO logs VALUES ('boot'), ('ready');",
    )
    .unwrap();
    conn
}

pub fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM \"{}\"", table), [], |r| r.get(0))
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_items_table_seeds_rows() {
        let conn = setup_items_table();
        assert_eq!(count_rows(&conn, "items"), 2);
        assert_eq!(count_rows(&conn, "notes"), 1);
    }

    #[test]
    fn test_setup_catalog_tables_creates_tables() {
        let conn = setup_catalog_tables();
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name")
            .unwrap();
        let names: Vec<String> = stmt
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(names, vec!["customers", "logs", "orders", "pairs"]);
    }
}
