// tests/commit_sqlite.rs
// End to end: load a table through the SQLite driver, edit it as a grid, commit, read it back.

use gridstudio::grid::database::SqliteDriver;
use gridstudio::grid::{
    build_mutation_plans, commit_table_changes, create_table_state_from_result, CommitError,
    DataDriver, HeaderBuildInput, HeaderMetadata, RowMutation, RowValues, SelectTableOptions,
    TableGridState, TableSchema,
};
use gridstudio::GridSettings;
use rusqlite::Connection;
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;

fn seed(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("shop.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE vendors (vid INTEGER PRIMARY KEY, label TEXT NOT NULL);
        INSERT INTO vendors VALUES (1, 'acme');
        CREATE TABLE items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            qty INTEGER NOT NULL DEFAULT 0,
            vendor_id INTEGER REFERENCES vendors
        );
        INSERT INTO items (name, qty, vendor_id) VALUES ('apple', 3, 1), ('pear', 5, NULL), ('fig', 1, 1);
        CREATE TABLE notes (body TEXT);
        INSERT INTO notes VALUES ('first'), ('second');",
    )
    .unwrap();
    path
}

async fn load(
    driver: &SqliteDriver,
    table: &str,
    settings: &GridSettings,
) -> (TableGridState<HeaderMetadata>, TableSchema) {
    let options = SelectTableOptions { limit: 100, ..Default::default() };
    let output = driver.select_table("main", table, &options).await.unwrap();
    let catalog = driver.schema_catalog("main").await.unwrap();
    let grid = create_table_state_from_result(
        &HeaderBuildInput {
            driver: Some(driver),
            result: &output.result,
            catalog: Some(&catalog),
            table_schema: Some(&output.schema),
            settings,
        },
        0,
    );
    (grid, output.schema)
}

fn names(db: &Path) -> Vec<(i64, String, i64)> {
    let conn = Connection::open(db).unwrap();
    let mut stmt = conn.prepare("SELECT id, name, qty FROM items ORDER BY id").unwrap();
    stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

#[tokio::test]
async fn headers_carry_keys_and_foreign_keys() {
    let dir = tempfile::tempdir().unwrap();
    let driver = SqliteDriver::open(&seed(&dir)).unwrap();
    let settings = GridSettings::default();
    let (grid, _) = load(&driver, "items", &settings).await;

    let id = grid.header_metadata(grid.column_index("id").unwrap());
    assert!(id.is_primary_key);

    let vendor = grid.header_metadata(grid.column_index("vendor_id").unwrap());
    let fk = vendor.foreign_key.as_ref().unwrap();
    assert_eq!(fk.table_name, "vendors");
    assert_eq!(fk.column_name.as_deref(), Some("vid"));

    assert!(grid.headers().iter().all(|h| !h.readonly));
    assert_eq!(grid.headers()[grid.column_index("qty").unwrap()].initial_width, settings.numeric_column_width);
}

#[tokio::test]
async fn edits_commit_and_fold_back_into_grid() {
    let dir = tempfile::tempdir().unwrap();
    let db = seed(&dir);
    let driver = SqliteDriver::open(&db).unwrap();
    let settings = GridSettings::default();
    let (mut grid, schema) = load(&driver, "items", &settings).await;

    let name = grid.column_index("name").unwrap();
    assert!(grid.change_value(0, name, json!("green apple")));
    assert!(grid.remove_row(Some(1)));
    grid.insert_new_row(Some(3), RowValues::from([("name".to_string(), json!("kiwi"))]));

    let plans = build_mutation_plans(&schema, &grid).unwrap();
    let ops: Vec<_> = plans.iter().map(|p| p.mutation.operation_name()).collect();
    assert_eq!(ops, vec!["UPDATE", "DELETE", "INSERT"]);
    if let RowMutation::Insert { auto_increment_pk_column, .. } = &plans[2].mutation {
        assert_eq!(auto_increment_pk_column.as_deref(), Some("id"));
    }

    let summary = commit_table_changes(&driver, "items", &schema, &mut grid).await.unwrap();
    assert_eq!((summary.inserted, summary.updated, summary.deleted), (1, 1, 1));

    assert_eq!(grid.changed_row_count(), 0);
    assert_eq!(grid.row_count(), 3);
    let id = grid.column_index("id").unwrap();
    let qty = grid.column_index("qty").unwrap();
    assert_eq!(grid.value(2, id), Some(&json!(4)));
    assert_eq!(grid.value(2, qty), Some(&json!(0)));

    assert_eq!(
        names(&db),
        vec![
            (1, "green apple".to_string(), 3),
            (3, "fig".to_string(), 1),
            (4, "kiwi".to_string(), 0),
        ]
    );
}

#[tokio::test]
async fn failed_batch_leaves_database_and_grid_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let db = seed(&dir);
    let driver = SqliteDriver::open(&db).unwrap();
    let settings = GridSettings::default();
    let (mut grid, schema) = load(&driver, "items", &settings).await;

    let name = grid.column_index("name").unwrap();
    grid.change_value(0, name, json!("renamed"));
    // NOT NULL violation
    grid.change_value(1, name, json!(null));

    let err = commit_table_changes(&driver, "items", &schema, &mut grid).await.unwrap_err();
    assert!(matches!(err, CommitError::Driver(_)));
    assert_eq!(grid.changed_row_count(), 2);
    assert_eq!(names(&db)[0].1, "apple");
}

#[tokio::test]
async fn keyless_table_is_edited_by_rowid() {
    let dir = tempfile::tempdir().unwrap();
    let db = seed(&dir);
    let driver = SqliteDriver::open(&db).unwrap();
    let settings = GridSettings::default();
    let (mut grid, schema) = load(&driver, "notes", &settings).await;

    assert_eq!(schema.pk, vec!["rowid".to_string()]);
    let body = grid.column_index("body").unwrap();
    assert!(!grid.headers()[body].readonly);

    grid.change_value(1, body, json!("second, edited"));
    grid.insert_new_row(None, RowValues::from([("body".to_string(), json!("zeroth"))]));
    commit_table_changes(&driver, "notes", &schema, &mut grid).await.unwrap();

    let rowid = grid.column_index("rowid").unwrap();
    assert_eq!(grid.value(0, rowid), Some(&json!(3)));

    let conn = Connection::open(&db).unwrap();
    let edited: String = conn
        .query_row("SELECT body FROM notes WHERE rowid = 2", [], |r| r.get(0))
        .unwrap();
    assert_eq!(edited, "second, edited");
}

#[tokio::test]
async fn nothing_dirty_sends_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let driver = SqliteDriver::open(&seed(&dir)).unwrap();
    let settings = GridSettings::default();
    let (mut grid, schema) = load(&driver, "items", &settings).await;

    let summary = commit_table_changes(&driver, "items", &schema, &mut grid).await.unwrap();
    assert_eq!(summary.total(), 0);
}

#[tokio::test]
async fn paging_and_filters_reach_the_query() {
    let dir = tempfile::tempdir().unwrap();
    let driver = SqliteDriver::open(&seed(&dir)).unwrap();
    let options = SelectTableOptions {
        limit: 1,
        offset: 1,
        order_by: Some(gridstudio::grid::OrderBy {
            column: "qty".into(),
            direction: gridstudio::grid::SortDirection::Desc,
        }),
        where_raw: Some("vendor_id = 1".into()),
    };
    let output = driver.select_table("main", "items", &options).await.unwrap();
    assert_eq!(output.result.rows.len(), 1);
    assert_eq!(output.result.rows[0]["name"], json!("fig"));
}
