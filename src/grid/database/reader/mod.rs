// src/grid/database/reader/mod.rs
// Schema introspection and paged table reads.

pub mod queries;

use super::error::{DbError, DbResult};
use super::values::{column_type_hint, row_to_values};
use super::writer::helpers::{quote_identifier, quote_qualified};
use crate::grid::definitions::{
    ColumnConstraint, ForeignKeyConstraint, IndexType, ResultHeader, ResultSet, ResultStat,
    SchemaCatalog, TableColumn, TableConstraint, TableIndex, TableSchema,
};
use crate::grid::driver::SelectTableOptions;
use queries::{ColumnInfoRow, ForeignKeyRow};
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::debug;

pub struct DbReader;

impl DbReader {
    /// Reads columns, keys, foreign keys and indexes of a table.
    pub fn table_schema(conn: &Connection, schema_name: &str, table_name: &str) -> DbResult<TableSchema> {
        let create_sql = queries::get_table_sql(conn, schema_name, table_name)?
            .ok_or_else(|| DbError::TableNotFound(format!("{}.{}", schema_name, table_name)))?;

        let column_rows: Vec<ColumnInfoRow> = queries::get_table_columns(conn, schema_name, table_name)?
            .into_iter()
            .filter(|c| c.hidden != 1)
            .collect();

        let mut pk_columns: Vec<&ColumnInfoRow> = column_rows.iter().filter(|c| c.pk_position > 0).collect();
        pk_columns.sort_by_key(|c| c.pk_position);
        let pk: Vec<String> = pk_columns.iter().map(|c| c.name.clone()).collect();

        let without_row_id = has_without_rowid(&create_sql);
        let auto_increment = pk.len() == 1
            && (has_autoincrement(&create_sql)
                || (!without_row_id && pk_columns[0].column_type.eq_ignore_ascii_case("INTEGER")));

        let fk_rows = queries::get_foreign_keys(conn, schema_name, table_name)?;
        let mut fk_groups: BTreeMap<i64, Vec<ForeignKeyRow>> = BTreeMap::new();
        for row in fk_rows {
            fk_groups.entry(row.id).or_default().push(row);
        }

        let mut column_fks: BTreeMap<String, ForeignKeyConstraint> = BTreeMap::new();
        let mut constraints = Vec::new();
        for mut group in fk_groups.into_values() {
            group.sort_by_key(|r| r.seq);
            let foreign_columns: Vec<String> = if group.iter().all(|r| r.to.is_some()) {
                group.iter().filter_map(|r| r.to.clone()).collect()
            } else {
                Vec::new()
            };
            let fk = ForeignKeyConstraint {
                foreign_schema_name: None,
                foreign_table_name: group[0].table.clone(),
                columns: group.iter().map(|r| r.from.clone()).collect(),
                foreign_columns,
            };
            if group.len() == 1 {
                column_fks.insert(group[0].from.to_ascii_lowercase(), ForeignKeyConstraint { columns: Vec::new(), ..fk });
            } else {
                constraints.push(TableConstraint {
                    name: None,
                    primary_key: None,
                    foreign_key: Some(fk),
                });
            }
        }

        if pk.len() > 1 {
            constraints.push(TableConstraint {
                name: None,
                primary_key: Some(pk.clone()),
                foreign_key: None,
            });
        }

        let columns = column_rows
            .iter()
            .map(|c| {
                let generated_expression = if c.hidden == 2 || c.hidden == 3 {
                    Some(generated_expression(&create_sql, &c.name).unwrap_or_default())
                } else {
                    None
                };
                let is_pk = c.pk_position > 0;
                TableColumn {
                    name: c.name.clone(),
                    column_type: c.column_type.clone(),
                    constraint: Some(ColumnConstraint {
                        primary_key: is_pk && pk.len() == 1,
                        auto_increment: is_pk && auto_increment,
                        not_null: c.not_null,
                        default_expression: c.default_value.clone(),
                        foreign_key: column_fks.remove(&c.name.to_ascii_lowercase()),
                        generated_expression,
                    }),
                }
            })
            .collect();

        let mut indexes = Vec::new();
        for index in queries::get_indexes(conn, schema_name, table_name)? {
            let index_type = match (index.origin.as_str(), index.unique) {
                ("pk", _) => IndexType::Primary,
                (_, true) => IndexType::Unique,
                _ => IndexType::Key,
            };
            indexes.push(TableIndex {
                columns: queries::get_index_columns(conn, schema_name, &index.name)?,
                name: index.name,
                index_type,
            });
        }

        Ok(TableSchema {
            schema_name: schema_name.to_string(),
            table_name: Some(table_name.to_string()),
            pk,
            auto_increment,
            columns,
            constraints,
            indexes,
            without_row_id,
        })
    }

    /// Every table of one schema, keyed by schema name.
    pub fn schema_catalog(conn: &Connection, schema_name: &str) -> DbResult<SchemaCatalog> {
        let tables = queries::list_table_names(conn, schema_name)?
            .iter()
            .map(|name| Self::table_schema(conn, schema_name, name))
            .collect::<DbResult<Vec<_>>>()?;
        Ok(BTreeMap::from([(schema_name.to_string(), tables)]))
    }

    /// Reads one page of a table. Tables without a declared key (and with a rowid) get `rowid`
    /// selected and injected as their key.
    pub fn select_table(
        conn: &Connection,
        schema_name: &str,
        table_name: &str,
        options: &SelectTableOptions,
    ) -> DbResult<(ResultSet, TableSchema)> {
        let mut schema = Self::table_schema(conn, schema_name, table_name)?;

        let inject_rowid = schema.pk.is_empty()
            && !schema.without_row_id
            && schema.column("rowid").is_none();
        if inject_rowid {
            schema.columns.insert(
                0,
                TableColumn {
                    name: "rowid".to_string(),
                    column_type: "INTEGER".to_string(),
                    constraint: Some(ColumnConstraint {
                        primary_key: true,
                        auto_increment: true,
                        ..Default::default()
                    }),
                },
            );
            schema.pk = vec!["rowid".to_string()];
            schema.auto_increment = true;
        }

        let mut sql = format!(
            "SELECT {} FROM {}",
            if inject_rowid { "rowid, *" } else { "*" },
            quote_qualified(schema_name, table_name)
        );
        if let Some(filter) = options.where_raw.as_deref().map(str::trim).filter(|w| !w.is_empty()) {
            sql.push_str(&format!(" WHERE {}", filter));
        }
        if let Some(order) = &options.order_by {
            sql.push_str(&format!(
                " ORDER BY {} {}",
                quote_identifier(&order.column),
                order.direction.as_sql()
            ));
        }
        sql.push_str(" LIMIT ?1 OFFSET ?2");
        debug!("DbReader: {}", sql);

        let started = Instant::now();
        let mut stmt = conn.prepare(&sql)?;
        let column_names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let rows = stmt
            .query_map(
                params![options.limit as i64, options.offset as i64],
                |row| row_to_values(row, &column_names),
            )?
            .collect::<Result<Vec<_>, _>>()?;
        let elapsed = started.elapsed();

        let headers = column_names
            .iter()
            .map(|name| {
                let original_type = schema
                    .column(name)
                    .map(|c| c.column_type.clone())
                    .filter(|t| !t.is_empty());
                ResultHeader {
                    type_hint: column_type_hint(original_type.as_deref()),
                    original_type,
                    ..ResultHeader::new(name.clone())
                }
            })
            .collect();

        let result = ResultSet {
            headers,
            stat: ResultStat {
                rows_read: rows.len() as u64,
                query_duration_ms: Some(elapsed.as_secs_f64() * 1000.0),
                ..Default::default()
            },
            rows,
            last_insert_rowid: None,
        };
        Ok((result, schema))
    }
}

fn normalized_upper(sql: &str) -> String {
    sql.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase()
}

fn has_autoincrement(create_sql: &str) -> bool {
    normalized_upper(create_sql).contains("AUTOINCREMENT")
}

fn has_without_rowid(create_sql: &str) -> bool {
    let upper = normalized_upper(create_sql);
    upper
        .rfind(')')
        .is_some_and(|close| upper[close..].contains("WITHOUT ROWID"))
}

/// Splits the body of a `CREATE TABLE` into top-level definitions.
fn column_definitions(create_sql: &str) -> Vec<&str> {
    let Some(open) = create_sql.find('(') else {
        return Vec::new();
    };

    let mut defs = Vec::new();
    let mut depth = 0usize;
    let mut start = open + 1;
    let mut quote: Option<char> = None;

    for (idx, ch) in create_sql.char_indices().skip_while(|(i, _)| *i <= open) {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => quote = Some(ch),
            (None, '[') => quote = Some(']'),
            (None, '(') => depth += 1,
            (None, ')') if depth == 0 => {
                defs.push(&create_sql[start..idx]);
                break;
            }
            (None, ')') => depth -= 1,
            (None, ',') if depth == 0 => {
                defs.push(&create_sql[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    defs
}

fn unquote(token: &str) -> &str {
    token.trim_matches(|c| matches!(c, '"' | '`' | '[' | ']' | '\''))
}

/// Expression of a generated column, read from its `AS (...)` clause.
fn generated_expression(create_sql: &str, column: &str) -> Option<String> {
    let def = column_definitions(create_sql).into_iter().find(|def| {
        def.split_whitespace()
            .next()
            .is_some_and(|first| unquote(first).eq_ignore_ascii_case(column))
    })?;

    let upper = def.to_ascii_uppercase();
    let as_pos = upper.match_indices("AS").find_map(|(pos, _)| {
        let before_ok = pos == 0 || !upper.as_bytes()[pos - 1].is_ascii_alphanumeric();
        let rest = upper[pos + 2..].trim_start();
        (before_ok && rest.starts_with('(')).then_some(pos)
    })?;

    let open = as_pos + def[as_pos..].find('(')?;
    let mut depth = 0usize;
    for (idx, ch) in def[open..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(def[open + 1..open + idx].trim().to_string());
                }
            }
            _ => {}
        }
    }
    None
}
