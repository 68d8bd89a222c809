// src/grid/row_store.rs
// Sparse per-row change tracking. A row is dirty exactly when it carries a `RowChange`.

use super::definitions::{CellValue, RowValues};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Minted when a row goes from clean to dirty. Strictly increasing per store.
pub type ChangeId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    Inserted,
    Updated,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowChange {
    pub change_id: ChangeId,
    pub kind: ChangeKind,
    /// Only the columns that differ from `raw`.
    pub diff: RowValues,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GridRow {
    raw: RowValues,
    change: Option<RowChange>,
}

impl GridRow {
    pub fn from_raw(raw: RowValues) -> Self {
        Self { raw, change: None }
    }

    pub fn raw(&self) -> &RowValues {
        &self.raw
    }

    pub fn change(&self) -> Option<&RowChange> {
        self.change.as_ref()
    }

    pub fn change_id(&self) -> Option<ChangeId> {
        self.change.as_ref().map(|c| c.change_id)
    }

    pub fn is_dirty(&self) -> bool {
        self.change.is_some()
    }

    pub fn is_new_row(&self) -> bool {
        self.kind() == Some(ChangeKind::Inserted)
    }

    pub fn is_removed(&self) -> bool {
        self.kind() == Some(ChangeKind::Removed)
    }

    pub fn kind(&self) -> Option<ChangeKind> {
        self.change.as_ref().map(|c| c.kind)
    }

    /// Current value of a column: the pending edit if there is one, else the committed value.
    pub fn value(&self, column: &str) -> Option<&CellValue> {
        self.change
            .as_ref()
            .and_then(|c| c.diff.get(column))
            .or_else(|| self.raw.get(column))
    }

    pub fn original_value(&self, column: &str) -> Option<&CellValue> {
        self.raw.get(column)
    }

    pub fn is_cell_changed(&self, column: &str) -> bool {
        self.change
            .as_ref()
            .is_some_and(|c| c.diff.contains_key(column))
    }

    /// Current values of every known column, pending edits applied.
    pub fn current_values(&self) -> RowValues {
        let mut values = self.raw.clone();
        if let Some(change) = &self.change {
            values.extend(change.diff.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        values
    }
}

#[derive(Debug, Clone, Default)]
pub struct RowChangeStore {
    rows: Vec<GridRow>,
    change_counter: ChangeId,
}

impl RowChangeStore {
    pub fn new(rows: Vec<RowValues>) -> Self {
        Self {
            rows: rows.into_iter().map(GridRow::from_raw).collect(),
            change_counter: 0,
        }
    }

    fn next_change_id(&mut self) -> ChangeId {
        self.change_counter += 1;
        self.change_counter
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[GridRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&GridRow> {
        self.rows.get(index)
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.value(column))
    }

    /// Records an edit. Returns `false` for an out-of-bounds row or when nothing changed.
    pub fn set_value(&mut self, row: usize, column: &str, value: CellValue) -> bool {
        let Some(current) = self.rows.get(row) else {
            return false;
        };

        if current
            .raw
            .get(column)
            .is_some_and(|original| cell_values_equal(original, &value))
        {
            let target = &mut self.rows[row];
            let Some(change) = target.change.as_mut() else {
                return false;
            };
            if change.diff.remove(column).is_none() {
                return false;
            }
            // Removed and inserted rows stay dirty with an empty diff.
            if change.kind == ChangeKind::Updated && change.diff.is_empty() {
                target.change = None;
            }
            return true;
        }

        if current
            .change
            .as_ref()
            .and_then(|c| c.diff.get(column))
            .is_some_and(|pending| cell_values_equal(pending, &value))
        {
            return false;
        }

        if current.change.is_none() {
            let change_id = self.next_change_id();
            self.rows[row].change = Some(RowChange {
                change_id,
                kind: ChangeKind::Updated,
                diff: RowValues::new(),
            });
        }

        if let Some(change) = self.rows[row].change.as_mut() {
            change.diff.insert(column.to_string(), value);
        }
        true
    }

    /// Inserts an uncommitted row at `index` (clamped to the row count).
    pub fn insert_row(&mut self, index: usize, initial: RowValues) -> ChangeId {
        let change_id = self.next_change_id();
        let index = index.min(self.rows.len());
        self.rows.insert(
            index,
            GridRow {
                raw: RowValues::new(),
                change: Some(RowChange {
                    change_id,
                    kind: ChangeKind::Inserted,
                    diff: initial,
                }),
            },
        );
        change_id
    }

    /// Drops an uncommitted row outright, otherwise marks the row removed. Pending edits on a
    /// removed row are kept so an undo of the removal is not needed to recover them.
    pub fn remove_row(&mut self, index: usize) -> bool {
        let Some(row) = self.rows.get(index) else {
            return false;
        };

        match row.kind() {
            Some(ChangeKind::Inserted) => {
                self.rows.remove(index);
            }
            Some(ChangeKind::Removed) => return false,
            Some(ChangeKind::Updated) => {
                if let Some(change) = self.rows[index].change.as_mut() {
                    change.kind = ChangeKind::Removed;
                }
            }
            None => {
                let change_id = self.next_change_id();
                self.rows[index].change = Some(RowChange {
                    change_id,
                    kind: ChangeKind::Removed,
                    diff: RowValues::new(),
                });
            }
        }
        true
    }

    /// Dirty rows with their indices, in ascending change id order.
    pub fn changed_rows(&self) -> Vec<(usize, &GridRow)> {
        let mut dirty: Vec<(usize, &GridRow)> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_dirty())
            .collect();
        dirty.sort_by_key(|(_, r)| r.change_id());
        dirty
    }

    pub fn changed_row_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_dirty()).count()
    }

    pub fn removed_row_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_removed()).count()
    }

    /// Reverts every pending change and drops uncommitted rows.
    pub fn discard_all(&mut self) {
        self.rows.retain(|r| !r.is_new_row());
        for row in &mut self.rows {
            row.change = None;
        }
    }

    /// Folds committed changes back into `raw`. Only rows whose change id is in `results` are
    /// touched; any other dirty row keeps its pending change. Values returned by the data source
    /// win over local edits. Committed removals are dropped. Returns whether any row was dropped.
    pub fn apply_changes(&mut self, results: Vec<(ChangeId, Option<RowValues>)>) -> bool {
        let mut committed: HashMap<ChangeId, Option<RowValues>> = results.into_iter().collect();

        let before = self.rows.len();
        self.rows.retain(|r| {
            !(r.is_removed() && r.change_id().is_some_and(|id| committed.contains_key(&id)))
        });
        let removed_any = self.rows.len() != before;

        for row in &mut self.rows {
            let Some(record) = row.change_id().and_then(|id| committed.remove(&id)) else {
                continue;
            };
            if let Some(change) = row.change.take() {
                row.raw.extend(change.diff);
            }
            if let Some(record) = record {
                row.raw.extend(record);
            }
        }

        removed_any
    }
}

/// Deep equality where numbers compare by value, so `2` and `2.0` are the same cell value.
pub fn cell_values_equal(a: &CellValue, b: &CellValue) -> bool {
    match (a, b) {
        (CellValue::Number(x), CellValue::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                x == y
            } else if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                x == y
            } else {
                x.as_f64() == y.as_f64()
            }
        }
        (CellValue::Array(x), CellValue::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| cell_values_equal(x, y))
        }
        (CellValue::Object(x), CellValue::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| cell_values_equal(v, w)))
        }
        _ => a == b,
    }
}
