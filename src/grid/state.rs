// src/grid/state.rs
// Grid state: rows with pending changes, selection, focus, edit mode and change notifications.

use super::definitions::{CellValue, RowValues};
use super::headers::{Header, HeaderMetadata};
use super::notify::{Clock, DebouncedFlush, ListenerId, SystemClock};
use super::row_store::{ChangeId, GridRow, RowChangeStore};
use super::selection::{SelectionRange, SelectionSet};
use crate::settings::GridSettings;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellEditorType {
    Input,
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellPosition {
    pub row: usize,
    pub col: usize,
}

/// Everything a renderer needs to paint one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellStatus {
    pub is_focus: bool,
    pub is_selected: bool,
    pub is_border_right: bool,
    pub is_border_bottom: bool,
    pub is_changed: bool,
}

type Listener<M> = Box<dyn FnMut(&TableGridState<M>)>;

/// Editable view over one page of a table.
///
/// Structural changes (insert, remove, discard, apply) notify listeners immediately. Value, focus
/// and selection changes are debounced, and the grid owns no timer: a debounced notification is
/// only delivered when the owner calls [`poll_notifications`](Self::poll_notifications) after
/// [`next_notification_deadline`](Self::next_notification_deadline), or forces it with
/// [`flush_notifications`](Self::flush_notifications). Embedders must drive this from their own
/// loop, such as a frame update or a `tokio::time::interval`:
///
/// ```text
/// let mut tick = tokio::time::interval(settings.debounce_window());
/// loop {
///     tick.tick().await;
///     grid.poll_notifications();
/// }
/// ```
pub struct TableGridState<M = HeaderMetadata> {
    headers: Vec<Header<M>>,
    header_widths: Vec<u32>,
    store: RowChangeStore,
    selection: SelectionSet,
    focus: Option<CellPosition>,
    edit_mode: bool,
    forced_editor: Option<(CellPosition, CellEditorType)>,
    read_only_mode: bool,
    gutter_column_width: u32,
    row_number_offset: usize,
    listeners: Vec<(ListenerId, Listener<M>)>,
    next_listener_id: u64,
    flush: DebouncedFlush,
    clock: Box<dyn Clock>,
}

impl<M> TableGridState<M> {
    pub fn new(headers: Vec<Header<M>>, rows: Vec<RowValues>, settings: GridSettings) -> Self {
        let header_widths = headers.iter().map(|h| h.initial_width).collect();
        Self {
            headers,
            header_widths,
            store: RowChangeStore::new(rows),
            selection: SelectionSet::new(),
            focus: None,
            edit_mode: false,
            forced_editor: None,
            read_only_mode: false,
            gutter_column_width: settings.gutter_column_width,
            row_number_offset: 0,
            listeners: Vec::new(),
            next_listener_id: 0,
            flush: DebouncedFlush::new(settings.debounce_window()),
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    // --- Notifications ---

    /// Registers a listener. Listeners run in reverse registration order.
    pub fn add_change_listener(&mut self, listener: impl FnMut(&TableGridState<M>) + 'static) -> ListenerId {
        self.next_listener_id += 1;
        let id = ListenerId(self.next_listener_id);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn remove_change_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    fn notify_listeners(&mut self) {
        let mut listeners = std::mem::take(&mut self.listeners);
        trace!("TableGridState: notifying {} listeners", listeners.len());
        for (_, listener) in listeners.iter_mut().rev() {
            listener(&*self);
        }
        self.listeners = listeners;
    }

    /// Instant: cancel any pending flush, notify now, then schedule a trailing flush.
    /// Debounced: schedule a flush unless one is already pending.
    fn broadcast_change(&mut self, instant: bool) {
        let now = self.clock.now();
        if instant {
            self.flush.cancel();
            self.notify_listeners();
            self.flush.reschedule(now);
        } else {
            self.flush.schedule(now);
        }
    }

    /// Runs the pending flush if its deadline has passed. Returns whether listeners were called.
    pub fn poll_notifications(&mut self) -> bool {
        if self.flush.take_due(self.clock.now()) {
            self.notify_listeners();
            true
        } else {
            false
        }
    }

    /// Runs the pending flush now, regardless of its deadline.
    pub fn flush_notifications(&mut self) -> bool {
        if self.flush.cancel() {
            self.notify_listeners();
            true
        } else {
            false
        }
    }

    pub fn next_notification_deadline(&self) -> Option<Instant> {
        self.flush.deadline()
    }

    pub fn has_pending_notification(&self) -> bool {
        self.flush.is_pending()
    }

    // --- Modes and layout ---

    pub fn set_read_only_mode(&mut self, read_only: bool) {
        self.read_only_mode = read_only;
    }

    pub fn read_only_mode(&self) -> bool {
        self.read_only_mode
    }

    pub fn gutter_column_width(&self) -> u32 {
        self.gutter_column_width
    }

    pub fn set_gutter_column_width(&mut self, width: u32) {
        self.gutter_column_width = width;
    }

    pub fn row_number_offset(&self) -> usize {
        self.row_number_offset
    }

    pub fn set_row_number_offset(&mut self, offset: usize) {
        self.row_number_offset = offset;
    }

    // --- Headers ---

    pub fn headers(&self) -> &[Header<M>] {
        &self.headers
    }

    pub fn header(&self, idx: usize) -> Option<&Header<M>> {
        self.headers.get(idx)
    }

    pub fn header_count(&self) -> usize {
        self.headers.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.name == name)
    }

    /// # Panics
    ///
    /// Panics if `idx` is not a header index.
    pub fn header_metadata(&self, idx: usize) -> &M {
        match self.headers.get(idx) {
            Some(header) => &header.metadata,
            None => panic!(
                "header index {} out of range for {} headers",
                idx,
                self.headers.len()
            ),
        }
    }

    pub fn header_widths(&self) -> &[u32] {
        &self.header_widths
    }

    pub fn set_header_width(&mut self, idx: usize, width: u32) {
        if let Some(slot) = self.header_widths.get_mut(idx) {
            *slot = width;
        }
    }

    // --- Rows and values ---

    pub fn row_count(&self) -> usize {
        self.store.len()
    }

    pub fn store(&self) -> &RowChangeStore {
        &self.store
    }

    pub fn rows(&self) -> &[GridRow] {
        self.store.rows()
    }

    pub fn row(&self, idx: usize) -> Option<&GridRow> {
        self.store.row(idx)
    }

    pub fn is_new_row(&self, idx: usize) -> bool {
        self.store.row(idx).is_some_and(GridRow::is_new_row)
    }

    pub fn is_removed_row(&self, idx: usize) -> bool {
        self.store.row(idx).is_some_and(GridRow::is_removed)
    }

    pub fn value(&self, row: usize, col: usize) -> Option<&CellValue> {
        let header = self.headers.get(col)?;
        self.store.value(row, &header.name)
    }

    pub fn original_value(&self, row: usize, col: usize) -> Option<&CellValue> {
        let header = self.headers.get(col)?;
        self.store.row(row)?.original_value(&header.name)
    }

    pub fn has_cell_change(&self, row: usize, col: usize) -> bool {
        match (self.headers.get(col), self.store.row(row)) {
            (Some(header), Some(r)) => r.is_cell_changed(&header.name),
            _ => false,
        }
    }

    /// Records an edit. Ignored in read-only mode, on read-only columns and outside the table.
    pub fn change_value(&mut self, row: usize, col: usize, value: CellValue) -> bool {
        if self.read_only_mode {
            return false;
        }
        let Some(header) = self.headers.get(col) else {
            return false;
        };
        if header.readonly {
            return false;
        }

        let name = header.name.clone();
        let changed = self.store.set_value(row, &name, value);
        if changed {
            self.broadcast_change(false);
        }
        changed
    }

    /// Dirty rows in the order they were first changed.
    pub fn changed_rows(&self) -> Vec<(usize, &GridRow)> {
        self.store.changed_rows()
    }

    pub fn changed_row_count(&self) -> usize {
        self.store.changed_row_count()
    }

    pub fn removed_row_count(&self) -> usize {
        self.store.removed_row_count()
    }

    pub fn discard_all_changes(&mut self) {
        self.store.discard_all();
        self.clamp_focus();
        self.broadcast_change(true);
    }

    /// Folds committed results into the rows. Selection is cleared when rows disappear.
    pub fn apply_changes(&mut self, results: Vec<(ChangeId, Option<RowValues>)>) {
        if self.store.apply_changes(results) {
            self.selection = SelectionSet::new();
            self.clamp_focus();
        }
        self.broadcast_change(true);
    }

    /// Inserts a new row at `index`, or at the focused row, or at the top.
    pub fn insert_new_row(&mut self, index: Option<usize>, initial: RowValues) -> ChangeId {
        let at = index
            .or_else(|| self.focus.map(|f| f.row))
            .unwrap_or(0);
        let change_id = self.store.insert_row(at, initial);
        self.broadcast_change(true);
        change_id
    }

    /// Removes the row at `index`, or the focused row.
    pub fn remove_row(&mut self, index: Option<usize>) -> bool {
        let Some(at) = index.or_else(|| self.focus.map(|f| f.row)) else {
            return false;
        };
        let removed = self.store.remove_row(at);
        if removed {
            self.clamp_focus();
            self.broadcast_change(true);
        }
        removed
    }

    // --- Focus and editing ---

    fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.store.len() && col < self.headers.len()
    }

    fn clamp_focus(&mut self) {
        if let Some(f) = self.focus {
            if !self.in_bounds(f.row, f.col) {
                self.focus = None;
                self.forced_editor = None;
            }
        }
    }

    pub fn focus(&self) -> Option<CellPosition> {
        self.focus
    }

    pub fn has_focus(&self, row: usize, col: usize) -> bool {
        self.focus == Some(CellPosition { row, col })
    }

    /// Moves focus to a cell inside the table. Out-of-bounds targets are ignored.
    pub fn set_focus(&mut self, row: usize, col: usize) -> bool {
        if !self.in_bounds(row, col) {
            return false;
        }
        let target = CellPosition { row, col };
        if self.forced_editor.is_some_and(|(pos, _)| pos != target) {
            self.forced_editor = None;
        }
        self.focus = Some(target);
        self.broadcast_change(false);
        true
    }

    pub fn clear_focus(&mut self) {
        self.focus = None;
        self.forced_editor = None;
        self.broadcast_change(false);
    }

    pub fn focus_value(&self) -> Option<&CellValue> {
        let f = self.focus?;
        self.value(f.row, f.col)
    }

    pub fn set_focus_value(&mut self, value: CellValue) -> bool {
        match self.focus {
            Some(f) => self.change_value(f.row, f.col, value),
            None => false,
        }
    }

    pub fn is_in_edit_mode(&self) -> bool {
        self.edit_mode
    }

    /// Enters edit mode, optionally forcing an editor type for the focused cell only.
    pub fn enter_edit_mode(&mut self, editor: Option<CellEditorType>) {
        self.edit_mode = true;
        self.forced_editor = match (editor, self.focus) {
            (Some(editor), Some(pos)) => Some((pos, editor)),
            _ => None,
        };
        self.broadcast_change(false);
    }

    pub fn exit_edit_mode(&mut self) {
        self.edit_mode = false;
        self.broadcast_change(false);
    }

    pub fn forced_editor_type(&self) -> Option<CellEditorType> {
        let focus = self.focus?;
        match self.forced_editor {
            Some((pos, editor)) if pos == focus => Some(editor),
            _ => None,
        }
    }

    // --- Selection ---

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn selection_ranges(&self) -> &[SelectionRange] {
        self.selection.ranges()
    }

    fn replace_selection(&mut self, selection: SelectionSet) {
        self.selection = selection;
        self.broadcast_change(false);
    }

    pub fn set_selection_ranges(&mut self, ranges: Vec<SelectionRange>) {
        self.replace_selection(SelectionSet::from_ranges(ranges));
    }

    pub fn clear_selection(&mut self) {
        self.replace_selection(SelectionSet::new());
    }

    fn last_col(&self) -> Option<usize> {
        self.headers.len().checked_sub(1)
    }

    fn last_row(&self) -> Option<usize> {
        self.store.len().checked_sub(1)
    }

    pub fn select_row(&mut self, row: usize) {
        self.select_row_range(row, row);
    }

    pub fn select_row_range(&mut self, row1: usize, row2: usize) {
        if let Some(last_col) = self.last_col() {
            self.replace_selection(SelectionSet::from_range(SelectionRange::new(0, row1, last_col, row2)));
        }
    }

    pub fn select_column(&mut self, col: usize) {
        self.select_column_range(col, col);
    }

    pub fn select_column_range(&mut self, col1: usize, col2: usize) {
        if let Some(last_row) = self.last_row() {
            self.replace_selection(SelectionSet::from_range(SelectionRange::new(col1, 0, col2, last_row)));
        }
    }

    /// Selects a single cell and, when `focus` is set, focuses it too.
    pub fn select_cell(&mut self, row: usize, col: usize, focus: bool) {
        self.selection = SelectionSet::from_range(SelectionRange::cell(col, row));
        if !(focus && self.set_focus(row, col)) {
            self.broadcast_change(false);
        }
    }

    pub fn select_cell_range(&mut self, row1: usize, col1: usize, row2: usize, col2: usize) {
        self.replace_selection(SelectionSet::from_range(SelectionRange::new(col1, row1, col2, row2)));
    }

    /// Adds a rectangle to the selection, or carves it out if one range already contains it.
    pub fn add_selection_range(&mut self, row1: usize, col1: usize, row2: usize, col2: usize) {
        let next = self
            .selection
            .toggle_range(SelectionRange::new(col1, row1, col2, row2));
        self.replace_selection(next);
    }

    pub fn add_selection_row(&mut self, row: usize) {
        if let Some(last_col) = self.last_col() {
            self.add_selection_range(row, 0, row, last_col);
        }
    }

    pub fn add_selection_column(&mut self, col: usize) {
        if let Some(last_row) = self.last_row() {
            self.add_selection_range(0, col, last_row, col);
        }
    }

    pub fn selected_row_indices(&self) -> Vec<usize> {
        self.selection.selected_rows()
    }

    pub fn selected_column_indices(&self) -> Vec<usize> {
        self.selection.selected_columns()
    }

    pub fn selected_row_count(&self) -> usize {
        self.selection.selected_rows().len()
    }

    /// Current values of every selected row, one entry per header. Missing cells are `Null`.
    pub fn selected_rows_values(&self) -> Vec<Vec<CellValue>> {
        self.selection
            .selected_rows()
            .into_iter()
            .filter(|&row| row < self.store.len())
            .map(|row| {
                (0..self.headers.len())
                    .map(|col| self.value(row, col).cloned().unwrap_or(CellValue::Null))
                    .collect()
            })
            .collect()
    }

    pub fn is_row_selected(&self, row: usize) -> bool {
        self.selection.is_row_selected(row)
    }

    pub fn selection_range_at(&self, row: usize, col: usize) -> Option<&SelectionRange> {
        self.selection.range_at(col, row)
    }

    pub fn is_full_selection_row(&self, row: usize) -> bool {
        self.selection.is_full_row(row, self.headers.len())
    }

    pub fn is_full_selection_column(&self, col: usize) -> bool {
        self.selection.is_full_column(col, self.store.len())
    }

    pub fn full_selection_row_indices(&self) -> Vec<usize> {
        self.selection.full_rows(self.headers.len())
    }

    pub fn full_selection_column_indices(&self) -> Vec<usize> {
        self.selection.full_columns(self.store.len())
    }

    pub fn cell_status(&self, row: usize, col: usize) -> CellStatus {
        let selection = self.selection.cell_status(col, row);
        CellStatus {
            is_focus: self.has_focus(row, col),
            is_selected: selection.is_selected,
            is_border_right: selection.is_border_right,
            is_border_bottom: selection.is_border_bottom,
            is_changed: self.has_cell_change(row, col),
        }
    }
}
