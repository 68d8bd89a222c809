// src/grid/selection.rs
// Rectangular selection algebra: ranges, merge to fixpoint, split, membership.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Inclusive rectangle in (column, row) index space. Always normalized: `x1 <= x2`, `y1 <= y2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionRange {
    pub x1: usize,
    pub y1: usize,
    pub x2: usize,
    pub y2: usize,
}

impl SelectionRange {
    /// Builds a range from two corners given in any order.
    pub fn new(x1: usize, y1: usize, x2: usize, y2: usize) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    pub fn cell(x: usize, y: usize) -> Self {
        Self { x1: x, y1: y, x2: x, y2: y }
    }

    pub fn width(&self) -> usize {
        self.x2 - self.x1 + 1
    }

    pub fn height(&self) -> usize {
        self.y2 - self.y1 + 1
    }

    pub fn cell_count(&self) -> usize {
        self.width() * self.height()
    }

    pub fn contains_cell(&self, x: usize, y: usize) -> bool {
        x >= self.x1 && x <= self.x2 && y >= self.y1 && y <= self.y2
    }

    /// True when `other` lies entirely inside `self`.
    pub fn contains(&self, other: &SelectionRange) -> bool {
        self.x1 <= other.x1 && self.x2 >= other.x2 && self.y1 <= other.y1 && self.y2 >= other.y2
    }

    pub fn intersection(&self, other: &SelectionRange) -> Option<SelectionRange> {
        let x1 = self.x1.max(other.x1);
        let x2 = self.x2.min(other.x2);
        let y1 = self.y1.max(other.y1);
        let y2 = self.y2.min(other.y2);
        if x1 <= x2 && y1 <= y2 {
            Some(SelectionRange { x1, y1, x2, y2 })
        } else {
            None
        }
    }

    /// Same row span and touching columns, or same column span and touching rows.
    pub fn is_mergeable_with(&self, other: &SelectionRange) -> bool {
        let same_rows = self.y1 == other.y1 && self.y2 == other.y2;
        let same_cols = self.x1 == other.x1 && self.x2 == other.x2;
        (same_rows && (self.x2 + 1 == other.x1 || other.x2 + 1 == self.x1))
            || (same_cols && (self.y2 + 1 == other.y1 || other.y2 + 1 == self.y1))
    }

    fn bounding_box(&self, other: &SelectionRange) -> SelectionRange {
        SelectionRange {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }

    /// Cells of `self` outside `to_remove`, as up to four rectangles: the top and bottom slivers
    /// at full width, then the left and right slivers within the removed row span.
    pub fn split(&self, to_remove: &SelectionRange) -> Vec<SelectionRange> {
        let Some(cut) = self.intersection(to_remove) else {
            return vec![*self];
        };

        let mut pieces = Vec::with_capacity(4);
        if cut.y1 > self.y1 {
            pieces.push(SelectionRange { x1: self.x1, y1: self.y1, x2: self.x2, y2: cut.y1 - 1 });
        }
        if cut.y2 < self.y2 {
            pieces.push(SelectionRange { x1: self.x1, y1: cut.y2 + 1, x2: self.x2, y2: self.y2 });
        }
        if cut.x1 > self.x1 {
            pieces.push(SelectionRange { x1: self.x1, y1: cut.y1, x2: cut.x1 - 1, y2: cut.y2 });
        }
        if cut.x2 < self.x2 {
            pieces.push(SelectionRange { x1: cut.x2 + 1, y1: cut.y1, x2: self.x2, y2: cut.y2 });
        }
        pieces
    }
}

/// Merges contiguous ranges until no pair is mergeable. Each merge removes one range, so the loop
/// runs at most `ranges.len()` times.
pub fn merge_ranges(mut ranges: Vec<SelectionRange>) -> Vec<SelectionRange> {
    loop {
        ranges.sort_by_key(|r| (r.y1, r.x1, r.y2, r.x2));

        let pair = (0..ranges.len()).find_map(|i| {
            ((i + 1)..ranges.len())
                .find(|&j| ranges[i].is_mergeable_with(&ranges[j]))
                .map(|j| (i, j))
        });

        match pair {
            Some((i, j)) => {
                let merged = ranges[i].bounding_box(&ranges[j]);
                ranges.swap_remove(j);
                ranges[i] = merged;
            }
            None => return ranges,
        }
    }
}

/// Selection flags a renderer needs for one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellSelectionStatus {
    pub is_selected: bool,
    pub is_border_right: bool,
    pub is_border_bottom: bool,
}

/// A normalized set of non-overlapping, pairwise non-mergeable ranges.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectionSet {
    ranges: Vec<SelectionRange>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_range(range: SelectionRange) -> Self {
        Self { ranges: vec![range] }
    }

    /// Normalizes arbitrary (possibly overlapping) ranges into a set covering their union.
    pub fn from_ranges(ranges: impl IntoIterator<Item = SelectionRange>) -> Self {
        ranges
            .into_iter()
            .fold(Self::new(), |set, range| set.union_range(range))
    }

    pub fn ranges(&self) -> &[SelectionRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn cell_count(&self) -> usize {
        self.ranges.iter().map(SelectionRange::cell_count).sum()
    }

    /// Index of the first range that wholly contains `range`.
    pub fn find_containing(&self, range: &SelectionRange) -> Option<usize> {
        self.ranges.iter().position(|r| r.contains(range))
    }

    /// Adds the cells of `range` that are not selected yet.
    pub fn union_range(&self, range: SelectionRange) -> SelectionSet {
        let mut pieces = vec![range];
        for existing in &self.ranges {
            pieces = pieces.iter().flat_map(|p| p.split(existing)).collect();
            if pieces.is_empty() {
                return self.clone();
            }
        }

        let mut ranges = self.ranges.clone();
        ranges.extend(pieces);
        SelectionSet { ranges: merge_ranges(ranges) }
    }

    /// Toggle semantics: a rectangle already inside one selected range is carved out of it,
    /// anything else is added.
    pub fn toggle_range(&self, range: SelectionRange) -> SelectionSet {
        match self.find_containing(&range) {
            Some(idx) => {
                let mut ranges = self.ranges.clone();
                let existing = ranges.remove(idx);
                ranges.extend(existing.split(&range));
                SelectionSet { ranges: merge_ranges(ranges) }
            }
            None => self.union_range(range),
        }
    }

    pub fn contains_cell(&self, x: usize, y: usize) -> bool {
        self.range_at(x, y).is_some()
    }

    pub fn range_at(&self, x: usize, y: usize) -> Option<&SelectionRange> {
        self.ranges.iter().find(|r| r.contains_cell(x, y))
    }

    pub fn is_row_selected(&self, y: usize) -> bool {
        self.ranges.iter().any(|r| y >= r.y1 && y <= r.y2)
    }

    /// Distinct selected row indices, ascending.
    pub fn selected_rows(&self) -> Vec<usize> {
        let rows: BTreeSet<usize> = self.ranges.iter().flat_map(|r| r.y1..=r.y2).collect();
        rows.into_iter().collect()
    }

    /// Distinct selected column indices, ascending.
    pub fn selected_columns(&self) -> Vec<usize> {
        let cols: BTreeSet<usize> = self.ranges.iter().flat_map(|r| r.x1..=r.x2).collect();
        cols.into_iter().collect()
    }

    fn spans_all_columns(range: &SelectionRange, header_count: usize) -> bool {
        header_count > 0 && range.x1 == 0 && range.x2 == header_count - 1
    }

    fn spans_all_rows(range: &SelectionRange, row_count: usize) -> bool {
        row_count > 0 && range.y1 == 0 && range.y2 == row_count - 1
    }

    pub fn is_full_row(&self, y: usize, header_count: usize) -> bool {
        self.ranges
            .iter()
            .any(|r| r.y1 <= y && r.y2 >= y && Self::spans_all_columns(r, header_count))
    }

    pub fn full_rows(&self, header_count: usize) -> Vec<usize> {
        let rows: BTreeSet<usize> = self
            .ranges
            .iter()
            .filter(|r| Self::spans_all_columns(r, header_count))
            .flat_map(|r| r.y1..=r.y2)
            .collect();
        rows.into_iter().collect()
    }

    pub fn is_full_column(&self, x: usize, row_count: usize) -> bool {
        self.ranges
            .iter()
            .any(|r| r.x1 <= x && r.x2 >= x && Self::spans_all_rows(r, row_count))
    }

    pub fn full_columns(&self, row_count: usize) -> Vec<usize> {
        let cols: BTreeSet<usize> = self
            .ranges
            .iter()
            .filter(|r| Self::spans_all_rows(r, row_count))
            .flat_map(|r| r.x1..=r.x2)
            .collect();
        cols.into_iter().collect()
    }

    pub fn cell_status(&self, x: usize, y: usize) -> CellSelectionStatus {
        let mut status = CellSelectionStatus::default();

        for r in &self.ranges {
            if y >= r.y1 && y <= r.y2 {
                if x >= r.x1 && x <= r.x2 {
                    status.is_selected = true;
                }
                if x == r.x2 || x + 1 == r.x1 {
                    status.is_border_right = true;
                }
            }

            if x >= r.x1 && x <= r.x2 && (y == r.y2 || y + 1 == r.y1) {
                status.is_border_bottom = true;
            }
        }

        status
    }
}
