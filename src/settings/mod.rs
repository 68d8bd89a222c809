// src/settings/mod.rs
pub mod io;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Layout and timing knobs for a grid. Every field falls back to its default when missing from
/// the settings file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GridSettings {
    /// Debounce window for value/focus/selection notifications.
    pub debounce_ms: u64,
    pub gutter_column_width: u32,
    pub numeric_column_width: u32,
    pub min_column_width: u32,
    pub max_column_width: u32,
    pub width_per_char: u32,
    /// Rows inspected when estimating a text column's width.
    pub width_sample_rows: usize,
    pub page_size: usize,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 5,
            gutter_column_width: 40,
            numeric_column_width: 100,
            min_column_width: 150,
            max_column_width: 500,
            width_per_char: 8,
            width_sample_rows: 100,
            page_size: 50,
        }
    }
}

impl GridSettings {
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// `width_per_char * chars`, clamped to the min/max column width.
    pub fn text_column_width(&self, max_chars: usize) -> u32 {
        let chars = u32::try_from(max_chars).unwrap_or(u32::MAX);
        let lo = self.min_column_width.min(self.max_column_width);
        chars
            .saturating_mul(self.width_per_char)
            .clamp(lo, self.max_column_width)
    }
}
