// src/grid/driver.rs
// Contract between the grid core and whatever executes queries.

use super::definitions::{ColumnTypeHint, ResultSet, RowValues, TableSchema};
use super::mutation::MutationPlan;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Any failure a driver reports. The core passes it through untouched.
pub type DriverError = Box<dyn std::error::Error + Send + Sync>;

/// Maps a declared column type to a display hint.
pub trait ColumnTypeHinter {
    fn column_type_hint(&self, column_type: Option<&str>) -> Option<ColumnTypeHint>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    #[serde(default)]
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectTableOptions {
    pub limit: usize,
    pub offset: usize,
    #[serde(default)]
    pub order_by: Option<OrderBy>,
    /// Raw filter expression appended after `WHERE`, supplied by the user.
    #[serde(default)]
    pub where_raw: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectTableOutput {
    pub result: ResultSet,
    pub schema: TableSchema,
}

/// Outcome of one plan entry, positionally aligned with the submitted plans.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MutationResult {
    /// Row as stored after the mutation. `None` for deletes.
    pub record: Option<RowValues>,
    #[serde(default)]
    pub last_insert_id: Option<i64>,
}

#[async_trait]
pub trait DataDriver: ColumnTypeHinter + Send + Sync {
    async fn select_table(
        &self,
        schema_name: &str,
        table_name: &str,
        options: &SelectTableOptions,
    ) -> Result<SelectTableOutput, DriverError>;

    /// Executes every plan as one batch. Returns exactly one result per plan, in order.
    async fn mutate_rows(
        &self,
        schema_name: &str,
        table_name: &str,
        plans: &[MutationPlan],
        table_schema: &TableSchema,
    ) -> Result<Vec<MutationResult>, DriverError>;
}
