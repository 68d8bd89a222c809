// src/grid/mod.rs

// --- Public Interface ---
pub mod commit;
pub mod database;
pub mod definitions;
pub mod driver;
pub mod headers;
pub mod mutation;
pub mod notify;
pub mod row_store;
pub mod selection;
pub mod state;

pub use commit::{commit_table_changes, CommitError, CommitExecutor, CommitSummary};
pub use definitions::{
    CellValue, ColumnConstraint, ColumnTypeHint, ForeignKeyConstraint, IndexType, ResultHeader,
    ResultSet, ResultStat, RowValues, SchemaCatalog, TableColumn, TableConstraint, TableIndex,
    TableSchema,
};
pub use driver::{
    ColumnTypeHinter, DataDriver, DriverError, MutationResult, OrderBy, SelectTableOptions,
    SelectTableOutput, SortDirection,
};
pub use headers::{
    build_table_headers, create_table_state_from_result, ColumnSource, ForeignKeyTarget, Header,
    HeaderBuildInput, HeaderMetadata,
};
pub use mutation::{build_mutation_plans, MutationError, MutationPlan, RowMutation};
pub use notify::{Clock, DebouncedFlush, ListenerId, ManualClock, SystemClock};
pub use row_store::{cell_values_equal, ChangeId, ChangeKind, GridRow, RowChange, RowChangeStore};
pub use selection::{CellSelectionStatus, SelectionRange, SelectionSet};
pub use state::{CellEditorType, CellPosition, CellStatus, TableGridState};
