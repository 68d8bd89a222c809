// src/lib.rs

//! In-memory tabular editing engine for data-grid front ends.
//!
//! The [`grid`] module holds the selection algebra, the change-tracking row store, the grid state
//! that composes them, the header metadata builder and the mutation planner/commit executor.
//! [`grid::database`] is a SQLite implementation of the driver contract.

pub mod cli;
pub mod grid;
pub mod settings;

pub use grid::{
    build_mutation_plans, build_table_headers, commit_table_changes,
    create_table_state_from_result, DataDriver, Header, HeaderMetadata, MutationPlan,
    SelectionRange, TableGridState, TableSchema,
};
pub use settings::GridSettings;
