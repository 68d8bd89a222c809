// src/grid/database/mod.rs
// SQLite implementation of the driver contract. All rusqlite access lives under this module.

pub mod connection;
pub mod driver;
pub mod error;
pub mod reader;
pub mod values;
pub mod writer;

pub use connection::DbConnection;
pub use driver::SqliteDriver;
pub use error::{DbError, DbResult};
pub use reader::DbReader;
pub use writer::DbWriter;
