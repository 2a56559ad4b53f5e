//! Relational store boundary
//!
//! The planner never executes row-level work itself. It needs a store that
//! can report table metadata, run a grouped count and execute one
//! materializing statement.

mod errors;
mod sqlite;

pub use errors::{StoreError, StoreResult};
pub use sqlite::SqliteStore;

/// Relational store consumed by the balancer
pub trait RelationalStore {
    /// True if a table or view with this name exists
    fn table_exists(&self, name: &str) -> StoreResult<bool>;

    /// Column names in schema order; empty if the table does not exist
    fn table_columns(&self, name: &str) -> StoreResult<Vec<String>>;

    /// Runs a two-column `(level, count)` query
    fn level_counts(&self, query: &str) -> StoreResult<Vec<(Option<String>, u64)>>;

    fn row_count(&self, table: &str) -> StoreResult<u64>;

    /// Executes a statement that returns no rows
    fn execute(&mut self, statement: &str) -> StoreResult<()>;
}
