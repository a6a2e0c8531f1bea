//! Connection collaborator interface
//!
//! The core never talks to a wire protocol. A driver supplies something
//! implementing [`Connection`]; the builder hands it compiled SQL with
//! positional `?` placeholders plus the ordered bind list and consumes
//! JSON rows back.

use crate::error::Result;
use crate::value::SqlValue;

pub mod recording;

pub use recording::{RecordingConnection, StatementLog};

/// One result row, keyed by column name.
pub type Row = serde_json::Value;

/// Outcome of a statement that modifies data.
#[derive(Debug, Clone, Default)]
pub struct ExecResult {
    pub rows_affected: u64,
    pub last_insert_id: Option<i64>,
}

/// Introspection categories a driver may answer directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataKind {
    Tables,
    Columns,
    ForeignKeys,
    Indexes,
    Types,
    Views,
    Sequences,
    Triggers,
    Functions,
    Procedures,
}

/// Synchronous connection contract required by the query builder.
///
/// A connection is owned exclusively by one builder and must never have
/// two statements in flight concurrently: drivers typically cache the
/// last executed statement for row-count introspection, and that cache
/// would race.
pub trait Connection: Send {
    /// Execute raw SQL and materialize all rows.
    fn query(&mut self, sql: &str) -> Result<Vec<Row>>;

    /// Prepare, bind and fetch all rows.
    fn prepare_query(&mut self, sql: &str, values: &[SqlValue]) -> Result<Vec<Row>>;

    /// Prepare, bind and execute a write statement.
    fn prepare_execute(&mut self, sql: &str, values: &[SqlValue]) -> Result<ExecResult>;

    /// Escape a value as a SQL literal.
    ///
    /// Used only for debug/log reconstruction and batch fallbacks;
    /// executed statements always bind through placeholders.
    fn quote(&self, value: &SqlValue) -> String {
        value.to_sql_string()
    }

    fn begin(&mut self) -> Result<()>;
    fn commit(&mut self) -> Result<()>;
    fn rollback(&mut self) -> Result<()>;

    fn in_transaction(&self) -> bool {
        false
    }

    /// Answer an introspection request directly.
    ///
    /// `Some(rows)` means no SQL form exists for this driver and the rows
    /// were computed in-process; `None` tells the builder to run the
    /// dialect's SQL template generically.
    fn metadata(&mut self, _kind: MetadataKind, _table: Option<&str>) -> Result<Option<Vec<Row>>> {
        Ok(None)
    }
}
